//! API URLs

/// GitHub REST API base URL
pub const GITHUB_API: &str = "https://api.github.com";

/// Accept header value for the GitHub REST API
pub const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// Path of the organization repository listing, relative to the API base
pub fn org_repos_path(org: &str) -> String {
    format!("/orgs/{org}/repos")
}
