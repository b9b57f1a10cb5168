//! Listing API client
//!
//! Pages through `GET /orgs/{org}/repos` and collects every repository
//! descriptor in listing order.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;

use crate::config::{defaults, urls, Credentials};
use crate::core::deadline::Deadline;
use crate::core::repository::RepositoryDescriptor;
use crate::error::ListingError;

/// Client for the organization repository listing
#[derive(Debug, Clone)]
pub struct ListingClient {
    /// HTTP client
    client: reqwest::Client,
    /// API base URL
    api_url: String,
    /// Repositories requested per page
    per_page: usize,
    /// Safety bound on the number of pages
    max_pages: usize,
}

impl ListingClient {
    /// Create a listing client against the public GitHub API
    pub fn new() -> Self {
        Self::with_config(
            urls::GITHUB_API.to_string(),
            defaults::PER_PAGE,
            defaults::MAX_PAGES,
        )
    }

    /// Create a listing client with custom settings
    pub fn with_config(api_url: String, per_page: usize, max_pages: usize) -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_url: api_url.trim_end_matches('/').to_string(),
            per_page,
            max_pages,
        }
    }

    /// Get the API base URL
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Get the page size
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Get the page limit
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// Fetch every repository of `org`
    ///
    /// Pages are requested in order starting at 1. Listing stops at the first
    /// page holding fewer than `per_page` entries, so a total that is an exact
    /// multiple of the page size costs one extra request returning an empty
    /// page. Any failure discards everything fetched so far.
    pub async fn list_org_repos(
        &self,
        org: &str,
        credentials: &Credentials,
        deadline: &Deadline,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        let url = format!("{}{}", self.api_url, urls::org_repos_path(org));
        let mut repos = Vec::new();

        for page in 1..=self.max_pages {
            if deadline.is_expired() {
                return Err(ListingError::DeadlineExceeded { page });
            }

            tracing::info!("Fetching page {page} of '{org}' repositories");
            let batch = tokio::select! {
                biased;
                () = deadline.expired() => {
                    return Err(ListingError::DeadlineExceeded { page });
                }
                batch = self.fetch_page(&url, page, credentials) => batch?,
            };

            let count = batch.len();
            tracing::info!("Fetched page {page} with {count} repositories");
            repos.extend(batch);

            if count < self.per_page {
                return Ok(repos);
            }
        }

        tracing::warn!(
            "Stopped after {} pages of '{org}' repositories; the listing may be incomplete",
            self.max_pages
        );
        Ok(repos)
    }

    /// Fetch and decode a single page
    async fn fetch_page(
        &self,
        url: &str,
        page: usize,
        credentials: &Credentials,
    ) -> Result<Vec<RepositoryDescriptor>, ListingError> {
        let network_error = |e: reqwest::Error| ListingError::NetworkError {
            url: url.to_string(),
            page,
            error: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .query(&[("per_page", self.per_page), ("page", page)])
            .header(ACCEPT, urls::GITHUB_ACCEPT)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.token()))
            .header(USER_AGENT, defaults::USER_AGENT)
            .send()
            .await
            .map_err(network_error)?;

        if response.status() != StatusCode::OK {
            return Err(ListingError::ProtocolError {
                page,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(network_error)?;

        serde_json::from_slice(&body).map_err(|e| ListingError::DecodeError {
            page,
            error: e.to_string(),
        })
    }
}

impl Default for ListingClient {
    fn default() -> Self {
        Self::new()
    }
}
