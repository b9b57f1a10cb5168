//! Default configuration values

/// Number of concurrent clone workers
pub const CLONING_WORKERS: usize = 5;

/// Repositories requested per listing page
pub const PER_PAGE: usize = 100;

/// Upper bound on listing pages fetched in one run
pub const MAX_PAGES: usize = 10;

/// Deadline for the whole run (in seconds)
pub const PROGRAM_TIMEOUT_SECS: u64 = 30 * 60; // 30 minutes

/// Name of the listing metadata file inside the working directory
pub const RESPONSES_FILE: &str = "responses.json";

/// Timestamp layout used in working directory names
pub const DIR_DATE_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Username sent alongside the token for basic-auth clones
pub const CLONE_USERNAME: &str = "username";

/// User agent sent to the listing API
pub const USER_AGENT: &str = concat!("org-archiver/", env!("CARGO_PKG_VERSION"));
