// Error types for repo-stats.
// Covers GitHub API failures, cache file problems and configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Query failed -- return code 401: invalid or expired token")]
    Unauthorized,

    #[error("Query failed -- return code 403: rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("Query failed -- return code {status}: {message}")]
    QueryFailed { status: u16, message: String },

    #[error("Query syntax is likely wrong: {0}")]
    GraphQl(String),

    #[error("Branch '{branch}' not found in {owner}/{repo}")]
    BranchNotFound {
        owner: String,
        repo: String,
        branch: String,
    },

    #[error("Missing GitHub token: pass --git-token or set GITHUB_TOKEN")]
    MissingToken,

    #[error("Missing ADS token: pass --ads-token or set ADS_TOKEN to look up citations")]
    MissingAdsToken,

    #[error("Malformed record on line {line} of {}: {source}", path.display())]
    MalformedCache {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },

    #[error("Last record in {} has no endCursor, cannot resume", path.display())]
    MissingCursor { path: PathBuf },

    #[error("Cursor {0} is already cached, refusing to append a duplicate page")]
    DuplicateCursor(String),

    #[error("Pagination stalled: {0}")]
    Pagination(String),

    #[error(
        "0 commits found for repository {0}. Check the repository name or 'repo_dir' in the parameter file"
    )]
    NoCommits(String),

    #[error("Rolling average window must be at least 1")]
    InvalidWindow,

    #[error("Invalid parameter file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StatsError {
    /// HTTP status code behind a failed query, if there was one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StatsError::Unauthorized => Some(401),
            StatsError::RateLimited { .. } => Some(403),
            StatsError::QueryFailed { status, .. } => Some(*status),
            StatsError::Api(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
