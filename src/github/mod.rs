// GitHub API module.
// Provides the GraphQL client, history queries, pagination and response types.

pub mod client;
pub mod endpoints;
pub mod pagination;
pub mod types;

pub use client::GitHubClient;
pub use endpoints::{DEFAULT_BRANCH, PAGE_SIZE, PageRequest, PageSource};
pub use pagination::fetch_after;
pub use types::*;
