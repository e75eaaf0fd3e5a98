// GitHub GraphQL response types.
// Defines the cached record shape and typed views over commit and issue nodes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of history item collected for a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Commits,
    Issues,
    PullRequests,
}

impl ItemKind {
    /// Name used by the GraphQL schema and in cache file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Commits => "commits",
            ItemKind::Issues => "issues",
            ItemKind::PullRequests => "pullRequests",
        }
    }

    /// Human-readable label for progress output.
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Commits => "commits",
            ItemKind::Issues => "issues",
            ItemKind::PullRequests => "pull requests",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched edge, as stored in a cache file.
///
/// The node is kept opaque so the cache holds exactly what the API returned.
/// The last record of every fetched page carries that page's `endCursor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub node: serde_json::Value,
    #[serde(
        rename = "endCursor",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub end_cursor: Option<String>,
}

impl Record {
    pub fn new(node: serde_json::Value) -> Self {
        Self {
            node,
            end_cursor: None,
        }
    }

    /// Deserialize the node into a typed view.
    pub fn parse_node<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(&self.node)
    }
}

/// Cursor pagination info.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "endCursor")]
    pub end_cursor: Option<String>,
}

/// A GraphQL connection (`history`, `issues` or `pullRequests`).
#[derive(Debug, Clone, Deserialize)]
pub struct Connection {
    #[serde(rename = "totalCount", default)]
    pub total_count: Option<u64>,
    #[serde(rename = "pageInfo")]
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<Record>,
}

/// One page returned by a paginated source.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
    pub total_count: Option<u64>,
}

impl From<Connection> for Page {
    fn from(connection: Connection) -> Self {
        Self {
            records: connection.edges,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
            total_count: connection.total_count,
        }
    }
}

/// Commit node from the `history` connection.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitNode {
    pub oid: String,
    #[serde(rename = "authoredDate")]
    pub authored_date: DateTime<Utc>,
    pub author: Option<CommitAuthor>,
}

/// Git actor attached to a commit.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    pub name: Option<String>,
    pub email: Option<String>,
    pub user: Option<CommitUser>,
}

/// GitHub account linked to a git actor, when there is one.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitUser {
    #[serde(rename = "databaseId")]
    pub database_id: Option<u64>,
}

/// Issue or pull request state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Open,
    Closed,
    Merged,
    #[serde(other)]
    Unknown,
}

/// Issue or pull request node.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueNode {
    pub number: u64,
    pub state: ItemState,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "closedAt")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: LabelConnection,
}

impl IssueNode {
    /// Names of the labels attached to this item.
    pub fn label_names(&self) -> impl Iterator<Item = &str> {
        self.labels.edges.iter().map(|edge| edge.node.name.as_str())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelConnection {
    #[serde(default)]
    pub edges: Vec<LabelEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelEdge {
    pub node: Label,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Label {
    pub name: String,
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub used: u64,
    pub reset: u64,
}
