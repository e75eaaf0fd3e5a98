// GitHub GraphQL history queries.
// Provides the paginated-source abstraction and its implementation for the GitHub client.

use serde_json::{Value, json};

use crate::error::{Result, StatsError};

use super::client::GitHubClient;
use super::types::{Connection, ItemKind, Page, RateLimit};

/// Items requested per page (GitHub's maximum).
pub const PAGE_SIZE: u32 = 100;

/// Branch whose history is read when none is configured.
pub const DEFAULT_BRANCH: &str = "main";

// Commit history is reached through `ref(...).target.history`.
// See https://docs.github.com/en/graphql/reference/objects#commit
const COMMITS_QUERY: &str = r#"
query($owner: String!, $name: String!, $branch: String!, $after: String, $first: Int!) {
    repository(name: $name, owner: $owner) {
        ref(qualifiedName: $branch) {
            target {
                ... on Commit {
                    history(first: $first, after: $after) {
                        totalCount
                        pageInfo {
                            hasNextPage
                            endCursor
                        }
                        edges {
                            node {
                                oid
                                authoredDate
                                author {
                                    name
                                    email
                                    user {
                                        databaseId
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}
"#;

// `{connection}` is replaced with `issues` or `pullRequests`.
const ISSUES_QUERY_TEMPLATE: &str = r#"
query($owner: String!, $name: String!, $after: String, $first: Int!) {
    repository(owner: $owner, name: $name) {
        {connection}(first: $first, after: $after) {
            totalCount
            pageInfo {
                hasNextPage
                endCursor
            }
            edges {
                node {
                    number
                    state
                    createdAt
                    updatedAt
                    closedAt
                    labels(first: 25) {
                        edges {
                            node {
                                name
                            }
                        }
                    }
                }
            }
        }
    }
}
"#;

/// Parameters for one page of history.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub kind: ItemKind,
    /// Commit history branch; ignored for issues and pull requests.
    pub branch: &'a str,
    /// Continuation cursor, `None` for the start of history.
    pub after: Option<&'a str>,
}

impl<'a> PageRequest<'a> {
    pub fn new(owner: &'a str, name: &'a str, kind: ItemKind) -> Self {
        Self {
            owner,
            name,
            kind,
            branch: DEFAULT_BRANCH,
            after: None,
        }
    }

    pub fn branch(mut self, branch: &'a str) -> Self {
        self.branch = branch;
        self
    }

    pub fn after(mut self, after: Option<&'a str>) -> Self {
        self.after = after;
        self
    }

    /// GraphQL query text for this request's item kind.
    pub fn query(&self) -> String {
        match self.kind {
            ItemKind::Commits => COMMITS_QUERY.to_string(),
            kind => ISSUES_QUERY_TEMPLATE.replace("{connection}", kind.as_str()),
        }
    }

    /// GraphQL variables for this request.
    pub fn variables(&self) -> Value {
        let mut variables = json!({
            "owner": self.owner,
            "name": self.name,
            "after": self.after,
            "first": PAGE_SIZE,
        });
        if self.kind == ItemKind::Commits {
            variables["branch"] = json!(self.branch);
        }
        variables
    }

    /// Pick this request's connection out of a response's `data` object.
    pub fn parse_page(&self, data: &Value) -> Result<Page> {
        let connection = match self.kind {
            ItemKind::Commits => {
                let git_ref = data.pointer("/repository/ref").unwrap_or(&Value::Null);
                if git_ref.is_null() {
                    return Err(StatsError::BranchNotFound {
                        owner: self.owner.to_string(),
                        repo: self.name.to_string(),
                        branch: self.branch.to_string(),
                    });
                }
                git_ref.pointer("/target/history")
            }
            kind => data
                .get("repository")
                .and_then(|repository| repository.get(kind.as_str())),
        };

        let connection = connection.ok_or_else(|| {
            StatsError::GraphQl(format!(
                "no {} connection in response for {}/{}",
                self.kind, self.owner, self.name
            ))
        })?;

        let connection: Connection = serde::Deserialize::deserialize(connection)?;
        Ok(connection.into())
    }
}

/// A cursor-paginated history source.
#[allow(async_fn_in_trait)]
pub trait PageSource {
    /// Fetch the page that follows `request.after`.
    async fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Page>;

    /// Most recent rate limit information, if the source tracks one.
    fn rate_limit(&self) -> Option<&RateLimit> {
        None
    }
}

impl PageSource for GitHubClient {
    async fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Page> {
        let data = self.graphql(&request.query(), &request.variables()).await?;
        request.parse_page(&data)
    }

    fn rate_limit(&self) -> Option<&RateLimit> {
        Some(GitHubClient::rate_limit(self))
    }
}
