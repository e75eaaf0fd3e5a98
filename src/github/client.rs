// GitHub API HTTP client.
// Handles authentication, rate limiting, and GraphQL request/response processing.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StatsError};

use super::types::RateLimit;

const GITHUB_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Fixed per-request deadline.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// GraphQL request body.
#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

/// GitHub API client with authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    endpoint: String,
    rate_limit: RateLimit,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_endpoint(token, GITHUB_GRAPHQL_URL)
    }

    /// Create a client that posts queries to `endpoint` instead of api.github.com.
    pub fn with_endpoint(token: &str, endpoint: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("token {}", token))
                .map_err(|e| StatsError::Other(e.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-stats"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(StatsError::Api)?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            rate_limit: RateLimit::default(),
        })
    }

    /// Get the current rate limit information.
    pub fn rate_limit(&self) -> &RateLimit {
        &self.rate_limit
    }

    /// Run a GraphQL query and return the `data` object.
    pub async fn graphql(&mut self, query: &str, variables: &Value) -> Result<Value> {
        let body = GraphQlRequest { query, variables };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(StatsError::Api)?;

        self.update_rate_limit(&response);
        let response = self.check_response(response).await?;
        let result: Value = response.json().await?;
        extract_data(result)
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&mut self, response: &Response) {
        let header = |name: &str| -> Option<u64> {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
        };

        if let Some(limit) = header("x-ratelimit-limit") {
            self.rate_limit.limit = limit;
        }
        if let Some(remaining) = header("x-ratelimit-remaining") {
            self.rate_limit.remaining = remaining;
        }
        if let Some(used) = header("x-ratelimit-used") {
            self.rate_limit.used = used;
        }
        if let Some(reset) = header("x-ratelimit-reset") {
            self.rate_limit.reset = reset;
        }
    }

    /// Check response status and convert errors.
    async fn check_response(&self, response: Response) -> Result<Response> {
        match response.status() {
            StatusCode::OK => Ok(response),
            StatusCode::UNAUTHORIZED => Err(StatsError::Unauthorized),
            StatusCode::FORBIDDEN if self.rate_limit.remaining == 0 => {
                let reset_at = chrono::DateTime::from_timestamp(self.rate_limit.reset as i64, 0)
                    .map(|dt| dt.format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Err(StatsError::RateLimited { reset_at })
            }
            status => Err(StatsError::QueryFailed {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            }),
        }
    }
}

/// Pull `data` out of a GraphQL response body, surfacing GraphQL errors.
pub(crate) fn extract_data(mut result: Value) -> Result<Value> {
    match result.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => {
            let messages: Vec<String> = result
                .get("errors")
                .and_then(Value::as_array)
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            if messages.is_empty() {
                Err(StatsError::GraphQl(format!("response to query: {}", result)))
            } else {
                Err(StatsError::GraphQl(messages.join("; ")))
            }
        }
    }
}
