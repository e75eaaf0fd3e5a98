// NASA ADS search API client.
// Pages through refereed citations of a bibcode with bearer-token authentication.

use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, StatsError};
use crate::github::client::REQUEST_TIMEOUT;

use super::{CitationSource, CitingPaper};

const ADS_API_URL: &str = "https://api.adsabs.harvard.edu/v1";

/// Rows requested per search page.
pub const ROWS: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    num_found: usize,
    #[serde(default)]
    docs: Vec<CitingPaper>,
}

/// ADS client. The token is only required once a lookup is made.
pub struct AdsClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl AdsClient {
    pub fn new(token: Option<&str>) -> Result<Self> {
        Self::with_endpoint(token, ADS_API_URL)
    }

    /// Create a client that queries `endpoint` instead of api.adsabs.harvard.edu.
    pub fn with_endpoint(token: Option<&str>, endpoint: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("repo-stats"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(StatsError::Api)?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        })
    }

    async fn search_page(
        &self,
        token: &str,
        bibcode: &str,
        start: usize,
    ) -> Result<SearchResults> {
        let query = format!("citations(bibcode:\"{}\")", bibcode);
        let start = start.to_string();
        let rows = ROWS.to_string();
        let response = self
            .client
            .get(format!("{}/search/query", self.endpoint))
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fq", "property:refereed"),
                ("fl", "bibcode,year"),
                ("rows", rows.as_str()),
                ("start", start.as_str()),
            ])
            .send()
            .await
            .map_err(StatsError::Api)?;

        let response = check_response(response).await?;
        let body: SearchResponse = response.json().await?;
        Ok(body.response)
    }
}

async fn check_response(response: Response) -> Result<Response> {
    match response.status() {
        StatusCode::OK => Ok(response),
        status => Err(StatsError::QueryFailed {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        }),
    }
}

impl CitationSource for AdsClient {
    async fn citing_papers(&mut self, bibcode: &str) -> Result<Vec<CitingPaper>> {
        let token = self.token.as_deref().ok_or(StatsError::MissingAdsToken)?;
        let mut papers = Vec::new();

        loop {
            let page = self.search_page(token, bibcode, papers.len()).await?;
            let received = page.docs.len();
            papers.extend(page.docs);
            debug!("{} of {} citations to {}", papers.len(), page.num_found, bibcode);

            if received == 0 || papers.len() >= page.num_found {
                break;
            }
        }

        Ok(papers)
    }
}
