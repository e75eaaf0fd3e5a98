// NASA ADS citation lookup.
// Finds refereed papers citing a bibcode, for per-year citation statistics.

pub mod client;

pub use client::AdsClient;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// A refereed paper citing one of a repository's bibcodes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CitingPaper {
    pub bibcode: String,
    #[serde(deserialize_with = "year_from_str")]
    pub year: i32,
}

impl CitingPaper {
    pub fn new(bibcode: impl Into<String>, year: i32) -> Self {
        Self {
            bibcode: bibcode.into(),
            year,
        }
    }
}

/// ADS returns the publication year as a string.
fn year_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<i32, D::Error> {
    let year = String::deserialize(deserializer)?;
    year.trim().parse().map_err(serde::de::Error::custom)
}

/// Anything that can list the papers citing a bibcode.
#[allow(async_fn_in_trait)]
pub trait CitationSource {
    async fn citing_papers(&mut self, bibcode: &str) -> Result<Vec<CitingPaper>>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_citing_paper_year_is_parsed_from_string() {
        let paper: CitingPaper =
            serde_json::from_str(r#"{"bibcode": "2023ApJ...1A", "year": "2023"}"#).unwrap();
        assert_eq!(paper, CitingPaper::new("2023ApJ...1A", 2023));

        let undated = r#"{"bibcode": "x", "year": "soon"}"#;
        assert!(serde_json::from_str::<CitingPaper>(undated).is_err());
    }
}
