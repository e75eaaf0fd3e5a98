// Progress reporting for long-running collection.
// The pipeline reports through an injectable observer; the default one logs with tracing.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::github::{ItemKind, RateLimit};

/// Something worth reporting while a run progresses.
#[derive(Debug, Clone, Copy)]
pub enum Progress<'a> {
    /// A new stage of the run started.
    Stage(&'a str),
    /// A cache file was read.
    CacheLoaded {
        kind: ItemKind,
        path: &'a Path,
        count: usize,
    },
    /// One page of new items arrived.
    PageFetched {
        kind: ItemKind,
        retrieved: usize,
        total: Option<u64>,
        rate_limit: Option<&'a RateLimit>,
    },
    /// Pagination finished for one item kind.
    FetchFinished { kind: ItemKind, retrieved: usize },
    /// Citations of one bibcode were looked up.
    CitationsFetched { bibcode: &'a str, count: usize },
    /// A chart or summary file was written.
    ReportWritten { path: &'a Path },
}

/// Receives progress events.
pub trait Observer {
    fn notify(&self, event: &Progress<'_>);
}

/// Default observer: forwards progress to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn notify(&self, event: &Progress<'_>) {
        match *event {
            Progress::Stage(message) => info!("{}", message),
            Progress::CacheLoaded { kind, path, count } => {
                info!("{} {} found in cache at {}", count, kind.label(), path.display());
            }
            Progress::PageFetched {
                kind,
                retrieved,
                total,
                rate_limit,
            } => {
                let total = total
                    .map(|t| format!(" of {} total", t))
                    .unwrap_or_default();
                match rate_limit {
                    Some(rate) => info!(
                        "Retrieved {} new{} {} (rate limit used: {} of {} - resets in {})",
                        retrieved,
                        total,
                        kind.label(),
                        rate.used,
                        rate.limit,
                        time_to_reset(rate.reset, Utc::now())
                    ),
                    None => info!("Retrieved {} new{} {}", retrieved, total, kind.label()),
                }
            }
            Progress::FetchFinished { kind, retrieved } => {
                info!("Finished fetching {}: {} new", kind.label(), retrieved);
            }
            Progress::CitationsFetched { bibcode, count } => {
                info!("Found {} refereed citations to {}", count, bibcode);
            }
            Progress::ReportWritten { path } => debug!("Wrote {}", path.display()),
        }
    }
}

/// Format the time left until a rate limit reset as `MM:SS`.
fn time_to_reset(reset: u64, now: DateTime<Utc>) -> String {
    let secs = (reset as i64 - now.timestamp()).max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_to_reset() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        assert_eq!(time_to_reset(1_700_000_125, now), "02:05");
        assert_eq!(time_to_reset(1_699_999_000, now), "00:00");
    }
}
