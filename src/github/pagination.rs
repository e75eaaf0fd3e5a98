// Cursor pagination over a history source.
// Walks pages forward from a resume cursor and tags each page's last record with its cursor.

use crate::error::{Result, StatsError};
use crate::observer::{Observer, Progress};

use super::endpoints::{PageRequest, PageSource};
use super::types::Record;

/// Fetch every record after `request.after`, in fetch order.
///
/// The final record of each non-empty page gets that page's `endCursor`, so the
/// last record written to a cache always names the point to resume from.
pub async fn fetch_after<S: PageSource>(
    source: &mut S,
    request: PageRequest<'_>,
    observer: &dyn Observer,
) -> Result<Vec<Record>> {
    let mut after = request.after.map(str::to_string);
    let mut new_records = Vec::new();

    loop {
        let page = source.fetch_page(&request.after(after.as_deref())).await?;
        let mut records = page.records;

        if let Some(last) = records.last_mut() {
            let Some(cursor) = page.end_cursor.clone() else {
                return Err(StatsError::Pagination(format!(
                    "page of {} {} has no endCursor",
                    records.len(),
                    request.kind.label()
                )));
            };
            last.end_cursor = Some(cursor);

            new_records.extend(records);
            observer.notify(&Progress::PageFetched {
                kind: request.kind,
                retrieved: new_records.len(),
                total: page.total_count,
                rate_limit: source.rate_limit(),
            });
        }

        if !page.has_next_page {
            break;
        }

        match page.end_cursor {
            None => {
                return Err(StatsError::Pagination(
                    "more pages reported but no endCursor given".to_string(),
                ));
            }
            Some(cursor) if after.as_deref() == Some(cursor.as_str()) => {
                return Err(StatsError::Pagination(format!(
                    "cursor {} did not advance",
                    cursor
                )));
            }
            Some(cursor) => after = Some(cursor),
        }
    }

    observer.notify(&Progress::FetchFinished {
        kind: request.kind,
        retrieved: new_records.len(),
    });

    Ok(new_records)
}

/// In-memory page sources for tests.
#[cfg(test)]
pub(crate) mod scripted {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use serde_json::json;

    use crate::error::Result;
    use crate::github::{ItemKind, Page, PageRequest, PageSource, Record};
    use crate::observer::{Observer, Progress};

    /// Serves pre-built pages keyed by (kind, after) and remembers every request.
    #[derive(Default)]
    pub struct ScriptedSource {
        pub pages: HashMap<(ItemKind, Option<String>), Page>,
        pub requests: Vec<(ItemKind, Option<String>)>,
    }

    impl ScriptedSource {
        /// Register `pages` as a chain of pages for `kind`, starting after `start`.
        /// Cursors are named `<prefix>-<n>`.
        pub fn chain(
            &mut self,
            kind: ItemKind,
            start: Option<&str>,
            prefix: &str,
            pages: Vec<Vec<Record>>,
        ) {
            let mut after = start.map(str::to_string);
            let count = pages.len();
            for (i, records) in pages.into_iter().enumerate() {
                let cursor = format!("{}-{}", prefix, i + 1);
                self.pages.insert(
                    (kind, after.clone()),
                    Page {
                        records,
                        has_next_page: i + 1 < count,
                        end_cursor: Some(cursor.clone()),
                        total_count: None,
                    },
                );
                after = Some(cursor);
            }
        }
    }

    impl PageSource for ScriptedSource {
        async fn fetch_page(&mut self, request: &PageRequest<'_>) -> Result<Page> {
            let key = (request.kind, request.after.map(str::to_string));
            self.requests.push(key.clone());
            Ok(self.pages.get(&key).cloned().unwrap_or_default())
        }
    }

    /// Numbered issue records.
    pub fn issue_records(range: std::ops::Range<u64>) -> Vec<Record> {
        range
            .map(|n| {
                Record::new(json!({
                    "number": n,
                    "state": "OPEN",
                    "createdAt": "2024-01-15T00:00:00Z",
                    "closedAt": null,
                    "labels": {"edges": []}
                }))
            })
            .collect()
    }

    /// Observer that keeps a debug rendering of every event.
    #[derive(Default)]
    pub struct RecordingObserver {
        pub events: RefCell<Vec<String>>,
    }

    impl Observer for RecordingObserver {
        fn notify(&self, event: &Progress<'_>) {
            self.events.borrow_mut().push(format!("{:?}", event));
        }
    }
}
