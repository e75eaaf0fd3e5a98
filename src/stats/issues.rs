// Issue and pull request statistics.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::github::{IssueNode, ItemKind, ItemState, Record};

use super::age_in_days;
use super::months::{MonthCount, YearMonth, count_by_month, fill_missed_months};

/// Currently open items carrying one label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub label: String,
    pub open: usize,
}

/// Aggregated statistics for issues or for pull requests.
#[derive(Debug, Clone)]
pub struct ItemStats {
    pub kind: ItemKind,
    /// Days before present counted as recent.
    pub age_recent: i64,
    pub total: usize,
    pub currently_open: usize,
    /// Items opened in the recent window.
    pub recent_open: usize,
    /// Items closed in the recent window.
    pub recent_close: usize,
    pub open_per_month: Vec<MonthCount>,
    pub close_per_month: Vec<MonthCount>,
    /// One entry per configured label, in configuration order.
    pub label_open: Vec<LabelCount>,
}

/// Statistics for both issues and pull requests of a repository.
#[derive(Debug, Clone)]
pub struct IssuePrStats {
    pub issues: ItemStats,
    pub pull_requests: ItemStats,
}

/// Aggregate cached issue or pull request records.
pub fn process_items(
    kind: ItemKind,
    records: &[Record],
    labels: &[String],
    age_recent: i64,
    now: DateTime<Utc>,
) -> Result<ItemStats> {
    let nodes = records
        .iter()
        .map(Record::parse_node::<IssueNode>)
        .collect::<serde_json::Result<Vec<_>>>()?;

    let mut recent_open = 0;
    let mut recent_close = 0;
    let mut currently_open = 0;
    let mut opened = Vec::with_capacity(nodes.len());
    let mut closed = Vec::new();
    let mut label_open = vec![0usize; labels.len()];

    for node in &nodes {
        opened.push(YearMonth::from_date(&node.created_at));
        if age_in_days(node.created_at.date_naive(), now) <= age_recent {
            recent_open += 1;
        }

        if let Some(closed_at) = node.closed_at {
            if node.state != ItemState::Open {
                closed.push(YearMonth::from_date(&closed_at));
            }
            if age_in_days(closed_at.date_naive(), now) <= age_recent {
                recent_close += 1;
            }
        }

        if node.state == ItemState::Open {
            currently_open += 1;
            for name in node.label_names() {
                if let Some(i) = labels.iter().position(|label| label == name) {
                    label_open[i] += 1;
                }
            }
        }
    }

    let this_month = YearMonth::from_date(&now);
    Ok(ItemStats {
        kind,
        age_recent,
        total: nodes.len(),
        currently_open,
        recent_open,
        recent_close,
        open_per_month: fill_missed_months(&count_by_month(opened), this_month),
        close_per_month: fill_missed_months(&count_by_month(closed), this_month),
        label_open: labels
            .iter()
            .zip(label_open)
            .map(|(label, open)| LabelCount {
                label: label.clone(),
                open,
            })
            .collect(),
    })
}
