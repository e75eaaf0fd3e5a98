// Statistics over collected history.
// Monthly bucketing, rolling averages, history aggregation and yearly citation counts.

pub mod citations;
pub mod commits;
pub mod issues;
pub mod months;
pub mod rolling;

pub use citations::{ALL_CITATIONS, CitationSeries, aggregate_citations, citations_per_year};
pub use commits::{AuthorActivity, AuthorRules, CommitEntry, CommitStats, process_commits};
pub use issues::{IssuePrStats, ItemStats, LabelCount, process_items};
pub use months::{MonthCount, YearMonth, count_by_month, fill_missed_months};
pub use rolling::{RollingAverage, rolling_average};

use chrono::{DateTime, NaiveDate, Utc};

/// Whole days between the start of `date` (UTC) and `now`.
pub fn age_in_days(date: NaiveDate, now: DateTime<Utc>) -> i64 {
    (now - date.and_time(chrono::NaiveTime::MIN).and_utc()).num_days()
}
