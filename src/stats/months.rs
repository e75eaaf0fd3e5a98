// Calendar month buckets.
// Counts dated events per month and fills gaps so series are contiguous.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Datelike;

/// A calendar month, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Create a month, returning None unless `month` is 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: &impl Datelike) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// The following month.
    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses `YYYY-MM`, ignoring anything after the month (so full dates work too).
impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid year-month '{}'", s);
        let prefix = s.get(..7).ok_or_else(invalid)?;
        let (year, month) = prefix.split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month).ok_or_else(invalid)
    }
}

/// Number of events in one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCount {
    pub month: YearMonth,
    pub count: usize,
}

impl MonthCount {
    pub fn new(month: YearMonth, count: usize) -> Self {
        Self { month, count }
    }
}

/// Count occurrences per month, sorted ascending by month.
pub fn count_by_month(months: impl IntoIterator<Item = YearMonth>) -> Vec<MonthCount> {
    let mut counts: BTreeMap<YearMonth, usize> = BTreeMap::new();
    for month in months {
        *counts.entry(month).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(month, count)| MonthCount::new(month, count))
        .collect()
}

/// Extend `counts` into a contiguous series from its earliest month through
/// `now`, with zero for every month that has no entry.
///
/// Empty input gives an empty series. Months after `now` are kept.
pub fn fill_missed_months(counts: &[MonthCount], now: YearMonth) -> Vec<MonthCount> {
    let observed: BTreeMap<YearMonth, usize> =
        counts.iter().map(|c| (c.month, c.count)).collect();

    let (Some(first), Some(last)) = (observed.keys().next(), observed.keys().next_back()) else {
        return Vec::new();
    };
    let end = (*last).max(now);

    let mut filled = Vec::new();
    let mut month = *first;
    loop {
        filled.push(MonthCount::new(
            month,
            observed.get(&month).copied().unwrap_or(0),
        ));
        if month >= end {
            break;
        }
        month = month.succ();
    }
    filled
}

/// Months of a series, formatted.
pub fn month_labels(series: &[MonthCount]) -> Vec<String> {
    series.iter().map(|c| c.month.to_string()).collect()
}

/// Counts of a series, as floats for averaging and plotting.
pub fn month_values(series: &[MonthCount]) -> Vec<f64> {
    series.iter().map(|c| c.count as f64).collect()
}
