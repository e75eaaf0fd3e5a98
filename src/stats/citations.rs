// Citation statistics.
// Counts citing papers per year for each bibcode, plus the union over all of them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Utc};

use crate::ads::CitingPaper;

/// Name of the series combining every bibcode of a repository.
pub const ALL_CITATIONS: &str = "All unique citations";

/// Yearly citation counts of one bibcode (or of the union).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationSeries {
    pub name: String,
    /// Contiguous years from the first citation through the current year.
    pub per_year: Vec<(i32, usize)>,
    pub total: usize,
}

impl CitationSeries {
    pub fn new(name: impl Into<String>, papers: &[CitingPaper], now: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            per_year: citations_per_year(papers, now),
            total: papers.len(),
        }
    }

    /// Every year but the current one.
    pub fn completed_years(&self) -> &[(i32, usize)] {
        match self.per_year.split_last() {
            Some((_, completed)) => completed,
            None => &[],
        }
    }

    /// Citations so far in the current year.
    pub fn year_to_date(&self) -> Option<(i32, usize)> {
        self.per_year.last().copied()
    }

    /// Current-year count extrapolated to a full year.
    pub fn projected(&self, now: DateTime<Utc>) -> Option<(i32, usize)> {
        let (year, count) = self.year_to_date()?;
        let days_passed = now.ordinal() as usize;
        Some((year, count * 365 / days_passed))
    }
}

/// Count papers per year, zero-filled through the year of `now`.
///
/// Papers dated after the current year count toward it.
pub fn citations_per_year(papers: &[CitingPaper], now: DateTime<Utc>) -> Vec<(i32, usize)> {
    let current = now.year();
    let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
    for paper in papers {
        *counts.entry(paper.year.min(current)).or_default() += 1;
    }

    let Some(&first) = counts.keys().next() else {
        return Vec::new();
    };
    (first..=current)
        .map(|year| (year, counts.get(&year).copied().unwrap_or(0)))
        .collect()
}

/// One series per named bibcode, plus the deduplicated union when there are several.
pub fn aggregate_citations(
    citations: &[(String, Vec<CitingPaper>)],
    now: DateTime<Utc>,
) -> Vec<CitationSeries> {
    let mut series: Vec<CitationSeries> = citations
        .iter()
        .map(|(name, papers)| CitationSeries::new(name.as_str(), papers, now))
        .collect();

    if citations.len() > 1 {
        let mut seen = BTreeSet::new();
        let unique: Vec<CitingPaper> = citations
            .iter()
            .flat_map(|(_, papers)| papers)
            .filter(|paper| seen.insert(paper.bibcode.as_str()))
            .cloned()
            .collect();
        series.push(CitationSeries::new(ALL_CITATIONS, &unique, now));
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
    }

    fn papers(entries: &[(&str, i32)]) -> Vec<CitingPaper> {
        entries
            .iter()
            .map(|(bibcode, year)| CitingPaper::new(*bibcode, *year))
            .collect()
    }

    #[test]
    fn test_per_year_fills_gaps_through_current_year() {
        let counts = citations_per_year(&papers(&[("a", 2020), ("b", 2020), ("c", 2022)]), now());
        assert_eq!(counts, vec![(2020, 2), (2021, 0), (2022, 1), (2023, 0), (2024, 0)]);
    }

    #[test]
    fn test_future_years_count_toward_current_year() {
        let counts = citations_per_year(&papers(&[("a", 2024), ("b", 2025)]), now());
        assert_eq!(counts, vec![(2024, 2)]);
    }

    #[test]
    fn test_no_citations_gives_empty_series() {
        let series = CitationSeries::new("photutils", &[], now());
        assert!(series.per_year.is_empty());
        assert!(series.completed_years().is_empty());
        assert_eq!(series.year_to_date(), None);
        assert_eq!(series.projected(now()), None);
    }

    #[test]
    fn test_year_to_date_projection() {
        let series = CitationSeries::new(
            "photutils",
            &papers(&[("a", 2023), ("b", 2024), ("c", 2024), ("d", 2024)]),
            now(),
        );
        assert_eq!(series.completed_years(), &[(2023, 1)]);
        assert_eq!(series.year_to_date(), Some((2024, 3)));
        // 1 March 2024 is day 61.
        assert_eq!(series.projected(now()), Some((2024, 3 * 365 / 61)));
        assert_eq!(series.total, 4);
    }

    #[test]
    fn test_union_counts_shared_papers_once() {
        let series = aggregate_citations(
            &[
                ("Paper".to_string(), papers(&[("a", 2022), ("b", 2023)])),
                ("Zenodo".to_string(), papers(&[("b", 2023), ("c", 2024)])),
            ],
            now(),
        );

        assert_eq!(series.len(), 3);
        let all = &series[2];
        assert_eq!(all.name, ALL_CITATIONS);
        assert_eq!(all.total, 3);
        assert_eq!(all.per_year, vec![(2022, 1), (2023, 1), (2024, 1)]);
    }

    #[test]
    fn test_single_bibcode_has_no_union() {
        let series = aggregate_citations(&[("Paper".to_string(), papers(&[("a", 2022)]))], now());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "Paper");
    }
}
