// Report generation.
// Turns per-repository statistics into text charts and a summary on disk.

pub mod charts;
pub mod summary;

pub use charts::{BarData, SeriesChart, XAxis, render_to_text};
pub use summary::{DEFAULT_TEMPLATE, load_template, render_template, summary_fields};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::cache;
use crate::error::Result;
use crate::observer::{Observer, Progress};
use crate::stats::{CitationSeries, CommitStats, IssuePrStats, YearMonth};

/// Width of charts written to disk.
pub const CHART_WIDTH: u16 = 120;
/// Height of line charts written to disk.
pub const CHART_HEIGHT: u16 = 32;
/// Commit threshold for the cross-repository author chart.
pub const TOTAL_MIN_COMMITS: usize = 50;

/// Everything computed for one repository.
#[derive(Debug, Clone)]
pub struct RepoReport {
    pub owner: String,
    pub repo: String,
    pub commits: CommitStats,
    pub items: IssuePrStats,
    /// Empty when the repository lists no bibcodes.
    pub citations: Vec<CitationSeries>,
    pub window: usize,
    pub min_author_commits: usize,
    pub generated: DateTime<Utc>,
}

impl RepoReport {
    fn current_month(&self) -> YearMonth {
        YearMonth::from_date(&self.generated)
    }

    fn title(&self, what: &str) -> String {
        format!(
            "{}/{}: {} ({})",
            self.owner,
            self.repo,
            what,
            self.generated.format("%Y-%m-%d")
        )
    }

    pub fn author_chart(&self) -> BarData {
        charts::author_bars(
            &self.commits.commits_for_each_author(),
            self.min_author_commits,
            self.title(&format!(
                "commits per author (>{} commits)",
                self.min_author_commits
            )),
        )
    }

    pub fn authors_chart(&self) -> Result<SeriesChart> {
        charts::authors_over_time(
            &self.commits,
            self.window,
            self.current_month(),
            self.title("commit authors"),
        )
    }

    pub fn issues_chart(&self) -> Result<SeriesChart> {
        charts::issues_prs_over_time(
            &self.items,
            self.window,
            self.current_month(),
            self.title("issues and PRs"),
        )
    }

    pub fn citations_chart(&self) -> SeriesChart {
        charts::citations_over_time(
            &self.citations,
            self.generated,
            format!("Refereed citations to {} (via ADS)", self.repo),
        )
    }

    pub fn open_items_chart(&self) -> BarData {
        charts::open_items(&self.items, self.title("open items per label"))
    }

    pub fn summary(&self, template: &str) -> String {
        let fields = summary_fields(
            &self.owner,
            &self.repo,
            &self.commits,
            &self.items,
            &self.citations,
            self.generated,
        );
        render_template(template, &fields)
    }
}

fn bar_height(bars: &BarData) -> u16 {
    let rows = bars.bar_count() + bars.groups.len() + 2;
    u16::try_from(rows).unwrap_or(u16::MAX).max(3)
}

fn write_report(path: PathBuf, text: &str, observer: &dyn Observer) -> Result<PathBuf> {
    cache::write_text(&path, text)?;
    observer.notify(&Progress::ReportWritten { path: &path });
    Ok(path)
}

/// Write the charts and summary of one repository into `dir`.
pub fn write_repo_reports(
    report: &RepoReport,
    dir: &Path,
    template: &str,
    observer: &dyn Observer,
) -> Result<Vec<PathBuf>> {
    let path = |name: &str| cache::report_path(dir, &report.repo, name);

    let authors = report.author_chart();
    let open = report.open_items_chart();
    let mut files = vec![
        (
            path("commits_per_author"),
            render_to_text(authors.widget(), CHART_WIDTH, bar_height(&authors)),
        ),
        (
            path("authors"),
            render_to_text(report.authors_chart()?.widget(), CHART_WIDTH, CHART_HEIGHT),
        ),
        (
            path("issues_PRs"),
            render_to_text(report.issues_chart()?.widget(), CHART_WIDTH, CHART_HEIGHT),
        ),
        (
            path("open_items"),
            render_to_text(open.widget(), CHART_WIDTH, CHART_HEIGHT / 2),
        ),
        (path("summary"), report.summary(template)),
    ];
    if !report.citations.is_empty() {
        files.push((
            path("citations"),
            render_to_text(report.citations_chart().widget(), CHART_WIDTH, CHART_HEIGHT),
        ));
    }

    files
        .into_iter()
        .map(|(path, text)| write_report(path, &text, observer))
        .collect()
}

/// Write the commits-per-author chart summed over every repository.
pub fn write_total_author_chart(
    totals: &BTreeMap<String, usize>,
    root: &Path,
    owner: &str,
    generated: DateTime<Utc>,
    observer: &dyn Observer,
) -> Result<PathBuf> {
    let bars = charts::author_bars(
        totals,
        TOTAL_MIN_COMMITS,
        format!(
            "{}: commits per author across repositories (>{} commits) ({})",
            owner,
            TOTAL_MIN_COMMITS,
            generated.format("%Y-%m-%d")
        ),
    );
    let text = render_to_text(bars.widget(), CHART_WIDTH, bar_height(&bars));
    write_report(
        cache::report_path(root, owner, "commits_per_author"),
        &text,
        observer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::CitingPaper;
    use crate::github::ItemKind;
    use crate::observer::TracingObserver;
    use crate::stats::{AuthorActivity, ItemStats};
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn empty_items(kind: ItemKind) -> ItemStats {
        ItemStats {
            kind,
            age_recent: 90,
            total: 0,
            currently_open: 0,
            recent_open: 0,
            recent_close: 0,
            open_per_month: Vec::new(),
            close_per_month: Vec::new(),
            label_open: Vec::new(),
        }
    }

    fn report() -> RepoReport {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let mut commits = CommitStats {
            total_commits: 9,
            ..Default::default()
        };
        commits.authors.insert(
            "Ada".to_string(),
            AuthorActivity {
                commits: 9,
                first_commit: date,
                last_commit: date,
            },
        );
        RepoReport {
            owner: "astropy".to_string(),
            repo: "photutils".to_string(),
            commits,
            items: IssuePrStats {
                issues: empty_items(ItemKind::Issues),
                pull_requests: empty_items(ItemKind::PullRequests),
            },
            citations: Vec::new(),
            window: 7,
            min_author_commits: 5,
            generated: Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_write_repo_reports() {
        let temp_dir = TempDir::new().unwrap();
        let report = report();

        let written =
            write_repo_reports(&report, temp_dir.path(), DEFAULT_TEMPLATE, &TracingObserver)
                .unwrap();

        assert_eq!(written.len(), 5);
        assert!(!temp_dir.path().join("photutils_citations.txt").exists());
        for path in &written {
            assert!(path.exists(), "{} missing", path.display());
        }
        let per_author =
            std::fs::read_to_string(temp_dir.path().join("photutils_commits_per_author.txt"))
                .unwrap();
        assert!(per_author.contains("Ada"));
        let summary =
            std::fs::read_to_string(temp_dir.path().join("photutils_summary.txt")).unwrap();
        assert!(summary.contains("Total commits: 9"));
    }

    #[test]
    fn test_citations_chart_written_when_bibcodes_configured() {
        let temp_dir = TempDir::new().unwrap();
        let mut report = report();
        let papers = [CitingPaper::new("2023A", 2023), CitingPaper::new("2024B", 2024)];
        report.citations = vec![CitationSeries::new("Paper", &papers, report.generated)];

        let written =
            write_repo_reports(&report, temp_dir.path(), DEFAULT_TEMPLATE, &TracingObserver)
                .unwrap();

        assert_eq!(written.len(), 6);
        let chart =
            std::fs::read_to_string(temp_dir.path().join("photutils_citations.txt")).unwrap();
        assert!(chart.contains("Refereed citations to photutils (via ADS)"));
        let summary =
            std::fs::read_to_string(temp_dir.path().join("photutils_summary.txt")).unwrap();
        assert!(summary.contains("Paper: 2 (2024: 1 to date)"));
    }

    #[test]
    fn test_total_author_chart_threshold() {
        let temp_dir = TempDir::new().unwrap();
        let totals: BTreeMap<String, usize> =
            [("Ada".to_string(), 51), ("Bob".to_string(), 50)].into_iter().collect();

        let path = write_total_author_chart(
            &totals,
            temp_dir.path(),
            "astropy",
            Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap(),
            &TracingObserver,
        )
        .unwrap();

        assert_eq!(path, temp_dir.path().join("astropy_commits_per_author.txt"));
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("Ada"));
        assert!(!text.contains("Bob"));
    }
}
