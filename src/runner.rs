// Run orchestration.
// Collects history for each configured repository, computes statistics and writes reports.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::ads::CitationSource;
use crate::cache;
use crate::config::{Parameters, RepoParams};
use crate::error::{Result, StatsError};
use crate::github::{ItemKind, PageRequest, PageSource, Record, fetch_after};
use crate::gitlog;
use crate::observer::{Observer, Progress};
use crate::report::{self, RepoReport};
use crate::stats::{
    CitationSeries, CommitEntry, IssuePrStats, ItemStats, aggregate_citations, process_commits,
    process_items,
};

/// Bring one cache file up to date and return every cached record.
///
/// Reads the cache, resumes from its last cursor, fetches what is new and
/// appends it. The cursor in `request` is replaced by the cached one.
pub async fn collect<S: PageSource>(
    source: &mut S,
    cache_root: &Path,
    request: PageRequest<'_>,
    observer: &dyn Observer,
) -> Result<Vec<Record>> {
    let path = cache::records_path(cache_root, request.name, request.kind);

    let old = cache::read_records(&path)?;
    observer.notify(&Progress::CacheLoaded {
        kind: request.kind,
        path: &path,
        count: old.len(),
    });

    let cursor = cache::resume_cursor(&path, &old)?;
    let new = fetch_after(source, request.after(cursor.as_deref()), observer).await?;

    cache::merge(&path, old, new)
}

async fn repo_commits<S: PageSource>(
    source: &mut S,
    cache_root: &Path,
    owner: &str,
    repo: &RepoParams,
    observer: &dyn Observer,
) -> Result<Vec<CommitEntry>> {
    if let Some(dir) = &repo.repo_dir {
        return gitlog::commits_from_git_log(dir, observer);
    }

    let request =
        PageRequest::new(owner, &repo.repo_name, ItemKind::Commits).branch(repo.branch());
    let records = collect(source, cache_root, request, observer).await?;
    if records.is_empty() {
        return Err(StatsError::NoCommits(format!("{}/{}", owner, repo.repo_name)));
    }
    records.iter().map(CommitEntry::from_record).collect()
}

async fn item_stats<S: PageSource>(
    params: &Parameters,
    repo: &RepoParams,
    kind: ItemKind,
    source: &mut S,
    cache_root: &Path,
    observer: &dyn Observer,
    now: DateTime<Utc>,
) -> Result<ItemStats> {
    observer.notify(&Progress::Stage(&format!("Collecting {}", kind.label())));
    let request = PageRequest::new(&params.repo_owner, &repo.repo_name, kind);
    let records = collect(source, cache_root, request, observer).await?;
    process_items(
        kind,
        &records,
        &repo.labels,
        params.age_recent_issue_pr,
        now,
    )
}

/// Look up the citations of every bibcode listed for `repo`.
async fn repo_citations<C: CitationSource>(
    repo: &RepoParams,
    citations: &mut C,
    observer: &dyn Observer,
    now: DateTime<Utc>,
) -> Result<Vec<CitationSeries>> {
    if repo.bibs.is_empty() {
        return Ok(Vec::new());
    }

    observer.notify(&Progress::Stage("Collecting citations"));
    let mut found = Vec::with_capacity(repo.bibs.len());
    for (name, bibcode) in repo.named_bibs() {
        let papers = citations.citing_papers(bibcode).await?;
        observer.notify(&Progress::CitationsFetched {
            bibcode,
            count: papers.len(),
        });
        found.push((name.to_string(), papers));
    }
    Ok(aggregate_citations(&found, now))
}

/// Collect and analyze one repository.
pub async fn analyze_repo<S: PageSource, C: CitationSource>(
    params: &Parameters,
    repo: &RepoParams,
    source: &mut S,
    citations: &mut C,
    cache_root: &Path,
    observer: &dyn Observer,
    now: DateTime<Utc>,
) -> Result<RepoReport> {
    let owner = params.repo_owner.as_str();

    observer.notify(&Progress::Stage("Collecting commits"));
    let entries = repo_commits(source, cache_root, owner, repo, observer).await?;
    let commits = process_commits(
        &entries,
        &params.author_rules(),
        params.age_recent_commit,
        now,
    );

    let issues =
        item_stats(params, repo, ItemKind::Issues, source, cache_root, observer, now).await?;
    let pull_requests =
        item_stats(params, repo, ItemKind::PullRequests, source, cache_root, observer, now)
            .await?;
    let citations = repo_citations(repo, citations, observer, now).await?;

    Ok(RepoReport {
        owner: owner.to_string(),
        repo: repo.repo_name.clone(),
        commits,
        items: IssuePrStats {
            issues,
            pull_requests,
        },
        citations,
        window: params.window_avg,
        min_author_commits: params.min_author_commits,
        generated: now,
    })
}

/// Analyze every configured repository and write all reports.
///
/// `template` is the summary template, already loaded.
pub async fn run<S: PageSource, C: CitationSource>(
    params: &Parameters,
    source: &mut S,
    citations: &mut C,
    template: &str,
    cache_root: &Path,
    observer: &dyn Observer,
    now: DateTime<Utc>,
) -> Result<Vec<RepoReport>> {
    let mut totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut reports = Vec::with_capacity(params.repos.len());

    for repo in &params.repos {
        observer.notify(&Progress::Stage(&format!(
            "Processing {}/{}",
            params.repo_owner, repo.repo_name
        )));

        let report =
            analyze_repo(params, repo, source, citations, cache_root, observer, now).await?;
        for (author, commits) in report.commits.commits_for_each_author() {
            *totals.entry(author).or_default() += commits;
        }

        observer.notify(&Progress::Stage("Writing charts and summary"));
        report::write_repo_reports(
            &report,
            &cache::repo_dir(cache_root, &repo.repo_name),
            template,
            observer,
        )?;
        reports.push(report);
    }

    report::write_total_author_chart(&totals, cache_root, &params.repo_owner, now, observer)?;

    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ads::scripted::ScriptedCitations;
    use crate::github::pagination::scripted::{RecordingObserver, ScriptedSource, issue_records};
    use crate::observer::TracingObserver;
    use crate::report::DEFAULT_TEMPLATE;
    use crate::stats::ALL_CITATIONS;
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
    }

    fn commit_records(authors: &[(&str, u64, &str)]) -> Vec<Record> {
        authors
            .iter()
            .enumerate()
            .map(|(i, (name, id, date))| {
                Record::new(json!({
                    "oid": format!("{:040x}", i),
                    "authoredDate": date,
                    "author": {"name": name, "email": null, "user": {"databaseId": id}}
                }))
            })
            .collect()
    }

    fn params(json: &str) -> Parameters {
        Parameters::from_json(json, Path::new("params.json")).unwrap()
    }

    fn photutils_history() -> ScriptedSource {
        let mut source = ScriptedSource::default();
        source.chain(
            ItemKind::Commits,
            None,
            "h",
            vec![commit_records(&[
                ("Ada", 1, "2023-11-02T10:00:00Z"),
                ("Bob", 3, "2024-02-10T10:00:00Z"),
            ])],
        );
        source.chain(ItemKind::Issues, None, "i", vec![issue_records(0..2)]);
        source
    }

    #[tokio::test]
    async fn test_collect_250_records_over_three_pages() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::default();
        source.chain(
            ItemKind::Issues,
            None,
            "c",
            vec![issue_records(0..100), issue_records(100..200), issue_records(200..250)],
        );

        let records = collect(
            &mut source,
            temp_dir.path(),
            PageRequest::new("astropy", "astropy", ItemKind::Issues),
            &TracingObserver,
        )
        .await
        .unwrap();
        assert_eq!(records.len(), 250);

        let path = cache::records_path(temp_dir.path(), "astropy", ItemKind::Issues);
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 250);
        for (i, line) in lines.iter().enumerate() {
            let line_number = i + 1;
            let has_cursor = line.contains("endCursor");
            assert_eq!(
                has_cursor,
                [100, 200, 250].contains(&line_number),
                "line {}",
                line_number
            );
        }
        assert!(lines[99].contains("\"c-1\""));
        assert!(lines[249].contains("\"c-3\""));
    }

    #[tokio::test]
    async fn test_collect_resumes_from_cached_cursor() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::default();
        source.chain(ItemKind::Issues, None, "a", vec![issue_records(0..3)]);
        let observer = RecordingObserver::default();

        let request = PageRequest::new("astropy", "photutils", ItemKind::Issues);
        collect(&mut source, temp_dir.path(), request, &observer)
            .await
            .unwrap();

        source.chain(ItemKind::Issues, Some("a-1"), "b", vec![issue_records(3..5)]);
        let records = collect(&mut source, temp_dir.path(), request, &observer)
            .await
            .unwrap();

        assert_eq!(records.len(), 5);
        assert_eq!(
            source.requests,
            vec![
                (ItemKind::Issues, None),
                (ItemKind::Issues, Some("a-1".to_string())),
            ]
        );
        let events = observer.events.borrow();
        assert!(events.iter().any(|e| e.contains("CacheLoaded") && e.contains("count: 3")));
    }

    #[tokio::test]
    async fn test_collect_without_new_records_leaves_cache_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::default();
        source.chain(ItemKind::PullRequests, None, "p", vec![issue_records(0..4)]);
        let request = PageRequest::new("astropy", "astropy", ItemKind::PullRequests);

        collect(&mut source, temp_dir.path(), request, &TracingObserver)
            .await
            .unwrap();
        let path = cache::records_path(temp_dir.path(), "astropy", ItemKind::PullRequests);
        let before = std::fs::read_to_string(&path).unwrap();

        let records = collect(&mut source, temp_dir.path(), request, &TracingObserver)
            .await
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_run_writes_reports() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::default();
        source.chain(
            ItemKind::Commits,
            None,
            "h",
            vec![commit_records(&[
                ("Ada", 1, "2023-11-02T10:00:00Z"),
                ("Ada L.", 1, "2024-03-01T10:00:00Z"),
                ("dependabot[bot]", 2, "2024-03-02T10:00:00Z"),
                ("Bob", 3, "2024-02-10T10:00:00Z"),
            ])],
        );
        source.chain(ItemKind::Issues, None, "i", vec![issue_records(0..2)]);
        let params = params(
            r#"{"repo_owner": "astropy", "repos": [{"repo_name": "photutils", "labels": ["io"]}],
                "min_author_commits": 0}"#,
        );

        let reports = run(
            &params,
            &mut source,
            &mut ScriptedCitations::default(),
            DEFAULT_TEMPLATE,
            temp_dir.path(),
            &TracingObserver,
            now(),
        )
        .await
        .unwrap();

        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.commits.total_commits, 3);
        let authors = report.commits.commits_for_each_author();
        assert_eq!(authors.get("Ada L."), Some(&2));
        assert_eq!(authors.get("Bob"), Some(&1));
        assert_eq!(report.items.issues.total, 2);
        assert_eq!(report.items.pull_requests.total, 0);

        let repo_dir = temp_dir.path().join("photutils");
        for name in [
            "photutils_commits.txt",
            "photutils_issues.txt",
            "photutils_pullRequests.txt",
            "photutils_commits_per_author.txt",
            "photutils_authors.txt",
            "photutils_issues_PRs.txt",
            "photutils_open_items.txt",
            "photutils_summary.txt",
        ] {
            assert!(repo_dir.join(name).exists(), "{} missing", name);
        }
        assert!(!repo_dir.join("photutils_citations.txt").exists());
        assert!(temp_dir.path().join("astropy_commits_per_author.txt").exists());
    }

    #[tokio::test]
    async fn test_run_fills_the_given_template() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = photutils_history();
        // The parameter file's template is read by the caller, not by `run`.
        let params = params(
            r#"{"repo_owner": "astropy", "repos": [{"repo_name": "photutils"}],
                "template": "/nonexistent/summary_template.txt"}"#,
        );

        run(
            &params,
            &mut source,
            &mut ScriptedCitations::default(),
            "{repo}: {total_commits} commits",
            temp_dir.path(),
            &TracingObserver,
            now(),
        )
        .await
        .unwrap();

        let summary = std::fs::read_to_string(
            temp_dir.path().join("photutils").join("photutils_summary.txt"),
        )
        .unwrap();
        assert_eq!(summary, "photutils: 2 commits");
    }

    #[tokio::test]
    async fn test_run_reports_each_repository_to_the_observer() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = photutils_history();
        let params = params(r#"{"repo_owner": "astropy", "repos": [{"repo_name": "photutils"}]}"#);
        let observer = RecordingObserver::default();

        run(
            &params,
            &mut source,
            &mut ScriptedCitations::default(),
            DEFAULT_TEMPLATE,
            temp_dir.path(),
            &observer,
            now(),
        )
        .await
        .unwrap();

        let events = observer.events.borrow();
        assert!(matches!(
            events.first().map(String::as_str),
            Some(e) if e.contains("Stage") && e.contains("Processing astropy/photutils")
        ));
        assert!(events.iter().any(|e| e.contains("ReportWritten")));
    }

    #[tokio::test]
    async fn test_run_with_bibcodes_counts_citations() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = photutils_history();
        let mut citations = ScriptedCitations::default()
            .with("2019AJ", &[("2020A", 2020), ("2023B", 2023), ("2024C", 2024)])
            .with("2020zndo", &[("2023B", 2023)]);
        let params = params(
            r#"{"repo_owner": "astropy", "repos": [{"repo_name": "photutils",
                "bibs": ["2019AJ", "2020zndo"], "bib_names": ["Paper", "Zenodo"]}]}"#,
        );
        let observer = RecordingObserver::default();

        let reports = run(
            &params,
            &mut source,
            &mut citations,
            DEFAULT_TEMPLATE,
            temp_dir.path(),
            &observer,
            now(),
        )
        .await
        .unwrap();

        assert_eq!(citations.requests, vec!["2019AJ", "2020zndo"]);
        let series = &reports[0].citations;
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Paper", "Zenodo", ALL_CITATIONS]);
        assert_eq!(series[0].per_year, vec![(2020, 1), (2021, 0), (2022, 0), (2023, 1), (2024, 1)]);
        assert_eq!(series[2].total, 3);

        let repo_dir = temp_dir.path().join("photutils");
        assert!(repo_dir.join("photutils_citations.txt").exists());
        let summary = std::fs::read_to_string(repo_dir.join("photutils_summary.txt")).unwrap();
        assert!(summary.contains("Paper: 3 (2024: 1 to date)"));
        let events = observer.events.borrow();
        assert!(events.iter().any(|e| e.contains("CitationsFetched") && e.contains("2020zndo")));
    }

    #[tokio::test]
    async fn test_run_without_commits_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut source = ScriptedSource::default();
        let params = params(r#"{"repo_owner": "astropy", "repos": [{"repo_name": "empty"}]}"#);

        let err = run(
            &params,
            &mut source,
            &mut ScriptedCitations::default(),
            DEFAULT_TEMPLATE,
            temp_dir.path(),
            &TracingObserver,
            now(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, StatsError::NoCommits(ref name) if name == "astropy/empty"));
    }
}
