// Commit statistics.
// Normalizes commit records into entries and aggregates them per author and per month.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::github::{CommitNode, Record};

use super::age_in_days;
use super::months::{MonthCount, YearMonth, count_by_month, fill_missed_months};

/// Author name used when a commit carries none.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// One commit, reduced to what the statistics need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitEntry {
    pub date: NaiveDate,
    pub author: String,
    /// GitHub account id, when the commit is linked to one.
    pub user_id: Option<u64>,
}

impl CommitEntry {
    pub fn new(date: NaiveDate, author: impl Into<String>, user_id: Option<u64>) -> Self {
        Self {
            date,
            author: author.into(),
            user_id,
        }
    }

    /// Build an entry from a cached `history` edge.
    pub fn from_record(record: &Record) -> Result<Self> {
        let node: CommitNode = record.parse_node()?;
        let (author, user_id) = match node.author {
            Some(author) => (
                author.name.unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
                author.user.and_then(|user| user.database_id),
            ),
            None => (UNKNOWN_AUTHOR.to_string(), None),
        };
        Ok(Self::new(node.authored_date.date_naive(), author, user_id))
    }
}

/// Author filtering and identity rules.
///
/// Bots are dropped by exact name. Aliases map an alternative spelling to a
/// canonical author name and are applied before GitHub-id merging.
#[derive(Debug, Clone, Default)]
pub struct AuthorRules {
    bots: HashSet<String>,
    aliases: HashMap<String, String>,
}

impl AuthorRules {
    pub fn new(
        bots: impl IntoIterator<Item = String>,
        aliases: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            bots: bots.into_iter().collect(),
            aliases: aliases.into_iter().collect(),
        }
    }

    pub fn is_bot(&self, name: &str) -> bool {
        self.bots.contains(name)
    }

    pub fn canonical<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases.get(name).map(String::as_str).unwrap_or(name)
    }
}

/// Commit history of one author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorActivity {
    pub commits: usize,
    pub first_commit: NaiveDate,
    pub last_commit: NaiveDate,
}

/// Aggregated commit statistics for a repository.
#[derive(Debug, Clone, Default)]
pub struct CommitStats {
    /// Days before present counted as recent.
    pub age_recent: i64,
    pub total_commits: usize,
    pub authors: BTreeMap<String, AuthorActivity>,
    /// Authors whose first commit falls in the recent window.
    pub new_authors: Vec<String>,
    /// Authors with any commit in the recent window.
    pub n_recent_authors: usize,
    pub authors_per_month: Vec<MonthCount>,
    /// Authors with more than one commit in the month.
    pub multi_authors_per_month: Vec<MonthCount>,
    /// Authors whose first commit was in the month.
    pub new_authors_per_month: Vec<MonthCount>,
}

impl CommitStats {
    pub fn commits_for_each_author(&self) -> BTreeMap<String, usize> {
        self.authors
            .iter()
            .map(|(name, activity)| (name.clone(), activity.commits))
            .collect()
    }
}

/// Aggregate commit entries.
pub fn process_commits(
    entries: &[CommitEntry],
    rules: &AuthorRules,
    age_recent: i64,
    now: DateTime<Utc>,
) -> CommitStats {
    let mut kept: Vec<CommitEntry> = entries
        .iter()
        .filter(|entry| !rules.is_bot(&entry.author))
        .map(|entry| CommitEntry {
            author: rules.canonical(&entry.author).to_string(),
            ..entry.clone()
        })
        .collect();

    merge_by_user_id(&mut kept);

    let mut authors: BTreeMap<String, AuthorActivity> = BTreeMap::new();
    let mut month_authors: BTreeMap<(YearMonth, &str), usize> = BTreeMap::new();
    for entry in &kept {
        authors
            .entry(entry.author.clone())
            .and_modify(|a| {
                a.commits += 1;
                a.first_commit = a.first_commit.min(entry.date);
                a.last_commit = a.last_commit.max(entry.date);
            })
            .or_insert(AuthorActivity {
                commits: 1,
                first_commit: entry.date,
                last_commit: entry.date,
            });
        *month_authors
            .entry((YearMonth::from_date(&entry.date), entry.author.as_str()))
            .or_default() += 1;
    }

    let this_month = YearMonth::from_date(&now);
    let authors_per_month = count_by_month(month_authors.keys().map(|(month, _)| *month));
    let multi_authors_per_month = count_by_month(
        month_authors
            .iter()
            .filter(|(_, commits)| **commits > 1)
            .map(|((month, _), _)| *month),
    );
    let new_authors_per_month = count_by_month(
        authors
            .values()
            .map(|a| YearMonth::from_date(&a.first_commit)),
    );

    let mut n_recent_authors = 0;
    let mut new_authors = Vec::new();
    for (name, activity) in &authors {
        if age_in_days(activity.last_commit, now) <= age_recent {
            n_recent_authors += 1;
            if age_in_days(activity.first_commit, now) <= age_recent {
                new_authors.push(name.clone());
            }
        }
    }

    CommitStats {
        age_recent,
        total_commits: kept.len(),
        new_authors,
        n_recent_authors,
        authors_per_month: fill_missed_months(&authors_per_month, this_month),
        multi_authors_per_month: fill_missed_months(&multi_authors_per_month, this_month),
        new_authors_per_month: fill_missed_months(&new_authors_per_month, this_month),
        authors,
    }
}

/// Give every commit linked to the same GitHub account the name used on that
/// account's most recent commit.
fn merge_by_user_id(entries: &mut [CommitEntry]) {
    let mut latest: HashMap<u64, (NaiveDate, String)> = HashMap::new();
    for entry in entries.iter() {
        let Some(id) = entry.user_id else { continue };
        match latest.get(&id) {
            Some((date, _)) if *date > entry.date => {}
            _ => {
                latest.insert(id, (entry.date, entry.author.clone()));
            }
        }
    }

    for entry in entries.iter_mut() {
        if let Some((_, name)) = entry.user_id.and_then(|id| latest.get(&id)) {
            entry.author.clone_from(name);
        }
    }
}
