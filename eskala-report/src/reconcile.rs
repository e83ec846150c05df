use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use eskala_jira::{Issue, IssueSearcher};

use crate::cache::{CacheStore, CachedSnapshot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IssueFilter {
    pub project: String,
    pub labels: Vec<String>,
}

impl IssueFilter {
    pub fn new(project: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            project: project.into(),
            labels,
        }
    }

    pub fn base_jql(&self) -> String {
        if self.labels.is_empty() {
            return format!("project = {}", self.project);
        }
        format!(
            "project = {} AND labels in ({})",
            self.project,
            self.labels.join(", ")
        )
    }

    pub fn updated_since_jql(&self, as_of: NaiveDate) -> String {
        format!(
            "{} AND updated >= \"{}\" AND updated <= now()",
            self.base_jql(),
            as_of.format("%Y-%m-%d")
        )
    }
}

pub fn reconcile_issues(
    searcher: &dyn IssueSearcher,
    cache: &CacheStore,
    filter: &IssueFilter,
    today: NaiveDate,
) -> Result<Vec<Issue>> {
    // an unreadable snapshot (missing, corrupt, io) falls back to a full
    // fetch; cache problems must never block the report
    match cache.load() {
        Ok(snapshot) => refresh_snapshot(searcher, cache, filter, snapshot, today),
        Err(_) => fetch_everything(searcher, cache, filter, today),
    }
}

fn fetch_everything(
    searcher: &dyn IssueSearcher,
    cache: &CacheStore,
    filter: &IssueFilter,
    today: NaiveDate,
) -> Result<Vec<Issue>> {
    let issues = searcher.search_issues(&filter.base_jql())?;
    cache
        .save(&issues, today)
        .with_context(|| "failed to cache fetched issues")?;
    Ok(issues)
}

fn refresh_snapshot(
    searcher: &dyn IssueSearcher,
    cache: &CacheStore,
    filter: &IssueFilter,
    snapshot: CachedSnapshot,
    today: NaiveDate,
) -> Result<Vec<Issue>> {
    let fresh = searcher.search_issues(&filter.updated_since_jql(snapshot.as_of))?;
    let fresh_keys: HashSet<String> = fresh.iter().map(|issue| issue.key.clone()).collect();

    // every cached key appears exactly once: refreshed when the tracker
    // returned it again, carried over unchanged otherwise
    let mut merged = fresh;
    merged.extend(
        snapshot
            .issues
            .into_iter()
            .filter(|issue| !fresh_keys.contains(&issue.key)),
    );

    cache
        .save(&merged, today)
        .with_context(|| "failed to cache reconciled issues")?;
    Ok(merged)
}
