use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use eskala_jira::{Issue, IssueSearcher};

use crate::assemble::build_report_table;
use crate::cache::CacheStore;
use crate::reconcile::{reconcile_issues, IssueFilter};
use crate::xlsx::write_report;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportProgress {
    /// Reconciliation finished; the table is about to be built and written.
    Collected { issues: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportSummary {
    pub issue_count: usize,
    pub output: PathBuf,
}

/// One full report run: reconcile the tracker against the cache, derive the
/// due-date history, and write the workbook. `on_progress` receives coarse
/// stage updates so interactive callers can relay status text mid-run.
pub fn generate_report<F>(
    searcher: &dyn IssueSearcher,
    cache: &CacheStore,
    filter: &IssueFilter,
    browse_base: &str,
    output: &Path,
    today: NaiveDate,
    mut on_progress: F,
) -> Result<ReportSummary>
where
    F: FnMut(ReportProgress),
{
    let issues = reconcile_issues(searcher, cache, filter, today)?;
    on_progress(ReportProgress::Collected {
        issues: issues.len(),
    });
    write_issue_report(&issues, browse_base, output)
}

/// Report half of the pipeline, for callers that already hold an issue batch.
pub fn write_issue_report(
    issues: &[Issue],
    browse_base: &str,
    output: &Path,
) -> Result<ReportSummary> {
    let table = build_report_table(issues, browse_base);
    write_report(&table, output)?;
    Ok(ReportSummary {
        issue_count: issues.len(),
        output: output.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use anyhow::{anyhow, Result};
    use chrono::NaiveDate;
    use eskala_jira::{ChangelogEntry, FieldChange, Issue, IssueSearcher};
    use tempfile::tempdir;

    use super::{generate_report, write_issue_report, ReportProgress};
    use crate::cache::CacheStore;
    use crate::reconcile::IssueFilter;

    struct ScriptedSearcher {
        responses: RefCell<VecDeque<Result<Vec<Issue>>>>,
    }

    impl ScriptedSearcher {
        fn returning(responses: Vec<Result<Vec<Issue>>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
            }
        }
    }

    impl IssueSearcher for ScriptedSearcher {
        fn search_issues(&self, _jql: &str) -> Result<Vec<Issue>> {
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn day(year: i32, month: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, d).expect("valid date")
    }

    fn issue_with_due_date(id: &str, key: &str) -> Issue {
        Issue {
            id: id.to_string(),
            key: key.to_string(),
            fields: [("Summary".to_string(), "Portal absichern".to_string())]
                .into_iter()
                .collect(),
            changelog: vec![ChangelogEntry {
                created: "2018-11-12T09:00:00.000+0100".to_string(),
                changes: vec![FieldChange {
                    field: "Due Date Implemented".to_string(),
                    from: None,
                    to: Some("01.12.2018".to_string()),
                }],
            }],
        }
    }

    #[test]
    fn reports_collected_count_before_writing() {
        let dir = tempdir().expect("temp dir");
        let store = CacheStore::new(dir.path().join("cache"));
        let filter = IssueFilter::new("DC", vec!["VW-PKW".to_string()]);
        let searcher = ScriptedSearcher::returning(vec![Ok(vec![
            issue_with_due_date("1", "DC-1"),
            issue_with_due_date("2", "DC-2"),
        ])]);

        let output = dir.path().join("report.xlsx");
        let progress = RefCell::new(Vec::new());
        let summary = generate_report(
            &searcher,
            &store,
            &filter,
            "https://jira.example.com/browse/",
            &output,
            day(2018, 11, 12),
            |event| progress.borrow_mut().push(event),
        )
        .expect("summary");

        assert_eq!(summary.issue_count, 2);
        assert_eq!(summary.output, output);
        assert!(output.exists());
        assert_eq!(
            *progress.borrow(),
            vec![ReportProgress::Collected { issues: 2 }]
        );
    }

    #[test]
    fn warm_rerun_reports_the_same_issue_count() {
        let dir = tempdir().expect("temp dir");
        let store = CacheStore::new(dir.path().join("cache"));
        let filter = IssueFilter::new("DC", Vec::new());
        let searcher = ScriptedSearcher::returning(vec![
            Ok(vec![issue_with_due_date("1", "DC-1")]),
            Ok(Vec::new()),
        ]);

        let base = "https://jira.example.com/browse/";
        let first = generate_report(
            &searcher,
            &store,
            &filter,
            base,
            &dir.path().join("first.xlsx"),
            day(2018, 11, 12),
            |_| {},
        )
        .expect("cold run");
        let second = generate_report(
            &searcher,
            &store,
            &filter,
            base,
            &dir.path().join("second.xlsx"),
            day(2018, 11, 13),
            |_| {},
        )
        .expect("warm run");

        assert_eq!(first.issue_count, 1);
        assert_eq!(second.issue_count, 1);
    }

    #[test]
    fn tracker_failure_stops_the_run_before_any_write() {
        let dir = tempdir().expect("temp dir");
        let store = CacheStore::new(dir.path().join("cache"));
        let filter = IssueFilter::new("DC", Vec::new());
        let searcher = ScriptedSearcher::returning(vec![Err(anyhow!("session expired"))]);

        let output = dir.path().join("report.xlsx");
        let error = generate_report(
            &searcher,
            &store,
            &filter,
            "https://jira.example.com/browse/",
            &output,
            day(2018, 11, 12),
            |_| panic!("no progress expected"),
        )
        .expect_err("tracker error");

        assert!(error.to_string().contains("session expired"));
        assert!(!output.exists());
        assert!(!store.dir().exists());
    }

    #[test]
    fn writes_a_fixed_batch_without_touching_any_cache() {
        let dir = tempdir().expect("temp dir");
        let output = dir.path().join("report.xlsx");

        let summary = write_issue_report(
            &[issue_with_due_date("1", "DC-1")],
            "https://jira.example.com/browse/",
            &output,
        )
        .expect("summary");

        assert_eq!(summary.issue_count, 1);
        assert!(output.exists());
    }
}
