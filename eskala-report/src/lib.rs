pub mod assemble;
pub mod cache;
pub mod changelog;
pub mod dates;
pub mod pipeline;
pub mod reconcile;
pub mod reshape;
pub mod xlsx;

pub use assemble::{
    build_report_table, join_report_table, Cell, Column, ReportTable, ISSUE_LINK_COLUMN,
    SHEET_NAME,
};
pub use cache::{CacheError, CacheStore, CachedSnapshot};
pub use changelog::{extract_due_date_changes, ChangeRecord};
pub use pipeline::{generate_report, write_issue_report, ReportProgress, ReportSummary};
pub use reconcile::{reconcile_issues, IssueFilter};
pub use reshape::{reshape_due_dates, DueDateTable, ReshapedRow};
pub use xlsx::write_report;
