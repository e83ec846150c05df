use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::changelog::ChangeRecord;

pub const DUE_DATE_COLUMN_PREFIX: &str = "Due Date";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReshapedRow {
    pub issue_id: String,
    pub due_dates: Vec<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DueDateTable {
    pub rows: Vec<ReshapedRow>,
    pub column_count: usize,
}

impl DueDateTable {
    pub fn column_names(&self) -> Vec<String> {
        (1..=self.column_count)
            .map(|index| format!("{DUE_DATE_COLUMN_PREFIX} {index}"))
            .collect()
    }

    pub fn row_for(&self, issue_id: &str) -> Option<&ReshapedRow> {
        self.rows.iter().find(|row| row.issue_id == issue_id)
    }
}

// Pivots change records into one row per issue: to-dates sorted ascending,
// de-duplicated, filled into "Due Date 1..k". The column count is the widest
// row of the batch and is recomputed on every run.
pub fn reshape_due_dates(records: &[ChangeRecord]) -> DueDateTable {
    let mut groups: BTreeMap<&str, Vec<NaiveDate>> = BTreeMap::new();
    for record in records {
        // a change that never produced a usable to-date claims no column
        let Some(to) = record.to else {
            continue;
        };
        groups.entry(record.issue_id.as_str()).or_default().push(to);
    }

    let mut rows = Vec::new();
    let mut column_count = 0usize;
    for (issue_id, mut dates) in groups {
        dates.sort();
        dates.dedup();
        column_count = column_count.max(dates.len());
        rows.push(ReshapedRow {
            issue_id: issue_id.to_string(),
            due_dates: dates,
        });
    }

    DueDateTable { rows, column_count }
}
