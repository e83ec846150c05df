use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use eskala_jira::Issue;

use crate::changelog::extract_due_date_changes;
use crate::dates::parse_day_first_date;
use crate::reshape::{reshape_due_dates, DueDateTable, ReshapedRow};

pub const SHEET_NAME: &str = "Maßnahmen";
pub const ISSUE_LINK_COLUMN: &str = "JIRA ID";

const HANDOVER_SOURCE_FIELD: &str = "Handover Date";

// tracker field name → report column title, in output order
const METADATA_COLUMNS: [(&str, &str); 13] = [
    ("Department", "Bereich"),
    ("Component/s", "Component/s"),
    ("Detailed Type", "Detailed Type"),
    ("Assignee", "Assignee"),
    ("Reporter", "Reporter"),
    (
        "Contact Person (Business department)",
        "Contact Person (Business department)",
    ),
    ("Contact Person (IT)", "Contact Person (IT)"),
    ("Business Transaction", "Business Transaction"),
    ("Affected IT-System", "System"),
    ("Summary", "Maßnahme"),
    ("Status", "Status"),
    ("Handover Date", "Maßnahme übergeben am:"),
    ("Dokumente vorhanden?", "Dokumente vorhanden?"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Text(String),
    Date(NaiveDate),
    Link { url: String, text: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    pub title: String,
    pub is_date: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportTable {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn column_titles(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(|column| column.title.as_str())
            .collect()
    }
}

pub fn build_report_table(issues: &[Issue], browse_base: &str) -> ReportTable {
    let records = extract_due_date_changes(issues);
    let due_dates = reshape_due_dates(&records);
    join_report_table(issues, &due_dates, browse_base)
}

// Outer join on issue id: every issue gets a row (empty due-date cells when
// it never changed a due date), and due-date rows whose issue is missing
// from the batch still appear with empty metadata.
pub fn join_report_table(
    issues: &[Issue],
    due_dates: &DueDateTable,
    browse_base: &str,
) -> ReportTable {
    let by_id: HashMap<&str, &ReshapedRow> = due_dates
        .rows
        .iter()
        .map(|row| (row.issue_id.as_str(), row))
        .collect();

    let mut columns = Vec::with_capacity(1 + METADATA_COLUMNS.len() + due_dates.column_count);
    columns.push(Column {
        title: ISSUE_LINK_COLUMN.to_string(),
        is_date: false,
    });
    columns.extend(METADATA_COLUMNS.iter().map(|(source, title)| Column {
        title: (*title).to_string(),
        is_date: *source == HANDOVER_SOURCE_FIELD,
    }));
    columns.extend(due_dates.column_names().into_iter().map(|title| Column {
        title,
        is_date: true,
    }));

    let mut rows = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    for issue in issues {
        seen.insert(issue.id.as_str());
        rows.push(issue_row(
            issue,
            browse_base,
            by_id.get(issue.id.as_str()).copied(),
            due_dates.column_count,
        ));
    }
    for row in &due_dates.rows {
        if !seen.contains(row.issue_id.as_str()) {
            rows.push(orphan_row(row, due_dates.column_count));
        }
    }

    ReportTable { columns, rows }
}

fn issue_row(
    issue: &Issue,
    browse_base: &str,
    due: Option<&ReshapedRow>,
    due_columns: usize,
) -> Vec<Cell> {
    let mut cells = Vec::with_capacity(1 + METADATA_COLUMNS.len() + due_columns);
    cells.push(Cell::Link {
        url: format!("{browse_base}{}", issue.key),
        text: issue.key.clone(),
    });

    for (source, _) in METADATA_COLUMNS {
        let value = issue.field(source);
        let cell = if source == HANDOVER_SOURCE_FIELD {
            value.and_then(parse_day_first_date).map(Cell::Date)
        } else {
            value.map(|text| Cell::Text(text.to_string()))
        };
        cells.push(cell.unwrap_or(Cell::Empty));
    }

    push_due_date_cells(&mut cells, due, due_columns);
    cells
}

fn orphan_row(row: &ReshapedRow, due_columns: usize) -> Vec<Cell> {
    let mut cells = vec![Cell::Empty; 1 + METADATA_COLUMNS.len()];
    push_due_date_cells(&mut cells, Some(row), due_columns);
    cells
}

fn push_due_date_cells(cells: &mut Vec<Cell>, due: Option<&ReshapedRow>, due_columns: usize) {
    for index in 0..due_columns {
        let cell = due
            .and_then(|row| row.due_dates.get(index))
            .map(|date| Cell::Date(*date))
            .unwrap_or(Cell::Empty);
        cells.push(cell);
    }
}
