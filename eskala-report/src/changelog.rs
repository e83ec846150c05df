use chrono::{NaiveDate, NaiveDateTime};
use eskala_jira::Issue;

use crate::dates::{parse_day_first_date, parse_day_first_datetime};

pub const LEGACY_DUE_DATE_FIELD: &str = "duedate";
pub const IMPLEMENTED_DUE_DATE_FIELD: &str = "Due Date Implemented";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeRecord {
    pub issue_id: String,
    pub changed_at: Option<NaiveDateTime>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

// Due dates lived in the stock "duedate" field until the tracker migration
// on 30 Oct 2018; afterwards only "Due Date Implemented" carries them.
// The comparison is inclusive, so an entry stamped exactly at the cutover
// midnight still counts as legacy.
fn legacy_field_cutover() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2018, 10, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .expect("valid cutover date")
}

pub fn extract_due_date_changes(issues: &[Issue]) -> Vec<ChangeRecord> {
    let cutover = legacy_field_cutover();
    let mut records = Vec::new();

    for issue in issues {
        for entry in &issue.changelog {
            let changed_at = parse_day_first_datetime(&entry.created);
            let before_cutover = changed_at.map(|stamp| stamp <= cutover).unwrap_or(false);

            for change in &entry.changes {
                let selected = (before_cutover && change.field == LEGACY_DUE_DATE_FIELD)
                    || change.field == IMPLEMENTED_DUE_DATE_FIELD;
                if !selected {
                    continue;
                }

                records.push(ChangeRecord {
                    issue_id: issue.id.clone(),
                    changed_at,
                    from: change.from.as_deref().and_then(parse_day_first_date),
                    to: change.to.as_deref().and_then(parse_day_first_date),
                });
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use eskala_jira::{ChangelogEntry, FieldChange, Issue};

    use super::extract_due_date_changes;

    fn change(field: &str, to: &str) -> FieldChange {
        FieldChange {
            field: field.to_string(),
            from: None,
            to: Some(to.to_string()),
        }
    }

    fn issue_with_changelog(id: &str, changelog: Vec<ChangelogEntry>) -> Issue {
        Issue {
            id: id.to_string(),
            key: format!("DC-{id}"),
            fields: Default::default(),
            changelog,
        }
    }

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn keeps_legacy_field_only_up_to_the_cutover() {
        let issue = issue_with_changelog(
            "7",
            vec![
                ChangelogEntry {
                    created: "2018-10-29T10:00:00.000+0200".to_string(),
                    changes: vec![change("duedate", "2018-11-01")],
                },
                ChangelogEntry {
                    created: "2018-10-30T00:00:00.000+0100".to_string(),
                    changes: vec![change("duedate", "2018-11-02")],
                },
                ChangelogEntry {
                    created: "2018-11-05T10:00:00.000+0100".to_string(),
                    changes: vec![change("duedate", "2018-11-03")],
                },
            ],
        );

        let records = extract_due_date_changes(&[issue]);
        let to_dates: Vec<_> = records.iter().map(|record| record.to).collect();
        assert_eq!(
            to_dates,
            vec![Some(day(2018, 11, 1)), Some(day(2018, 11, 2))]
        );
    }

    #[test]
    fn keeps_successor_field_regardless_of_timestamp() {
        let issue = issue_with_changelog(
            "9",
            vec![
                ChangelogEntry {
                    created: "2010-01-01T08:00:00.000+0100".to_string(),
                    changes: vec![change("Due Date Implemented", "01.02.2010")],
                },
                ChangelogEntry {
                    created: "2019-03-04T08:00:00.000+0100".to_string(),
                    changes: vec![change("Due Date Implemented", "05.03.2019")],
                },
            ],
        );

        let records = extract_due_date_changes(&[issue]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].to, Some(day(2010, 2, 1)));
        assert_eq!(records[1].to, Some(day(2019, 3, 5)));
    }

    #[test]
    fn ignores_unrelated_fields_and_empty_changelogs() {
        let noisy = issue_with_changelog(
            "3",
            vec![ChangelogEntry {
                created: "2018-10-01T08:00:00.000+0200".to_string(),
                changes: vec![change("status", "In Arbeit"), change("assignee", "pmuster")],
            }],
        );
        let silent = issue_with_changelog("4", Vec::new());

        assert!(extract_due_date_changes(&[noisy, silent]).is_empty());
    }

    #[test]
    fn unparseable_entry_timestamp_disables_only_the_legacy_rule() {
        let issue = issue_with_changelog(
            "5",
            vec![ChangelogEntry {
                created: "garbled".to_string(),
                changes: vec![
                    change("duedate", "2018-10-01"),
                    change("Due Date Implemented", "2018-10-02"),
                ],
            }],
        );

        let records = extract_due_date_changes(&[issue]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].changed_at, None);
        assert_eq!(records[0].to, Some(day(2018, 10, 2)));
    }

    #[test]
    fn out_of_range_values_degrade_to_none_without_dropping_the_record() {
        let issue = issue_with_changelog(
            "6",
            vec![ChangelogEntry {
                created: "2018-10-01T08:00:00.000+0200".to_string(),
                changes: vec![FieldChange {
                    field: "duedate".to_string(),
                    from: Some("01.01.3000".to_string()),
                    to: Some("15.10.2018".to_string()),
                }],
            }],
        );

        let records = extract_due_date_changes(&[issue]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from, None);
        assert_eq!(records[0].to, Some(day(2018, 10, 15)));
    }
}
