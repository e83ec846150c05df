use std::collections::BTreeMap;

use eskala_jira::{ChangelogEntry, FieldChange, Issue};

pub const SAMPLE_BROWSE_BASE: &str = "https://cocoa.example.de/sjira/browse/";

/// Three hand-written issues covering the interesting pipeline shapes: a
/// legacy duedate history crossing the field cutover, a successor-field-only
/// history, and an issue that never moved its due date.
pub fn sample_issues() -> Vec<Issue> {
    vec![
        Issue {
            id: "10101".to_string(),
            key: "DC-101".to_string(),
            fields: fields(&[
                ("Department", "Vertrieb"),
                ("Component/s", "Teile-Portal"),
                ("Detailed Type", "Berechtigung"),
                ("Assignee", "Petra Muster"),
                ("Reporter", "Jan Beispiel"),
                ("Contact Person (Business department)", "Petra Muster"),
                ("Contact Person (IT)", "Ines Fuchs"),
                ("Business Transaction", "Ersatzteilbestellung"),
                ("Affected IT-System", "Teile-Portal"),
                ("Summary", "Portalzugriff auf Händlergruppe einschränken"),
                ("Status", "In Arbeit"),
                ("Handover Date", "01.10.2018"),
                ("Dokumente vorhanden?", "Ja"),
            ]),
            changelog: vec![
                change("2018-10-15T09:12:00.000+0200", "duedate", None, "2018-11-20"),
                change(
                    "2018-11-12T14:03:00.000+0100",
                    "Due Date Implemented",
                    Some("20.11.2018"),
                    "01.12.2018",
                ),
            ],
        },
        Issue {
            id: "10102".to_string(),
            key: "DC-102".to_string(),
            fields: fields(&[
                ("Department", "Logistik"),
                ("Component/s", "Schnittstellen"),
                ("Detailed Type", "Datenabgleich"),
                ("Assignee", "Ines Fuchs"),
                ("Reporter", "Petra Muster"),
                ("Business Transaction", "Bestandsmeldung"),
                ("Affected IT-System", "Lager-Basis"),
                ("Summary", "Nächtlichen Bestandsabgleich absichern"),
                ("Status", "Offen"),
                ("Handover Date", "05.11.2018"),
                ("Dokumente vorhanden?", "Nein"),
            ]),
            changelog: vec![change(
                "2019-01-08T10:30:00.000+0100",
                "Due Date Implemented",
                None,
                "01.03.2019",
            )],
        },
        Issue {
            id: "10103".to_string(),
            key: "DC-103".to_string(),
            fields: fields(&[
                ("Department", "Entwicklung"),
                ("Assignee", "Jan Beispiel"),
                ("Reporter", "Ines Fuchs"),
                ("Affected IT-System", "Freigabe-Workflow"),
                ("Summary", "Freigabeprotokoll nachreichen"),
                ("Status", "Geschlossen"),
            ]),
            changelog: Vec::new(),
        },
    ]
}

fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

fn change(created: &str, field: &str, from: Option<&str>, to: &str) -> ChangelogEntry {
    ChangelogEntry {
        created: created.to_string(),
        changes: vec![FieldChange {
            field: field.to_string(),
            from: from.map(str::to_string),
            to: Some(to.to_string()),
        }],
    }
}
