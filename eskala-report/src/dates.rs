use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

// 64-bit nanosecond timestamps only cover roughly 1678..=2261; dates outside
// that window are unusable downstream and degrade to None.
const MIN_SUPPORTED_YEAR: i32 = 1678;
const MAX_SUPPORTED_YEAR: i32 = 2261;

const DATE_FORMATS: [&str; 6] = [
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d/%b/%y",
    "%d/%b/%Y",
    "%Y-%m-%d",
];

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn parse_day_first_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return supported(date);
        }
    }

    parse_day_first_datetime(trimmed).map(|timestamp| timestamp.date())
}

pub fn parse_day_first_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    // tracker timestamps come with offsets ("+02:00", "Z" or Jira's "+0200");
    // the wall-clock reading is kept, matching how the values are displayed
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        let local = timestamp.naive_local();
        return supported(local.date()).map(|_| local);
    }
    if let Ok(timestamp) = DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z") {
        let local = timestamp.naive_local();
        return supported(local.date()).map(|_| local);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, format) {
            return supported(timestamp.date()).map(|_| timestamp);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return supported(date).and_then(|date| date.and_hms_opt(0, 0, 0));
        }
    }

    None
}

fn supported(date: NaiveDate) -> Option<NaiveDate> {
    if (MIN_SUPPORTED_YEAR..=MAX_SUPPORTED_YEAR).contains(&date.year()) {
        Some(date)
    } else {
        None
    }
}
