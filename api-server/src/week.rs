use chrono::{DateTime, Datelike, Utc};

/// Week-bucket key `YYYY-Www` on the ISO-8601 week-numbering calendar, so
/// the first days of January can belong to the previous year's last week.
pub(crate) fn week_key(at: DateTime<Utc>) -> String {
    let week = at.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}
