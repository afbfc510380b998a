//! Run gate: acquisition only happens on selected weekdays of the month.

use chrono::{Datelike, NaiveDate, Weekday};

pub const DEFAULT_RUN_WEEKDAY: Weekday = Weekday::Wed;

/// Which occurrence of its weekday `date` is within the month (1-based).
pub fn weekday_occurrence(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// True when `date` is the first or third `weekday` of its month.
pub fn is_run_day(date: NaiveDate, weekday: Weekday) -> bool {
    date.weekday() == weekday && matches!(weekday_occurrence(date), 1 | 3)
}

/// Parse a weekday name (`wed`, `Wednesday`, ...) for the CLI.
pub fn parse_weekday(s: &str) -> Result<Weekday, String> {
    s.trim()
        .parse::<Weekday>()
        .map_err(|_| format!("'{s}' is not a weekday name (expected e.g. mon, wed, friday)"))
}
