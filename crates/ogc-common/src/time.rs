//! Date window helpers.
//!
//! Services without result paging cap every response, so large temporal
//! extractions are split into windows and one filtered request is issued per
//! window.

use chrono::{Datelike, Duration, NaiveDate};

/// Date formats accepted for window boundaries.
pub const VALID_DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d", "%Y-%m-%d"];

/// Errors raised while parsing window boundaries.
#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    #[error("The interval must be a positive number of days, got {0}")]
    InvalidInterval(i64),
}

/// The first format in [`VALID_DATE_FORMATS`] that parses `value`.
pub fn date_format(value: &str) -> Option<&'static str> {
    VALID_DATE_FORMATS
        .iter()
        .copied()
        .find(|fmt| NaiveDate::parse_from_str(value, fmt).is_ok())
}

/// True when `value` parses with one of the accepted formats.
pub fn is_date(value: &str) -> bool {
    date_format(value).is_some()
}

fn parse_date(value: &str) -> Result<NaiveDate, TimeParseError> {
    let fmt = date_format(value).ok_or_else(|| TimeParseError::InvalidFormat(value.to_string()))?;
    NaiveDate::parse_from_str(value, fmt).map_err(|_| TimeParseError::InvalidFormat(value.to_string()))
}

/// Consecutive `[start, end)` windows of `n` days covering `start..end`.
///
/// The last window is shortened to end exactly at `end`.
pub fn day_ranges(start: &str, end: &str, n: i64) -> Result<Vec<(NaiveDate, NaiveDate)>, TimeParseError> {
    if n <= 0 {
        return Err(TimeParseError::InvalidInterval(n));
    }
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    let step = Duration::days(n);

    let mut ranges = Vec::new();
    let mut period_start = start;
    while period_start < end {
        let period_end = (period_start + step).min(end);
        ranges.push((period_start, period_end));
        period_start = period_end;
    }
    Ok(ranges)
}

/// The last day of the month containing `date`.
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.pred_opt())
        .unwrap_or(date)
}

/// Month windows `[begin, last day of month]` from `begin` through `end`.
///
/// The first window starts at `begin` itself; later windows start on the
/// first of each month.
pub fn month_ranges(begin: &str, end: &str) -> Result<Vec<(NaiveDate, NaiveDate)>, TimeParseError> {
    let mut current = parse_date(begin)?;
    let end = parse_date(end)?;

    let mut ranges = Vec::new();
    while current <= end {
        let month_end = last_day_of_month(current);
        ranges.push((current, month_end));
        match month_end.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(ranges)
}
