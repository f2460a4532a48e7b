//! Timestamped export filenames.

use web_time::{SystemTime, UNIX_EPOCH};

/// Filename prefix for every export.
pub const EXPORT_PREFIX: &str = "snapcheck";

/// Build `snapcheck_<context>_<timestamp>.csv` for the given moment.
///
/// The timestamp is UTC `YYYY-MM-DD_HHMMSS_mmm`, so names sort by creation time.
pub fn export_filename(context: &str, at: SystemTime) -> String {
    format!("{}_{}_{}.csv", EXPORT_PREFIX, context, timestamp(at))
}

/// Export filename for the current time.
pub fn export_filename_now(context: &str) -> String {
    export_filename(context, SystemTime::now())
}

fn timestamp(at: SystemTime) -> String {
    // web-time keeps this working on wasm, where std's clock panics
    let duration = at.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    let secs_today = secs % 86400;
    let (year, month, day) = days_to_ymd(secs / 86400);

    format!(
        "{:04}-{:02}-{:02}_{:02}{:02}{:02}_{:03}",
        year,
        month,
        day,
        secs_today / 3600,
        (secs_today % 3600) / 60,
        secs_today % 60,
        millis
    )
}

/// Convert days since Unix epoch to year/month/day.
fn days_to_ymd(days: u64) -> (u32, u32, u32) {
    let mut remaining_days = days;
    let mut year = 1970u32;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining_days < days_in_year {
            break;
        }
        remaining_days -= days_in_year;
        year += 1;
    }

    let feb = if is_leap_year(year) { 29 } else { 28 };
    let days_in_months: [u64; 12] = [31, feb, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    let mut month = 1u32;
    for days_in_month in days_in_months {
        if remaining_days < days_in_month {
            break;
        }
        remaining_days -= days_in_month;
        month += 1;
    }

    (year, month, remaining_days as u32 + 1)
}

fn is_leap_year(year: u32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
