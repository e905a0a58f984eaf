//! Flexible date parsing for spreadsheet cells.
//!
//! Spreadsheet dates arrive in whatever format the editor typed. Parsing
//! tries the unambiguous machine formats first, then day/month/year with a
//! two- or four-digit year. A two-digit year is read as `20YY`. When nothing
//! matches, the original string is kept unchanged.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// `D/M/Y` with `/`, `-` or `.` separators and an optional trailing time.
static DAY_MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})(?:[ T].*)?$")
        .expect("valid day/month/year regex")
});

/// A plausible publication year anywhere in a free-form string.
static LOOSE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").expect("valid year regex"));

const NATIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const NATIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Machine formats: ISO dates, ISO date-times and RFC 3339.
fn parse_native(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    // chrono's %Y accepts short years; native formats lead with all four.
    let leading_year = raw.as_bytes().iter().take_while(|b| b.is_ascii_digit()).count();
    if leading_year != 4 {
        return None;
    }
    for fmt in NATIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NATIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_day_month_year(raw: &str) -> Option<NaiveDate> {
    let caps = DAY_MONTH_YEAR.captures(raw)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year_str = &caps[3];
    let year: i32 = if year_str.len() == 2 {
        format!("20{year_str}").parse().ok()?
    } else {
        year_str.parse().ok()?
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a spreadsheet date, or `None` if no known format matches.
pub fn parse_flexible(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    parse_native(raw).or_else(|| parse_day_month_year(raw))
}

/// ISO `YYYY-MM-DD` form of `raw`, or `raw` itself (trimmed) when it does
/// not parse.
pub fn normalize_date(raw: &str) -> String {
    match parse_flexible(raw) {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => raw.trim().to_string(),
    }
}

/// Year used to group records on index pages.
pub fn year_of(date: &str) -> Option<i32> {
    if let Some(parsed) = parse_flexible(date) {
        return Some(parsed.year());
    }
    LOOSE_YEAR
        .captures(date)
        .and_then(|caps| caps[1].parse().ok())
}
