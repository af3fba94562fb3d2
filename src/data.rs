use chrono::{DateTime, Days, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

// Slash dates are month-first, falling back to day-first when the first
// field cannot be a month.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y",
];

const SPREADSHEET_EPOCH: (i32, u32, u32) = (1899, 12, 30);
const MAX_SPREADSHEET_SERIAL: f64 = 2_958_465.0;

/// Canonical string form of an identifier cell.
///
/// Surrounding whitespace is dropped and integral decimal renderings such as
/// `1001.0` collapse to `1001`, so ids exported as numbers by one system and
/// as text by another still compare equal.
pub fn normalize_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some((whole, fraction)) = trimmed.split_once('.') {
        let digits = whole.strip_prefix('-').unwrap_or(whole);
        if !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && !fraction.is_empty()
            && fraction.bytes().all(|b| b == b'0')
        {
            return whole.to_string();
        }
    }
    trimmed.to_string()
}

/// Join key for article codes, which match case-insensitively.
pub fn article_key(code: &str) -> String {
    code.to_lowercase()
}

pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

pub fn parse_naive_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// A bare four-digit year, read as the first of January.
pub fn parse_bare_year(value: &str) -> Option<NaiveDate> {
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::from_ymd_opt(value.parse().ok()?, 1, 1)
}

/// Day numbers as stored by spreadsheet applications (1900 date system).
pub fn parse_spreadsheet_serial(value: &str) -> Option<NaiveDate> {
    let serial: f64 = value.parse().ok()?;
    if !serial.is_finite() || !(1.0..=MAX_SPREADSHEET_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = SPREADSHEET_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Best-effort parse of a production end cell; anything unrecognised is `None`.
///
/// Four-digit integers are years, not spreadsheet serials, so `2024` is
/// 2024-01-01 rather than day 2024 of the 1900 date system.
pub fn parse_production_end(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    parse_naive_datetime(value)
        .map(|dt| dt.date())
        .or_else(|| parse_naive_date(value))
        .or_else(|| parse_bare_year(value))
        .or_else(|| parse_spreadsheet_serial(value))
}
