// ============================================================
// VALUE NORMALIZER
// ============================================================
// Stateless cell-text canonicalization, principally dates

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Days between the spreadsheet serial epoch (1899-12-30) and 1970-01-01.
const SERIAL_EPOCH_OFFSET_DAYS: f64 = 25_569.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Plausible serial band, roughly calendar years 1982..=2064. Numbers
/// outside it are not treated as serial dates.
const SERIAL_MIN: f64 = 30_000.0;
const SERIAL_MAX: f64 = 60_000.0;

/// Parsed years outside this range are parser artifacts; the raw input is
/// kept instead.
const MIN_PLAUSIBLE_YEAR: i32 = 1900;
const MAX_PLAUSIBLE_YEAR: i32 = 2100;

const TEXTUAL_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
];

const TEXTUAL_DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Normalize a date cell to `YYYY-MM-DDTHH:MM:SSZ`. Tries the spreadsheet
/// serial interpretation first, then generic textual parsing; any failure,
/// implausible year, or empty input returns the original string unchanged.
/// Never aborts the row.
pub fn normalize_date(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return raw.to_string();
    }

    if let Some(instant) = parse_serial(trimmed).or_else(|| parse_textual(trimmed)) {
        let year = instant.year();
        if (MIN_PLAUSIBLE_YEAR..=MAX_PLAUSIBLE_YEAR).contains(&year) {
            return instant.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        }
    }

    raw.to_string()
}

/// Non-date fields are normalized by trimming only; an absent cell reads as
/// the empty string, never a null-like sentinel.
pub fn normalize_field(raw: &str) -> String {
    raw.trim().to_string()
}

fn parse_serial(value: &str) -> Option<DateTime<Utc>> {
    if !is_plain_number(value) {
        return None;
    }
    let serial: f64 = value.parse().ok()?;
    if !(SERIAL_MIN..=SERIAL_MAX).contains(&serial) {
        return None;
    }
    let seconds = ((serial - SERIAL_EPOCH_OFFSET_DAYS) * SECONDS_PER_DAY).round() as i64;
    DateTime::from_timestamp(seconds, 0)
}

// Digits with at most one decimal point; signs and separators disqualify.
fn is_plain_number(value: &str) -> bool {
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in value.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

fn parse_textual(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in TEXTUAL_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }
    for format in TEXTUAL_DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_date_lands_in_2026() {
        let normalized = normalize_date("46026");
        assert!(normalized.starts_with("2026-"), "got {}", normalized);
        assert!(normalized.ends_with('Z'));
    }

    #[test]
    fn out_of_band_number_passes_through() {
        assert_eq!(normalize_date("99999999"), "99999999");
        assert_eq!(normalize_date("12"), "12");
    }

    #[test]
    fn serial_with_time_fraction() {
        // 0.5 of a day is noon.
        let normalized = normalize_date("46026.5");
        assert!(normalized.contains("T12:00:00Z"), "got {}", normalized);
    }

    #[test]
    fn textual_dates_render_canonically() {
        assert_eq!(normalize_date("2020-05-01"), "2020-05-01T00:00:00Z");
        assert_eq!(normalize_date("05/01/2020"), "2020-05-01T00:00:00Z");
        assert_eq!(
            normalize_date("2020-05-01 13:45:10"),
            "2020-05-01T13:45:10Z"
        );
        assert_eq!(
            normalize_date("2020-05-01T13:45:10+02:00"),
            "2020-05-01T11:45:10Z"
        );
    }

    #[test]
    fn implausible_year_passes_through() {
        assert_eq!(normalize_date("01/01/9999"), "01/01/9999");
        assert_eq!(normalize_date("1850-06-01"), "1850-06-01");
    }

    #[test]
    fn garbage_and_empty_pass_through() {
        assert_eq!(normalize_date("not a date"), "not a date");
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("   "), "   ");
    }

    #[test]
    fn field_normalization_trims_only() {
        assert_eq!(normalize_field("  Brazil "), "Brazil");
        assert_eq!(normalize_field(""), "");
    }
}
