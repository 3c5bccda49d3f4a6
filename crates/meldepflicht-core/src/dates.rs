//! Date handling for the accident report, which uses German `DD.MM.YYYY` dates.

use chrono::{NaiveDate, NaiveTime};

/// Strict digit pattern check: exactly `DD.MM.YYYY`, no calendar check.
pub fn is_form_date_pattern(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[2] == b'.'
        && b[5] == b'.'
        && b[..2].iter().chain(&b[3..5]).chain(&b[6..]).all(u8::is_ascii_digit)
}

/// Parse a `DD.MM.YYYY` date, rejecting both pattern and calendar violations.
pub fn parse_form_date(s: &str) -> Option<NaiveDate> {
    if !is_form_date_pattern(s) {
        return None;
    }
    let day = s[..2].parse().ok()?;
    let month = s[3..5].parse().ok()?;
    let year = s[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Render an incoming date for the form.
///
/// ISO dates (`YYYY-MM-DD`, optionally followed by a time part) are rewritten
/// to `DD.MM.YYYY`; every other value is returned trimmed but otherwise
/// untouched so validation can report it.
pub fn to_form_date(raw: &str) -> String {
    let raw = raw.trim();
    let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
    let b = date_part.as_bytes();
    let is_iso = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b[..4].iter().chain(&b[5..7]).chain(&b[8..]).all(u8::is_ascii_digit);
    if is_iso {
        format!("{}.{}.{}", &date_part[8..], &date_part[5..7], &date_part[..4])
    } else {
        raw.to_string()
    }
}

/// Parse an `HH:MM` time of day.
pub fn parse_time(s: &str) -> Option<NaiveTime> {
    let (h, m) = s.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    NaiveTime::from_hms_opt(h.parse().ok()?, m.parse().ok()?, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_requires_two_two_four_digits() {
        assert!(is_form_date_pattern("15.03.2024"));
        assert!(is_form_date_pattern("31.02.2024"));
        assert!(!is_form_date_pattern("5.3.2024"));
        assert!(!is_form_date_pattern("15.03.24"));
        assert!(!is_form_date_pattern("2024-03-15"));
        assert!(!is_form_date_pattern("15/03/2024"));
        assert!(!is_form_date_pattern("1a.03.2024"));
    }

    #[test]
    fn parse_rejects_impossible_calendar_dates() {
        assert_eq!(parse_form_date("29.02.2024"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_form_date("31.02.2024"), None);
        assert_eq!(parse_form_date("29.02.2023"), None);
    }

    #[test]
    fn iso_dates_are_rewritten() {
        assert_eq!(to_form_date("2024-03-15"), "15.03.2024");
        assert_eq!(to_form_date("2024-03-15T08:30:00Z"), "15.03.2024");
        assert_eq!(to_form_date(" 15.03.2024 "), "15.03.2024");
        assert_eq!(to_form_date("März 2024"), "März 2024");
    }

    #[test]
    fn time_of_day() {
        assert_eq!(parse_time("08:30"), NaiveTime::from_hms_opt(8, 30, 0));
        assert_eq!(parse_time("7:05"), NaiveTime::from_hms_opt(7, 5, 0));
        assert_eq!(parse_time("25:00"), None);
        assert_eq!(parse_time("0830"), None);
    }
}
