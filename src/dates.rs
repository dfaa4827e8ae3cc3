//! Parsing of the site's localized publication timestamps.
//!
//! VnExpress renders dates as `"Thứ hai, 10/6/2024, 10:30 (GMT+7)"`.
//! Parsing swaps the Vietnamese weekday for its English equivalent,
//! strips the timezone annotation, and hands the rest to `chrono`.
//! Malformed input is a soft failure: the caller treats `None` as
//! "reject this article", never as an error.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

/// Closed table of the seven Vietnamese weekday names.
const VIETNAMESE_DAYS: [(&str, &str); 7] = [
    ("Chủ nhật", "Sunday"),
    ("Thứ hai", "Monday"),
    ("Thứ ba", "Tuesday"),
    ("Thứ tư", "Wednesday"),
    ("Thứ năm", "Thursday"),
    ("Thứ sáu", "Friday"),
    ("Thứ bảy", "Saturday"),
];

static GMT_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s\(GMT[+-]\d{1,2}\)").unwrap());

/// Parse a localized date string like `"Thứ hai, 10/06/2024, 10:30 (GMT+7)"`.
pub fn parse_vietnamese_date(raw: &str) -> Option<NaiveDateTime> {
    let mut cleaned = raw.trim().to_string();
    for (vietnamese, english) in VIETNAMESE_DAYS {
        if cleaned.contains(vietnamese) {
            cleaned = cleaned.replace(vietnamese, english);
            break;
        }
    }
    let cleaned = GMT_SUFFIX.replace(&cleaned, "");

    NaiveDateTime::parse_from_str(cleaned.trim(), "%A, %d/%m/%Y, %H:%M").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_weekday_with_gmt_annotation() {
        // 2024-06-10 is a Monday.
        let parsed = parse_vietnamese_date("Thứ hai, 10/06/2024, 10:30 (GMT+7)").unwrap();
        assert_eq!(parsed.year(), 2024);
        assert_eq!(parsed.month(), 6);
        assert_eq!(parsed.day(), 10);
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.minute(), 30);
    }

    #[test]
    fn parses_sunday() {
        // "Chủ nhật" is the only weekday name not starting with "Thứ".
        let parsed = parse_vietnamese_date("Chủ nhật, 09/06/2024, 08:00").unwrap();
        assert_eq!(parsed.day(), 9);
    }

    #[test]
    fn negative_gmt_offset_is_stripped() {
        assert!(parse_vietnamese_date("Thứ hai, 10/06/2024, 10:30 (GMT-5)").is_some());
    }

    #[test]
    fn malformed_input_is_none() {
        assert!(parse_vietnamese_date("hôm nay").is_none());
        assert!(parse_vietnamese_date("").is_none());
        assert!(parse_vietnamese_date("Thứ hai, 2024-06-10 10:30").is_none());
    }

    #[test]
    fn inconsistent_weekday_is_none() {
        // 2024-06-10 is a Monday, not a Friday; chrono rejects the combination.
        assert!(parse_vietnamese_date("Thứ sáu, 10/06/2024, 10:30").is_none());
    }
}
