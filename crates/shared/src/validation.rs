//! Common validation and normalization utilities.

use chrono::{DateTime, Utc};
use validator::ValidationError;

/// Trims free text and collapses blank input to `None`.
pub fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside a
/// `LIKE`/`ILIKE` pattern (backslash is the PostgreSQL default escape).
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Parses an RFC 3339 instant into UTC.
///
/// Returns `None` for anything that is not a valid instant.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Validates that an optional time range is ordered.
pub fn validate_time_range(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<(), ValidationError> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => {
            let mut err = ValidationError::new("time_range_order");
            err.message = Some("Range start must not be after range end".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_text_trims() {
        assert_eq!(
            normalize_text(Some("  spring promo  ")),
            Some("spring promo".to_string())
        );
    }

    #[test]
    fn test_normalize_text_blank_is_none() {
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(Some("")), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn test_escape_like_plain() {
        assert_eq!(escape_like("promo"), "promo");
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_parse_instant_accepts_offsets() {
        let parsed = parse_instant("2024-05-01T10:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        assert!(parse_instant("not a date").is_none());
        assert!(parse_instant("2024-13-40T99:00:00Z").is_none());
        assert!(parse_instant("").is_none());
    }

    #[test]
    fn test_validate_time_range() {
        let early = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        assert!(validate_time_range(Some(early), Some(late)).is_ok());
        assert!(validate_time_range(Some(early), None).is_ok());
        assert!(validate_time_range(None, None).is_ok());

        let err = validate_time_range(Some(late), Some(early)).unwrap_err();
        assert_eq!(
            err.message.unwrap().to_string(),
            "Range start must not be after range end"
        );
    }
}
