use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::constants::{ERR_DATES_REQUIRED, ERR_DATE_RANGE, ERR_INVALID_DATE};
use crate::error::{AppError, Result};

/// Parse a client date.
///
/// Accepts RFC 3339, `datetime-local` style values without offset (taken as
/// UTC) and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parse a date that must be well formed
pub fn require_date(raw: &str) -> Result<DateTime<Utc>> {
    parse_date(raw).ok_or_else(|| AppError::invalid(ERR_INVALID_DATE))
}

/// Validate a `[start, end)` scheduling window
pub fn date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = match (non_empty(start), non_empty(end)) {
        (Some(start), Some(end)) => (start, end),
        _ => return Err(AppError::invalid(ERR_DATES_REQUIRED)),
    };

    let start = require_date(start)?;
    let end = require_date(end)?;
    if start >= end {
        return Err(AppError::invalid(ERR_DATE_RANGE));
    }
    Ok((start, end))
}

/// Check that a path identifier is a well-formed record id
pub fn parse_id(raw: &str, message: &str) -> Result<String> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::invalid(message))
}

/// Trimmed value, `None` when absent or blank
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_date("2025-06-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_date("2025-06-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_date("2025-06-01T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_date("2025-06-01T10:00"), Some(expected));
        assert_eq!(
            parse_date("2025-06-01"),
            Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2025-02-30"), None);
    }

    #[test]
    fn test_date_range_validation() {
        assert!(date_range(Some("2025-01-01"), Some("2025-02-01")).is_ok());

        let missing = date_range(Some("2025-01-01"), None).unwrap_err();
        assert_eq!(missing.to_string(), ERR_DATES_REQUIRED);

        let bad = date_range(Some("2025-01-01"), Some("soon")).unwrap_err();
        assert_eq!(bad.to_string(), ERR_INVALID_DATE);

        let inverted = date_range(Some("2025-02-01"), Some("2025-01-01")).unwrap_err();
        assert_eq!(inverted.to_string(), ERR_DATE_RANGE);

        let equal = date_range(Some("2025-01-01"), Some("2025-01-01")).unwrap_err();
        assert_eq!(equal.to_string(), ERR_DATE_RANGE);
    }

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_id(&id, "bad").unwrap(), id);
        assert!(matches!(
            parse_id("12345", "Invalid drill ID format"),
            Err(AppError::InvalidInput(ref m)) if m == "Invalid drill ID format"
        ));
    }
}
