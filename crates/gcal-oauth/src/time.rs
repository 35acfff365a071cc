//! Local datetime parsing for search bounds and event times.
//!
//! The calendar API expects RFC 3339 with an offset. Callers supply local
//! datetimes in a handful of common shapes; this module normalizes them.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{ServiceError, ServiceResult};

/// Accepted naive datetime layouts, tried in order.
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Converts a caller-supplied local datetime string to RFC 3339 with offset.
///
/// Accepts RFC 3339 input unchanged in meaning (re-serialized), naive
/// datetimes (`2024-03-15 10:00:00` or `2024-03-15T10:00:00`) interpreted in
/// the local timezone, and bare dates taken as local midnight.
pub fn to_rfc3339(input: &str) -> ServiceResult<String> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Ok(datetime.to_rfc3339());
    }

    let naive = parse_naive(input)?;
    let local = Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| {
            ServiceError::bad_request(format!("datetime does not exist locally: {input}"))
        })?;

    Ok(local.to_rfc3339())
}

fn parse_naive(input: &str) -> ServiceResult<NaiveDateTime> {
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Ok(naive);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        // Bare date: local midnight.
        return Ok(date.and_hms_opt(0, 0, 0).unwrap());
    }

    Err(ServiceError::bad_request(format!(
        "unrecognized datetime: {input}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceErrorCode;
    use chrono::Timelike;

    #[test]
    fn rfc3339_passthrough() {
        let out = to_rfc3339("2024-03-15T10:00:00+09:00").unwrap();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        assert_eq!(parsed.hour(), 10);
        assert_eq!(parsed.offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn naive_datetime_gets_local_offset() {
        let out = to_rfc3339("2024-03-15 10:30:00").unwrap();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        // The wall-clock reading survives; the offset is the local one.
        assert_eq!(parsed.naive_local().to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn t_separated_datetime() {
        let out = to_rfc3339("2024-03-15T10:30:00").unwrap();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2024-03-15 10:30:00");
    }

    #[test]
    fn bare_date_is_local_midnight() {
        let out = to_rfc3339("2024-03-15").unwrap();
        let parsed = DateTime::parse_from_rfc3339(&out).unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2024-03-15 00:00:00");
    }

    #[test]
    fn garbage_is_rejected() {
        let err = to_rfc3339("next tuesday").unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::BadRequest);
    }
}
