//! Object metadata to HTTP header mapping, and HTTP date handling.
//!
//! Only a fixed set of metadata fields is ever relayed to clients:
//!
//! | Metadata | Header | Emitted when |
//! |----------|--------|--------------|
//! | `cache_control` | `Cache-Control` | non-empty |
//! | `expires` | `Expires` | non-empty |
//! | `content_disposition` | `Content-Disposition` | non-empty |
//! | `content_encoding` | `Content-Encoding` | non-empty |
//! | `content_language` | `Content-Language` | non-empty |
//! | `content_length` | `Content-Length` | `> 0` |
//! | `content_range` | `Content-Range` | non-empty |
//! | `last_modified` | `Last-Modified` | not [`UNSET_TIMESTAMP`] |
//!
//! `content_type` is never relayed.

use chrono::{DateTime, NaiveDateTime, Utc};
use http::header::{self, HeaderName, HeaderValue};
use s3proxy_core::{ObjectMetadata, UNSET_TIMESTAMP};

/// IMF-fixdate, the preferred HTTP date format (`Sun, 06 Nov 1994 08:49:37 GMT`).
pub const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// IMF-fixdate after the weekday (`06 Nov 1994 08:49:37 GMT`).
const IMF_FIXDATE_BODY: &str = "%d %b %Y %H:%M:%S GMT";

/// Obsolete RFC 850 date after the weekday (`06-Nov-94 08:49:37 GMT`).
const RFC850_DATE_BODY: &str = "%d-%b-%y %H:%M:%S GMT";

/// ANSI C `asctime()` date after the weekday (`Nov  6 08:49:37 1994`).
const ASCTIME_DATE_BODY: &str = "%b %e %H:%M:%S %Y";

/// Format a timestamp as an IMF-fixdate in UTC.
#[must_use]
pub fn format_http_date(value: &DateTime<Utc>) -> String {
    value.format(HTTP_DATE_FORMAT).to_string()
}

/// Parse an HTTP date in any of the three formats HTTP/1.1 recipients accept.
///
/// The weekday name is required but not checked against the date, so
/// `Mon, 06 Nov 1994 08:49:37 GMT` parses as the 6th. Returns `None` for
/// anything else.
#[must_use]
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let (body, formats): (&str, &[&str]) = if let Some((weekday, rest)) = value.split_once(", ")
    {
        if !is_weekday_name(weekday) {
            return None;
        }
        (rest, &[IMF_FIXDATE_BODY, RFC850_DATE_BODY])
    } else {
        let (weekday, rest) = value.split_once(' ')?;
        if !is_weekday_name(weekday) {
            return None;
        }
        (rest, &[ASCTIME_DATE_BODY])
    };

    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(body, format).ok())
        .map(|naive| naive.and_utc())
}

/// Check for a short (`Sun`) or long (`Sunday`) English weekday name.
fn is_weekday_name(value: &str) -> bool {
    const DAYS: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    DAYS.iter().any(|day| value == *day || value == &day[..3])
}

/// Set a string header if the value is present, non-empty, and a valid header value.
fn set_string_header(
    builder: http::response::Builder,
    name: HeaderName,
    value: Option<&str>,
) -> http::response::Builder {
    if let Some(v) = value.filter(|v| !v.is_empty()) {
        if let Ok(hv) = HeaderValue::from_str(v) {
            return builder.header(name, hv);
        }
    }
    builder
}

/// Set a length header if the value is present and positive.
fn set_length_header(
    builder: http::response::Builder,
    name: HeaderName,
    value: Option<i64>,
) -> http::response::Builder {
    match value {
        Some(v) if v > 0 => builder.header(name, v),
        _ => builder,
    }
}

/// Set an HTTP date header unless the value is absent or the unset sentinel.
fn set_timestamp_header(
    builder: http::response::Builder,
    name: HeaderName,
    value: Option<&DateTime<Utc>>,
) -> http::response::Builder {
    match value {
        Some(v) if *v != UNSET_TIMESTAMP => builder.header(name, format_http_date(v)),
        _ => builder,
    }
}

/// Apply the relayed subset of object metadata to a response builder.
#[must_use]
pub fn set_object_metadata_headers(
    mut builder: http::response::Builder,
    metadata: &ObjectMetadata,
) -> http::response::Builder {
    builder = set_string_header(
        builder,
        header::CACHE_CONTROL,
        metadata.cache_control.as_deref(),
    );
    builder = set_string_header(builder, header::EXPIRES, metadata.expires.as_deref());
    builder = set_string_header(
        builder,
        header::CONTENT_DISPOSITION,
        metadata.content_disposition.as_deref(),
    );
    builder = set_string_header(
        builder,
        header::CONTENT_ENCODING,
        metadata.content_encoding.as_deref(),
    );
    builder = set_string_header(
        builder,
        header::CONTENT_LANGUAGE,
        metadata.content_language.as_deref(),
    );
    builder = set_length_header(builder, header::CONTENT_LENGTH, metadata.content_length);
    builder = set_string_header(
        builder,
        header::CONTENT_RANGE,
        metadata.content_range.as_deref(),
    );
    builder = set_timestamp_header(
        builder,
        header::LAST_MODIFIED,
        metadata.last_modified.as_ref(),
    );
    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_for(metadata: &ObjectMetadata) -> http::HeaderMap {
        let builder = set_object_metadata_headers(http::Response::builder(), metadata);
        builder
            .body(())
            .expect("valid response")
            .headers()
            .clone()
    }

    fn header_str<'a>(headers: &'a http::HeaderMap, name: HeaderName) -> Option<&'a str> {
        headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn test_should_emit_all_present_string_headers() {
        let metadata = ObjectMetadata {
            cache_control: Some("max-age=300".to_owned()),
            expires: Some("Thu, 01 Dec 2033 16:00:00 GMT".to_owned()),
            content_disposition: Some("attachment; filename=\"a.txt\"".to_owned()),
            content_encoding: Some("gzip".to_owned()),
            content_language: Some("en-US".to_owned()),
            content_range: Some("bytes 0-9/100".to_owned()),
            ..Default::default()
        };
        let headers = headers_for(&metadata);

        assert_eq!(header_str(&headers, header::CACHE_CONTROL), Some("max-age=300"));
        assert_eq!(
            header_str(&headers, header::EXPIRES),
            Some("Thu, 01 Dec 2033 16:00:00 GMT")
        );
        assert_eq!(
            header_str(&headers, header::CONTENT_DISPOSITION),
            Some("attachment; filename=\"a.txt\"")
        );
        assert_eq!(header_str(&headers, header::CONTENT_ENCODING), Some("gzip"));
        assert_eq!(header_str(&headers, header::CONTENT_LANGUAGE), Some("en-US"));
        assert_eq!(
            header_str(&headers, header::CONTENT_RANGE),
            Some("bytes 0-9/100")
        );
        assert_eq!(headers.len(), 6);
    }

    #[test]
    fn test_should_omit_absent_and_empty_values() {
        let metadata = ObjectMetadata {
            cache_control: Some(String::new()),
            expires: None,
            content_encoding: Some(String::new()),
            ..Default::default()
        };
        assert!(headers_for(&metadata).is_empty());
    }

    #[test]
    fn test_should_emit_content_length_only_when_positive() {
        let zero = ObjectMetadata {
            content_length: Some(0),
            ..Default::default()
        };
        assert!(headers_for(&zero).get(header::CONTENT_LENGTH).is_none());

        let negative = ObjectMetadata {
            content_length: Some(-1),
            ..Default::default()
        };
        assert!(headers_for(&negative).get(header::CONTENT_LENGTH).is_none());

        let sized = ObjectMetadata {
            content_length: Some(1024),
            ..Default::default()
        };
        assert_eq!(
            header_str(&headers_for(&sized), header::CONTENT_LENGTH),
            Some("1024")
        );
    }

    #[test]
    fn test_should_omit_last_modified_sentinel() {
        let metadata = ObjectMetadata {
            last_modified: Some(UNSET_TIMESTAMP),
            ..Default::default()
        };
        assert!(headers_for(&metadata).get(header::LAST_MODIFIED).is_none());
    }

    #[test]
    fn test_should_format_last_modified_as_http_date() {
        let metadata = ObjectMetadata {
            last_modified: DateTime::from_timestamp(784_111_777, 0),
            ..Default::default()
        };
        assert_eq!(
            header_str(&headers_for(&metadata), header::LAST_MODIFIED),
            Some("Sun, 06 Nov 1994 08:49:37 GMT")
        );
    }

    #[test]
    fn test_should_never_emit_content_type() {
        let metadata = ObjectMetadata {
            content_type: Some("text/html; charset=utf-8".to_owned()),
            content_length: Some(10),
            ..Default::default()
        };
        let headers = headers_for(&metadata);
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_should_skip_invalid_header_values() {
        let metadata = ObjectMetadata {
            content_disposition: Some("inline\r\nX-Injected: 1".to_owned()),
            ..Default::default()
        };
        assert!(headers_for(&metadata).is_empty());
    }

    #[test]
    fn test_should_parse_all_http_date_formats() {
        let expected = DateTime::from_timestamp(784_111_777, 0);
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), expected);
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), expected);
        assert_eq!(parse_http_date("Sun Nov  6 08:49:37 1994"), expected);
    }

    #[test]
    fn test_should_ignore_mismatched_weekday() {
        let expected = DateTime::from_timestamp(784_111_777, 0);
        assert_eq!(parse_http_date("Mon, 06 Nov 1994 08:49:37 GMT"), expected);
        assert_eq!(parse_http_date("Monday, 06-Nov-94 08:49:37 GMT"), expected);
        assert_eq!(parse_http_date("Mon Nov  6 08:49:37 1994"), expected);
    }

    #[test]
    fn test_should_reject_unknown_weekday_names() {
        assert!(parse_http_date("Xyz, 06 Nov 1994 08:49:37 GMT").is_none());
        assert!(parse_http_date("06 Nov 1994 08:49:37 GMT").is_none());
    }

    #[test]
    fn test_should_reject_unparseable_dates() {
        assert!(parse_http_date("").is_none());
        assert!(parse_http_date("yesterday").is_none());
        assert!(parse_http_date("2024-01-15T10:30:00Z").is_none());
        assert!(parse_http_date("Sun, 06 Nov 1994 08:49:37 PST").is_none());
    }

    #[test]
    fn test_should_round_trip_http_date() {
        let value = DateTime::from_timestamp(1_700_000_000, 0).expect("valid");
        assert_eq!(parse_http_date(&format_http_date(&value)), Some(value));
    }
}
