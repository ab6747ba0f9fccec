pub mod clicks;
pub mod views;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Timestamp layout read back from `CAST(ts AS VARCHAR)`.
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Bind format. DuckDB `TIMESTAMP` holds microseconds.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Parse a `CAST(ts AS VARCHAR)` value back into UTC.
///
/// DuckDB omits the fractional part when it is zero, which `%.f` accepts.
pub(crate) fn parse_ts(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), TS_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_ts_accepts_duckdb_varchar_output() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(parse_ts("2024-01-02 03:04:05"), Some(expected));
        assert_eq!(
            parse_ts("2024-01-02 03:04:05.250"),
            Some(expected + chrono::Duration::milliseconds(250))
        );
        assert_eq!(parse_ts("yesterday"), None);
    }

    #[test]
    fn format_then_parse_is_lossless_to_microseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(parse_ts(&format_ts(ts)), Some(ts));
    }
}
