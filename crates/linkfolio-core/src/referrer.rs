/// Grouping label for visits that arrived without a referrer.
pub const DIRECT_REFERRER: &str = "Directo";

/// Label a referrer for top-N grouping.
///
/// The referrer string is the key as recorded (surrounding whitespace
/// trimmed); distinct strings are distinct groups even when they share a
/// host. Absent or blank referrers group under [`DIRECT_REFERRER`].
pub fn referrer_label(referrer: Option<&str>) -> String {
    referrer
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DIRECT_REFERRER)
        .to_string()
}
