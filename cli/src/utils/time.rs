//! Time parsing helpers

use chrono::DateTime;

/// Parse an RFC 3339 timestamp into unix seconds. Remote timestamps that
/// fail to parse are treated as absent rather than aborting a sync.
pub fn rfc3339_secs(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s).ok().map(|d| d.timestamp())
}

/// [`rfc3339_secs`] over an optional field
pub fn opt_rfc3339_secs(s: Option<&str>) -> Option<i64> {
    s.and_then(rfc3339_secs)
}
