//! Audit-log search phrase construction
//!
//! Builds the search expression sent to the remote audit-log endpoint from
//! actor / repo / created-window inputs. The phrase is the only externally
//! observable data shape this module defines; paging through results is the
//! fetch engine's job.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;

use super::ident::{self, IdentError};

/// Default lookback window when no `created` spec is supplied
const DEFAULT_LOOKBACK_DAYS: i64 = 30;

const DATE_FMT: &str = "%Y-%m-%d";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("--user is required")]
    ActorRequired,

    #[error("--repo requires an organization to be configured")]
    OrgRequired,

    #[error("invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("reversed range: '{end}' is before '{start}'")]
    ReversedRange { start: String, end: String },

    #[error("unrecognized created spec '{value}'")]
    BadShape { value: String },

    #[error(transparent)]
    Ident(#[from] IdentError),
}

fn parse_date(s: &str) -> Result<NaiveDate, AuditError> {
    NaiveDate::parse_from_str(s, DATE_FMT).map_err(|_| AuditError::InvalidDate {
        value: s.to_string(),
    })
}

/// Build the `created:` clause from one of the four accepted shapes:
/// empty (30-day UTC default), a single date, a `>=`/`<=` comparison, or
/// an inclusive `start..end` range. A literal `created:` prefix supplied
/// by the caller is stripped before matching.
pub fn build_created_clause(spec: &str, now: DateTime<Utc>) -> Result<String, AuditError> {
    let spec = spec.trim();
    let spec = spec.strip_prefix("created:").unwrap_or(spec).trim();

    if spec.is_empty() {
        let since = (now - Duration::days(DEFAULT_LOOKBACK_DAYS)).date_naive();
        return Ok(format!("created:>={}", since.format(DATE_FMT)));
    }

    if let Some(rest) = spec.strip_prefix(">=") {
        let d = parse_date(rest)?;
        return Ok(format!("created:>={}", d.format(DATE_FMT)));
    }
    if let Some(rest) = spec.strip_prefix("<=") {
        let d = parse_date(rest)?;
        return Ok(format!("created:<={}", d.format(DATE_FMT)));
    }

    if let Some((start, end)) = spec.split_once("..") {
        let s = parse_date(start)?;
        let e = parse_date(end)?;
        if e < s {
            return Err(AuditError::ReversedRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        return Ok(format!(
            "created:{}..{}",
            s.format(DATE_FMT),
            e.format(DATE_FMT)
        ));
    }

    if spec.contains(|c: char| !c.is_ascii_digit() && c != '-') {
        return Err(AuditError::BadShape {
            value: spec.to_string(),
        });
    }

    let d = parse_date(spec)?;
    Ok(format!("created:{}", d.format(DATE_FMT)))
}

/// Build the full search phrase: `actor:{actor} [repo:{org}/{repo}]
/// created:{clause}`, in that fixed order.
pub fn build_phrase(
    org: &str,
    actor: Option<&str>,
    repo: Option<&str>,
    created_spec: &str,
    now: DateTime<Utc>,
) -> Result<String, AuditError> {
    let actor = actor.filter(|a| !a.trim().is_empty()).ok_or(AuditError::ActorRequired)?;
    let actor = ident::validate_user_login(actor)?;

    let mut parts = vec![format!("actor:{actor}")];

    if let Some(repo) = repo.filter(|r| !r.trim().is_empty()) {
        if org.trim().is_empty() {
            return Err(AuditError::OrgRequired);
        }
        let repo = ident::validate_repo_name(repo)?;
        parts.push(format!("repo:{org}/{repo}"));
    }

    parts.push(build_created_clause(created_spec, now)?);
    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_window_is_thirty_days_utc() {
        let clause = build_created_clause("", at(2026, 1, 14)).unwrap();
        assert_eq!(clause, "created:>=2025-12-15");
    }

    #[test]
    fn test_single_date() {
        let clause = build_created_clause("2025-01-02", at(2026, 1, 14)).unwrap();
        assert_eq!(clause, "created:2025-01-02");
    }

    #[test]
    fn test_comparisons() {
        let now = at(2026, 1, 14);
        assert_eq!(
            build_created_clause(">=2025-06-01", now).unwrap(),
            "created:>=2025-06-01"
        );
        assert_eq!(
            build_created_clause("<=2025-06-01", now).unwrap(),
            "created:<=2025-06-01"
        );
    }

    #[test]
    fn test_range() {
        let now = at(2026, 1, 14);
        assert_eq!(
            build_created_clause("2025-01-01..2025-01-31", now).unwrap(),
            "created:2025-01-01..2025-01-31"
        );
        assert_eq!(
            build_created_clause("2025-02-01..2025-01-01", now),
            Err(AuditError::ReversedRange {
                start: "2025-02-01".to_string(),
                end: "2025-01-01".to_string(),
            })
        );
    }

    #[test]
    fn test_invalid_calendar_date() {
        let now = at(2026, 1, 14);
        assert!(matches!(
            build_created_clause("2025-13-01", now),
            Err(AuditError::InvalidDate { .. })
        ));
        assert!(matches!(
            build_created_clause("2025-02-30", now),
            Err(AuditError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_created_prefix_is_stripped() {
        let clause = build_created_clause("created:2025-01-02", at(2026, 1, 14)).unwrap();
        assert_eq!(clause, "created:2025-01-02");
    }

    #[test]
    fn test_bad_shape() {
        assert!(matches!(
            build_created_clause("yesterday", at(2026, 1, 14)),
            Err(AuditError::BadShape { .. })
        ));
    }

    #[test]
    fn test_full_phrase() {
        let phrase = build_phrase(
            "acme",
            Some("octocat"),
            Some("repo-one"),
            "2025-01-02",
            at(2026, 1, 14),
        )
        .unwrap();
        assert_eq!(phrase, "actor:octocat repo:acme/repo-one created:2025-01-02");
    }

    #[test]
    fn test_phrase_without_repo() {
        let phrase = build_phrase("acme", Some("octocat"), None, "", at(2026, 1, 14)).unwrap();
        assert_eq!(phrase, "actor:octocat created:>=2025-12-15");
    }

    #[test]
    fn test_actor_is_mandatory() {
        assert_eq!(
            build_phrase("acme", None, None, "", at(2026, 1, 14)),
            Err(AuditError::ActorRequired)
        );
        assert_eq!(
            build_phrase("acme", Some("  "), None, "", at(2026, 1, 14)),
            Err(AuditError::ActorRequired)
        );
    }

    #[test]
    fn test_repo_requires_org() {
        assert_eq!(
            build_phrase("", Some("octocat"), Some("repo-one"), "", at(2026, 1, 14)),
            Err(AuditError::OrgRequired)
        );
    }
}
