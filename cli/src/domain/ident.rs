//! Identifier grammar validation
//!
//! Every resource name that reaches the remote API or a local query goes
//! through these checks first. Validators trim surrounding whitespace but
//! never case-fold or otherwise rewrite the input; a value that fails its
//! grammar is rejected with the specific rule that was violated.

use thiserror::Error;

/// Maximum length of a user login
const MAX_LOGIN_LEN: usize = 39;

/// Maximum length of a team slug or repository name
const MAX_SLUG_LEN: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentError {
    #[error("{what} is empty")]
    Empty { what: &'static str },

    #[error("{what} '{value}' exceeds {max} characters")]
    TooLong {
        what: &'static str,
        value: String,
        max: usize,
    },

    #[error("{what} '{value}' contains invalid character '{ch}'")]
    InvalidChar {
        what: &'static str,
        value: String,
        ch: char,
    },

    #[error("{what} '{value}' must not start or end with a hyphen")]
    BoundaryHyphen { what: &'static str, value: String },

    #[error("'{value}' must contain exactly one '/' separator")]
    MalformedPair { value: String },

    #[error("'{value}' must end with '/{expected}'")]
    WrongSuffix {
        value: String,
        expected: &'static str,
    },
}

fn check(
    what: &'static str,
    value: &str,
    max: usize,
    valid_char: impl Fn(char) -> bool,
    boundary_hyphen_ok: (bool, bool),
) -> Result<(), IdentError> {
    if value.is_empty() {
        return Err(IdentError::Empty { what });
    }
    if value.len() > max {
        return Err(IdentError::TooLong {
            what,
            value: value.to_string(),
            max,
        });
    }
    if let Some(ch) = value.chars().find(|&c| !valid_char(c)) {
        return Err(IdentError::InvalidChar {
            what,
            value: value.to_string(),
            ch,
        });
    }
    let (start_ok, end_ok) = boundary_hyphen_ok;
    if (!start_ok && value.starts_with('-')) || (!end_ok && value.ends_with('-')) {
        return Err(IdentError::BoundaryHyphen {
            what,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Validate a user login: 1-39 chars, alphanumeric plus hyphen, no
/// leading or trailing hyphen.
pub fn validate_user_login(s: &str) -> Result<&str, IdentError> {
    let s = s.trim();
    check(
        "user login",
        s,
        MAX_LOGIN_LEN,
        |c| c.is_ascii_alphanumeric() || c == '-',
        (false, false),
    )?;
    Ok(s)
}

/// Validate a team slug: 1-100 chars, lowercase alphanumeric plus hyphen,
/// no leading or trailing hyphen. The slug is the only team identifier
/// accepted by mutating operations, never the display name.
pub fn validate_team_slug(s: &str) -> Result<&str, IdentError> {
    let s = s.trim();
    check(
        "team slug",
        s,
        MAX_SLUG_LEN,
        |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-',
        (false, false),
    )?;
    Ok(s)
}

/// Validate a repository name: 1-100 chars, alphanumeric, underscore and
/// hyphen (no dot), must not start with a hyphen.
pub fn validate_repo_name(s: &str) -> Result<&str, IdentError> {
    let s = s.trim();
    check(
        "repository name",
        s,
        MAX_SLUG_LEN,
        |c| c.is_ascii_alphanumeric() || c == '_' || c == '-',
        (false, true),
    )?;
    Ok(s)
}

fn split_pair(s: &str) -> Result<(&str, &str), IdentError> {
    let s = s.trim();
    let mut parts = s.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(left), Some(right), None) => Ok((left, right)),
        _ => Err(IdentError::MalformedPair {
            value: s.to_string(),
        }),
    }
}

/// Parse a `team-slug/user-login` pair. Both halves must pass their own
/// grammar; zero or more than one `/` is rejected.
pub fn parse_team_user_pair(s: &str) -> Result<(&str, &str), IdentError> {
    let (team, user) = split_pair(s)?;
    Ok((validate_team_slug(team)?, validate_user_login(user)?))
}

/// Parse a `repo-name/user-login` pair.
pub fn parse_repo_user_pair(s: &str) -> Result<(&str, &str), IdentError> {
    let (repo, user) = split_pair(s)?;
    Ok((validate_repo_name(repo)?, validate_user_login(user)?))
}

/// Parse the `{slug}/users` suffix form used by the fetch-target
/// dispatcher. The right-hand segment must be the literal `users`.
pub fn parse_team_users_path(s: &str) -> Result<&str, IdentError> {
    let (team, suffix) = split_pair(s)?;
    if suffix != "users" {
        return Err(IdentError::WrongSuffix {
            value: s.trim().to_string(),
            expected: "users",
        });
    }
    validate_team_slug(team)
}

/// Parse a `{repo}/<suffix>` fetch-target path (`collaborators` or
/// `teams`). Same splitting discipline as [`parse_team_users_path`].
pub fn parse_repo_scope_path<'a>(s: &'a str, expected: &'static str) -> Result<&'a str, IdentError> {
    let (repo, suffix) = split_pair(s)?;
    if suffix != expected {
        return Err(IdentError::WrongSuffix {
            value: s.trim().to_string(),
            expected,
        });
    }
    validate_repo_name(repo)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_login_boundary_lengths() {
        assert_eq!(validate_user_login("a"), Ok("a"));
        let max = "a".repeat(39);
        assert_eq!(validate_user_login(&max), Ok(max.as_str()));
        let over = "a".repeat(40);
        assert!(matches!(
            validate_user_login(&over),
            Err(IdentError::TooLong { max: 39, .. })
        ));
    }

    #[test]
    fn test_user_login_charset_and_boundaries() {
        assert!(validate_user_login("octocat").is_ok());
        assert!(validate_user_login("Octo-Cat9").is_ok());
        assert!(matches!(
            validate_user_login("-octocat"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
        assert!(matches!(
            validate_user_login("octocat-"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
        assert!(matches!(
            validate_user_login("octo cat"),
            Err(IdentError::InvalidChar { ch: ' ', .. })
        ));
        assert!(matches!(
            validate_user_login("octo_cat"),
            Err(IdentError::InvalidChar { ch: '_', .. })
        ));
        assert!(matches!(
            validate_user_login(""),
            Err(IdentError::Empty { .. })
        ));
    }

    #[test]
    fn test_user_login_trims_surrounding_whitespace_only() {
        assert_eq!(validate_user_login("  octocat "), Ok("octocat"));
    }

    #[test]
    fn test_team_slug_rules() {
        assert!(validate_team_slug("good-team").is_ok());
        assert!(validate_team_slug("t").is_ok());
        let max = "a".repeat(100);
        assert!(validate_team_slug(&max).is_ok());
        let over = "a".repeat(101);
        assert!(matches!(
            validate_team_slug(&over),
            Err(IdentError::TooLong { max: 100, .. })
        ));
        // No case-folding: uppercase is rejected, not normalized.
        assert!(matches!(
            validate_team_slug("Team"),
            Err(IdentError::InvalidChar { ch: 'T', .. })
        ));
        assert!(matches!(
            validate_team_slug("-abc"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
        assert!(matches!(
            validate_team_slug("abc-"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
    }

    #[test]
    fn test_repo_name_rules() {
        assert!(validate_repo_name("repo_one").is_ok());
        assert!(validate_repo_name("Repo-2").is_ok());
        // Trailing hyphen is allowed for repos, leading is not.
        assert!(validate_repo_name("repo-").is_ok());
        assert!(matches!(
            validate_repo_name("-repo"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
        assert!(matches!(
            validate_repo_name("repo.git"),
            Err(IdentError::InvalidChar { ch: '.', .. })
        ));
    }

    #[test]
    fn test_parse_team_user_pair() {
        assert_eq!(
            parse_team_user_pair("good-team/user-ok"),
            Ok(("good-team", "user-ok"))
        );
        assert!(matches!(
            parse_team_user_pair("no-slash"),
            Err(IdentError::MalformedPair { .. })
        ));
        assert!(matches!(
            parse_team_user_pair("team/slug/users"),
            Err(IdentError::MalformedPair { .. })
        ));
        assert!(matches!(
            parse_team_user_pair("-team/user"),
            Err(IdentError::BoundaryHyphen { .. })
        ));
    }

    #[test]
    fn test_parse_repo_user_pair() {
        assert_eq!(
            parse_repo_user_pair("repo_one/octocat"),
            Ok(("repo_one", "octocat"))
        );
        assert!(matches!(
            parse_repo_user_pair("repo_one/octo.cat"),
            Err(IdentError::InvalidChar { .. })
        ));
    }

    #[test]
    fn test_parse_team_users_path() {
        assert_eq!(parse_team_users_path("good-team/users"), Ok("good-team"));
        assert!(matches!(
            parse_team_users_path("good-team/members"),
            Err(IdentError::WrongSuffix {
                expected: "users",
                ..
            })
        ));
        assert!(matches!(
            parse_team_users_path("users"),
            Err(IdentError::MalformedPair { .. })
        ));
    }

    #[test]
    fn test_parse_repo_scope_path() {
        assert_eq!(
            parse_repo_scope_path("repo_one/collaborators", "collaborators"),
            Ok("repo_one")
        );
        assert_eq!(parse_repo_scope_path("repo_one/teams", "teams"), Ok("repo_one"));
        assert!(matches!(
            parse_repo_scope_path("repo_one/users", "teams"),
            Err(IdentError::WrongSuffix { expected: "teams", .. })
        ));
    }
}
