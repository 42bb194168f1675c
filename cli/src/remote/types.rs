//! Wire types for the remote forge API

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// A user as returned by the remote API. Membership listings only carry
/// `id` and `login`; the per-user detail endpoint fills in the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteUser {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTeam {
    pub id: i64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Option<String>,
    #[serde(default)]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteRepo {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub stargazers_count: i64,
    #[serde(default)]
    pub watchers_count: i64,
    #[serde(default)]
    pub forks_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTeamMember {
    pub id: i64,
    pub login: String,
    #[serde(default = "default_member_role")]
    pub role: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_member_role() -> String {
    "member".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteCollaborator {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub role_name: Option<String>,
}

/// One audit-log event. Servers attach arbitrary extra fields depending
/// on the action; those are preserved opaquely.
#[derive(Debug, Clone, Deserialize, serde::Serialize)]
pub struct AuditEvent {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    /// Milliseconds since the epoch, as the audit endpoint reports it.
    #[serde(default, rename = "created_at")]
    pub created_at_ms: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Scope and rate-limit metadata read off the who-am-I response headers.
#[derive(Debug, Clone)]
pub struct TokenPermissions {
    pub login: String,
    pub scopes: Vec<String>,
    pub rate_limit: i64,
    pub rate_remaining: i64,
    pub rate_reset: i64,
}

/// Repository permission level for collaborator invitations.
///
/// `read` and `write` are accepted as aliases for `pull` and `push`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RepoPermission {
    #[default]
    Pull,
    Push,
    Admin,
}

impl RepoPermission {
    pub const fn as_str(&self) -> &'static str {
        match self {
            RepoPermission::Pull => "pull",
            RepoPermission::Push => "push",
            RepoPermission::Admin => "admin",
        }
    }
}

impl fmt::Display for RepoPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoPermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pull" | "read" => Ok(RepoPermission::Pull),
            "push" | "write" => Ok(RepoPermission::Push),
            "admin" => Ok(RepoPermission::Admin),
            other => Err(format!(
                "unknown permission '{other}': expected pull, push, admin, read or write"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_aliases() {
        assert_eq!("read".parse::<RepoPermission>(), Ok(RepoPermission::Pull));
        assert_eq!("write".parse::<RepoPermission>(), Ok(RepoPermission::Push));
        assert_eq!("pull".parse::<RepoPermission>(), Ok(RepoPermission::Pull));
        assert_eq!("push".parse::<RepoPermission>(), Ok(RepoPermission::Push));
        assert_eq!("admin".parse::<RepoPermission>(), Ok(RepoPermission::Admin));
        assert!("owner".parse::<RepoPermission>().is_err());
    }

    #[test]
    fn test_member_role_defaults() {
        let m: RemoteTeamMember = serde_json::from_str(r#"{"id":1,"login":"octocat"}"#).unwrap();
        assert_eq!(m.role, "member");
    }

    #[test]
    fn test_audit_event_preserves_extra_fields() {
        let e: AuditEvent = serde_json::from_str(
            r#"{"action":"team.remove_member","actor":"octocat","created_at":1700000000000,"team":"good-team"}"#,
        )
        .unwrap();
        assert_eq!(e.action.as_deref(), Some("team.remove_member"));
        assert_eq!(e.created_at_ms, Some(1700000000000));
        assert_eq!(e.extra.get("team").and_then(|v| v.as_str()), Some("good-team"));
    }
}
