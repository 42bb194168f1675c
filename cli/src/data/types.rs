//! Row types for the local cache
//!
//! Remote entities are the source of truth; these rows are the cached
//! snapshot from the last successful sync. Timestamps are unix seconds.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub remote_created_at: Option<i64>,
    pub remote_updated_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TeamRow {
    pub id: i64,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub privacy: Option<String>,
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RepoRow {
    pub id: i64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub language: Option<String>,
    pub size: i64,
    pub stargazers: i64,
    pub watchers: i64,
    pub forks: i64,
    pub remote_created_at: Option<i64>,
    pub remote_updated_at: Option<i64>,
    pub remote_pushed_at: Option<i64>,
}

/// One team membership. Slug and login are denormalized so queries do not
/// need to join back to `teams`/`users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TeamMembershipRow {
    pub team_id: i64,
    pub user_id: i64,
    pub team_slug: String,
    pub user_login: String,
    pub role: String,
    pub remote_created_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RepoCollaboratorRow {
    pub repo_name: String,
    pub user_login: String,
    pub permission: Option<String>,
}

/// Org-level outside collaborator, wholesale-replaced on sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OutsideCollaboratorRow {
    pub id: i64,
    pub login: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct RepoTeamGrantRow {
    pub repo_name: String,
    pub team_slug: String,
    pub permission: Option<String>,
}

/// Most recent credential snapshot; at most one logical row is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct TokenPermissionRow {
    pub login: String,
    /// Comma-separated scope list as reported by the who-am-I headers
    pub scopes: String,
    pub rate_limit: i64,
    pub rate_remaining: i64,
    pub rate_reset: i64,
    pub fetched_at: i64,
}
