//! Remote forge API client
//!
//! The rest of the crate talks to the remote API through the
//! [`RemoteClient`] trait so that fetch, sync and mutation logic can be
//! exercised against a fake in tests. The real implementation lives in
//! [`github`].

pub mod error;
pub mod github;
pub mod types;

pub use error::RemoteError;
pub use github::GithubClient;
pub use types::{
    AuditEvent, RemoteCollaborator, RemoteRepo, RemoteTeam, RemoteTeamMember, RemoteUser,
    RepoPermission, TokenPermissions,
};

use async_trait::async_trait;

/// Opaque position in a paginated listing: either an offset page number
/// or a server-issued cursor. Cursor listings start from
/// [`PageToken::start_cursor`] (an empty cursor meaning "no position
/// yet").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    Number(u32),
    Cursor(String),
}

impl PageToken {
    pub fn first_page() -> Self {
        PageToken::Number(1)
    }

    pub fn start_cursor() -> Self {
        PageToken::Cursor(String::new())
    }
}

/// One page of a remote listing plus the token for the next page, if the
/// server reported one.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<PageToken>,
}

/// Operations the core consumes from the remote forge. List operations
/// return one page at a time; mutations are single calls that either
/// succeed or surface the remote failure verbatim.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn list_members(&self, token: &PageToken, per_page: u32)
    -> Result<Page<RemoteUser>, RemoteError>;

    async fn get_user(&self, login: &str) -> Result<RemoteUser, RemoteError>;

    async fn list_teams(&self, token: &PageToken, per_page: u32)
    -> Result<Page<RemoteTeam>, RemoteError>;

    async fn list_repos(&self, token: &PageToken, per_page: u32)
    -> Result<Page<RemoteRepo>, RemoteError>;

    async fn list_team_members(
        &self,
        slug: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteTeamMember>, RemoteError>;

    async fn list_repo_collaborators(
        &self,
        repo: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteCollaborator>, RemoteError>;

    async fn list_repo_teams(
        &self,
        repo: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteTeam>, RemoteError>;

    async fn list_outside_collaborators(
        &self,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<RemoteUser>, RemoteError>;

    async fn search_audit_log(
        &self,
        phrase: &str,
        token: &PageToken,
        per_page: u32,
    ) -> Result<Page<AuditEvent>, RemoteError>;

    /// Who-am-I call; scope and rate-limit metadata come from the
    /// response headers.
    async fn token_permissions(&self) -> Result<TokenPermissions, RemoteError>;

    async fn delete_team(&self, slug: &str) -> Result<(), RemoteError>;

    async fn remove_org_member(&self, login: &str) -> Result<(), RemoteError>;

    async fn add_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError>;

    async fn remove_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError>;

    async fn add_outside_collaborator(
        &self,
        repo: &str,
        login: &str,
        permission: RepoPermission,
    ) -> Result<(), RemoteError>;

    async fn remove_outside_collaborator(&self, repo: &str, login: &str)
    -> Result<(), RemoteError>;

    async fn remove_repo_collaborator(&self, repo: &str, login: &str) -> Result<(), RemoteError>;
}
