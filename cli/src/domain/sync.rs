//! Cache reconciliation
//!
//! Wraps the fetch engine with "atomically replace the local slice"
//! semantics per resource kind. Whole collections are swapped in one
//! transaction; scoped resources (one team's members, one repository's
//! collaborators or team grants) delete only their own key's rows.
//! Aggregate variants iterate the cached parent keys and tolerate
//! per-key failures, reporting them explicitly at the end.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::data::sqlite::repositories::{collaborators, memberships, repos, teams, token, users};
use crate::data::sqlite::{SqliteError, SqlitePool};
use crate::data::types::{
    OutsideCollaboratorRow, RepoCollaboratorRow, RepoRow, RepoTeamGrantRow, TeamMembershipRow,
    TeamRow, TokenPermissionRow, UserRow,
};
use crate::remote::{
    PageToken, RemoteClient, RemoteCollaborator, RemoteRepo, RemoteTeam, RemoteTeamMember,
    RemoteUser,
};
use crate::utils::time::opt_rfc3339_secs;

use super::fetch::{self, FetchError, FetchFailure, FetchOptions};
use super::ident::{self, IdentError};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid identifier: {0}")]
    InvalidFormat(#[from] IdentError),

    #[error("unknown fetch target '{0}'")]
    UnknownTarget(String),

    #[error("fetching {kind}: {source}")]
    Fetch {
        kind: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("remote call for {kind}: {source}")]
    Remote {
        kind: &'static str,
        #[source]
        source: crate::remote::RemoteError,
    },

    #[error("storing {kind}: {source}")]
    Store {
        kind: &'static str,
        #[source]
        source: SqliteError,
    },

    #[error("{kind} sync cancelled")]
    Cancelled { kind: &'static str },

    #[error("{kind} '{key}' is not in the local cache; run a '{hint}' sync first")]
    MissingParent {
        kind: &'static str,
        key: String,
        hint: &'static str,
    },
}

/// A remote collection (or scoped slice of one) the dispatcher can
/// reconcile, parsed from the fetch-target literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    Users,
    DetailUsers,
    Teams,
    Repos,
    /// One team's members, or all cached teams' members when `None`
    TeamMembers(Option<String>),
    /// One repository's collaborators, or all cached repositories' when `None`
    RepoCollaborators(Option<String>),
    /// One repository's team grants, or all cached repositories' when `None`
    RepoTeams(Option<String>),
    OutsideCollaborators,
    TokenPermission,
}

impl FetchTarget {
    pub fn parse(s: &str) -> Result<Self, SyncError> {
        let s = s.trim();
        match s {
            "users" => Ok(Self::Users),
            "detail-users" => Ok(Self::DetailUsers),
            "teams" => Ok(Self::Teams),
            "repos" => Ok(Self::Repos),
            "team-users" => Ok(Self::TeamMembers(None)),
            "repo-users" => Ok(Self::RepoCollaborators(None)),
            "repo-teams" => Ok(Self::RepoTeams(None)),
            "outside-collaborators" => Ok(Self::OutsideCollaborators),
            "token" => Ok(Self::TokenPermission),
            other => match other.rsplit_once('/').map(|(_, suffix)| suffix) {
                Some("users") => {
                    let slug = ident::parse_team_users_path(other)?;
                    Ok(Self::TeamMembers(Some(slug.to_string())))
                }
                Some("collaborators") => {
                    let repo = ident::parse_repo_scope_path(other, "collaborators")?;
                    Ok(Self::RepoCollaborators(Some(repo.to_string())))
                }
                Some("teams") => {
                    let repo = ident::parse_repo_scope_path(other, "teams")?;
                    Ok(Self::RepoTeams(Some(repo.to_string())))
                }
                _ => Err(SyncError::UnknownTarget(other.to_string())),
            },
        }
    }
}

/// The three per-parent-key resources an aggregate sync iterates over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopedKind {
    TeamMembers,
    RepoCollaborators,
    RepoTeams,
}

impl ScopedKind {
    const fn name(self) -> &'static str {
        match self {
            ScopedKind::TeamMembers => "team-users",
            ScopedKind::RepoCollaborators => "repo-users",
            ScopedKind::RepoTeams => "repo-teams",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailedKey {
    pub key: String,
    pub error: String,
}

/// Result of one reconciliation pass.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SyncReport {
    Single {
        kind: &'static str,
        count: usize,
        stored: bool,
    },
    Aggregate {
        kind: &'static str,
        succeeded: usize,
        items: usize,
        failed: Vec<FailedKey>,
    },
}

pub struct SyncService {
    remote: Arc<dyn RemoteClient>,
    pool: SqlitePool,
    options: FetchOptions,
}

impl SyncService {
    pub fn new(remote: Arc<dyn RemoteClient>, pool: SqlitePool, options: FetchOptions) -> Self {
        Self {
            remote,
            pool,
            options,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Reconcile one fetch target. With `store: false` the remote data
    /// is fetched and counted but the cache is left untouched (no
    /// transaction is opened at all).
    pub async fn sync(
        &self,
        target: &FetchTarget,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let single = |kind, result: Result<usize, SyncError>| {
            result.map(|count| SyncReport::Single {
                kind,
                count,
                stored: store,
            })
        };

        match target {
            FetchTarget::Users => single("users", self.sync_users(store, cancel).await),
            FetchTarget::DetailUsers => {
                single("detail-users", self.sync_detail_users(store, cancel).await)
            }
            FetchTarget::Teams => single("teams", self.sync_teams(store, cancel).await),
            FetchTarget::Repos => single("repos", self.sync_repos(store, cancel).await),
            FetchTarget::TeamMembers(Some(slug)) => single(
                "team-users",
                self.sync_scoped(ScopedKind::TeamMembers, slug, store, cancel)
                    .await,
            ),
            FetchTarget::RepoCollaborators(Some(repo)) => single(
                "repo-users",
                self.sync_scoped(ScopedKind::RepoCollaborators, repo, store, cancel)
                    .await,
            ),
            FetchTarget::RepoTeams(Some(repo)) => single(
                "repo-teams",
                self.sync_scoped(ScopedKind::RepoTeams, repo, store, cancel)
                    .await,
            ),
            FetchTarget::TeamMembers(None) => {
                self.sync_aggregate(ScopedKind::TeamMembers, store, cancel)
                    .await
            }
            FetchTarget::RepoCollaborators(None) => {
                self.sync_aggregate(ScopedKind::RepoCollaborators, store, cancel)
                    .await
            }
            FetchTarget::RepoTeams(None) => {
                self.sync_aggregate(ScopedKind::RepoTeams, store, cancel)
                    .await
            }
            FetchTarget::OutsideCollaborators => single(
                "outside-collaborators",
                self.sync_outside_collaborators(store, cancel).await,
            ),
            FetchTarget::TokenPermission => {
                single("token", self.sync_token_permission(store).await)
            }
        }
    }

    async fn sync_users(
        &self,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_members(&t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("users", f))?;

        let rows: Vec<UserRow> = fetched.iter().map(user_row).collect();
        if store {
            users::replace_all(&self.pool, &rows)
                .await
                .map_err(|e| store_err("users", e))?;
        }
        Ok(rows.len())
    }

    /// Like `users`, but follows the listing with one detail request per
    /// login to fill in profile fields. The inter-page delay also
    /// throttles the per-login detail calls.
    async fn sync_detail_users(
        &self,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let members = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_members(&t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("detail-users", f))?;

        let mut rows = Vec::with_capacity(members.len());
        for member in &members {
            let detail = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled { kind: "detail-users" }),
                r = self.remote.get_user(&member.login) => r.map_err(|source| SyncError::Remote {
                    kind: "detail-users",
                    source,
                })?,
            };
            rows.push(user_row(&detail));
            tracing::debug!(fetched = rows.len(), total = members.len(), "detail fetch progress");
            tokio::time::sleep(self.options.page_delay).await;
        }

        if store {
            users::replace_all(&self.pool, &rows)
                .await
                .map_err(|e| store_err("detail-users", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_teams(
        &self,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_teams(&t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("teams", f))?;

        let rows: Vec<TeamRow> = fetched.iter().map(team_row).collect();
        if store {
            teams::replace_all(&self.pool, &rows)
                .await
                .map_err(|e| store_err("teams", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_repos(
        &self,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_repos(&t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("repos", f))?;

        let rows: Vec<RepoRow> = fetched.iter().map(repo_row).collect();
        if store {
            repos::replace_all(&self.pool, &rows)
                .await
                .map_err(|e| store_err("repos", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_outside_collaborators(
        &self,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_outside_collaborators(&t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("outside-collaborators", f))?;

        let rows: Vec<OutsideCollaboratorRow> = fetched
            .iter()
            .map(|u| OutsideCollaboratorRow {
                id: u.id,
                login: u.login.clone(),
            })
            .collect();
        if store {
            users::replace_outside(&self.pool, &rows)
                .await
                .map_err(|e| store_err("outside-collaborators", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_token_permission(&self, store: bool) -> Result<usize, SyncError> {
        let perms = self
            .remote
            .token_permissions()
            .await
            .map_err(|source| SyncError::Remote {
                kind: "token",
                source,
            })?;

        if store {
            let row = TokenPermissionRow {
                login: perms.login,
                scopes: perms.scopes.join(","),
                rate_limit: perms.rate_limit,
                rate_remaining: perms.rate_remaining,
                rate_reset: perms.rate_reset,
                fetched_at: chrono::Utc::now().timestamp(),
            };
            token::replace(&self.pool, &row)
                .await
                .map_err(|e| store_err("token", e))?;
        }
        Ok(1)
    }

    /// Sync one parent key's slice of a scoped resource.
    async fn sync_scoped(
        &self,
        kind: ScopedKind,
        key: &str,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        match kind {
            ScopedKind::TeamMembers => self.sync_team_members(key, store, cancel).await,
            ScopedKind::RepoCollaborators => {
                self.sync_repo_collaborators(key, store, cancel).await
            }
            ScopedKind::RepoTeams => self.sync_repo_teams(key, store, cancel).await,
        }
    }

    async fn sync_team_members(
        &self,
        slug: &str,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let team = teams::get_by_slug(&self.pool, slug)
            .await
            .map_err(|e| store_err("team-users", e))?
            .ok_or_else(|| SyncError::MissingParent {
                kind: "team",
                key: slug.to_string(),
                hint: "teams",
            })?;

        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_team_members(slug, &t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("team-users", f))?;

        let rows: Vec<TeamMembershipRow> =
            fetched.iter().map(|m| membership_row(&team, m)).collect();
        if store {
            memberships::replace_for_team(&self.pool, slug, &rows)
                .await
                .map_err(|e| store_err("team-users", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_repo_collaborators(
        &self,
        repo: &str,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_repo_collaborators(repo, &t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("repo-users", f))?;

        let rows: Vec<RepoCollaboratorRow> =
            fetched.iter().map(|c| collaborator_row(repo, c)).collect();
        if store {
            collaborators::replace_collaborators_for_repo(&self.pool, repo, &rows)
                .await
                .map_err(|e| store_err("repo-users", e))?;
        }
        Ok(rows.len())
    }

    async fn sync_repo_teams(
        &self,
        repo: &str,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<usize, SyncError> {
        let remote = &self.remote;
        let fetched = fetch::fetch_all(
            PageToken::first_page(),
            &self.options,
            cancel,
            |t, pp| async move { remote.list_repo_teams(repo, &t, pp).await },
        )
        .await
        .map_err(|f| fetch_err("repo-teams", f))?;

        let rows: Vec<RepoTeamGrantRow> = fetched.iter().map(|t| grant_row(repo, t)).collect();
        if store {
            collaborators::replace_grants_for_repo(&self.pool, repo, &rows)
                .await
                .map_err(|e| store_err("repo-teams", e))?;
        }
        Ok(rows.len())
    }

    /// Run the scoped sync for every cached parent key. A failing key is
    /// logged and recorded in the report; iteration continues with the
    /// remaining keys.
    async fn sync_aggregate(
        &self,
        kind: ScopedKind,
        store: bool,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let keys = match kind {
            ScopedKind::TeamMembers => teams::list_slugs(&self.pool).await,
            ScopedKind::RepoCollaborators | ScopedKind::RepoTeams => {
                repos::list_names(&self.pool).await
            }
        }
        .map_err(|e| store_err(kind.name(), e))?;

        let mut succeeded = 0usize;
        let mut items = 0usize;
        let mut failed = Vec::new();

        for key in &keys {
            if cancel.is_cancelled() {
                return Err(SyncError::Cancelled { kind: kind.name() });
            }
            match self.sync_scoped(kind, key, store, cancel).await {
                Ok(count) => {
                    succeeded += 1;
                    items += count;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "scoped sync failed; continuing");
                    failed.push(FailedKey {
                        key: key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::debug!(
            kind = kind.name(),
            succeeded,
            failed = failed.len(),
            items,
            "aggregate sync finished"
        );
        Ok(SyncReport::Aggregate {
            kind: kind.name(),
            succeeded,
            items,
            failed,
        })
    }
}

fn fetch_err<T>(kind: &'static str, failure: FetchFailure<T>) -> SyncError {
    tracing::warn!(
        kind,
        partial = failure.partial.len(),
        error = %failure.error,
        "fetch aborted; cache left untouched"
    );
    SyncError::Fetch {
        kind,
        source: failure.error,
    }
}

fn store_err(kind: &'static str, source: SqliteError) -> SyncError {
    SyncError::Store { kind, source }
}

fn user_row(u: &RemoteUser) -> UserRow {
    UserRow {
        id: u.id,
        login: u.login.clone(),
        name: u.name.clone(),
        email: u.email.clone(),
        company: u.company.clone(),
        location: u.location.clone(),
        remote_created_at: opt_rfc3339_secs(u.created_at.as_deref()),
        remote_updated_at: opt_rfc3339_secs(u.updated_at.as_deref()),
    }
}

fn team_row(t: &RemoteTeam) -> TeamRow {
    TeamRow {
        id: t.id,
        slug: t.slug.clone(),
        name: t.name.clone(),
        description: t.description.clone(),
        privacy: t.privacy.clone(),
        permission: t.permission.clone(),
    }
}

fn repo_row(r: &RemoteRepo) -> RepoRow {
    RepoRow {
        id: r.id,
        name: r.name.clone(),
        full_name: r.full_name.clone(),
        description: r.description.clone(),
        private: r.private,
        language: r.language.clone(),
        size: r.size,
        stargazers: r.stargazers_count,
        watchers: r.watchers_count,
        forks: r.forks_count,
        remote_created_at: opt_rfc3339_secs(r.created_at.as_deref()),
        remote_updated_at: opt_rfc3339_secs(r.updated_at.as_deref()),
        remote_pushed_at: opt_rfc3339_secs(r.pushed_at.as_deref()),
    }
}

fn membership_row(team: &TeamRow, m: &RemoteTeamMember) -> TeamMembershipRow {
    TeamMembershipRow {
        team_id: team.id,
        user_id: m.id,
        team_slug: team.slug.clone(),
        user_login: m.login.clone(),
        role: m.role.clone(),
        remote_created_at: opt_rfc3339_secs(m.created_at.as_deref()),
    }
}

fn collaborator_row(repo: &str, c: &RemoteCollaborator) -> RepoCollaboratorRow {
    RepoCollaboratorRow {
        repo_name: repo.to_string(),
        user_login: c.login.clone(),
        permission: c.role_name.clone(),
    }
}

fn grant_row(repo: &str, t: &RemoteTeam) -> RepoTeamGrantRow {
    RepoTeamGrantRow {
        repo_name: repo.to_string(),
        team_slug: t.slug.clone(),
        permission: t.permission.clone(),
    }
}
