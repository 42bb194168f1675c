//! Two-phase mutation executor
//!
//! Every mutation request goes through the same pipeline: parse exactly
//! one target, validate every identifier locally, then branch once on
//! the execution mode. Preview (the default) describes the intended
//! change and stops before any network call; Execute performs the remote
//! mutation and, on success, re-syncs the affected slice of the cache so
//! the local snapshot reflects the change.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::remote::{RemoteClient, RemoteError, RepoPermission};

use super::ident::{self, IdentError};
use super::sync::{FetchTarget, SyncService};

#[derive(Error, Debug)]
pub enum MutateError {
    #[error("no target supplied: pass exactly one of {expected}")]
    MissingTarget { expected: &'static str },

    #[error("ambiguous target: {first} and {second} cannot be combined")]
    AmbiguousTarget {
        first: &'static str,
        second: &'static str,
    },

    #[error("invalid identifier: {0}")]
    InvalidFormat(#[from] IdentError),

    #[error("{0}")]
    InvalidPermission(String),

    #[error("remote mutation failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("cancelled before the remote call completed")]
    Cancelled,
}

/// The single decision point between describing a change and making it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Preview,
    Execute,
}

/// A fully parsed and validated mutation, ready to preview or execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    DeleteTeam { slug: String },
    RemoveOrgMember { login: String },
    AddTeamMember { slug: String, login: String },
    RemoveTeamMember { slug: String, login: String },
    AddOutsideCollaborator {
        repo: String,
        login: String,
        permission: RepoPermission,
    },
    RemoveOutsideCollaborator { repo: String, login: String },
    RemoveRepoCollaborator { repo: String, login: String },
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::DeleteTeam { slug } => write!(f, "delete team '{slug}'"),
            Mutation::RemoveOrgMember { login } => {
                write!(f, "remove user '{login}' from the organization")
            }
            Mutation::AddTeamMember { slug, login } => {
                write!(f, "add user '{login}' to team '{slug}'")
            }
            Mutation::RemoveTeamMember { slug, login } => {
                write!(f, "remove user '{login}' from team '{slug}'")
            }
            Mutation::AddOutsideCollaborator {
                repo,
                login,
                permission,
            } => write!(
                f,
                "invite '{login}' to repository '{repo}' with {permission} permission"
            ),
            Mutation::RemoveOutsideCollaborator { repo, login } => {
                write!(f, "remove outside collaborator '{login}' from repository '{repo}'")
            }
            Mutation::RemoveRepoCollaborator { repo, login } => {
                write!(f, "remove collaborator '{login}' from repository '{repo}'")
            }
        }
    }
}

/// Raw removal flags as supplied on the command line.
#[derive(Debug, Default)]
pub struct RemoveArgs {
    /// `--team` slug: delete the team itself
    pub team: Option<String>,
    /// `--user` login: remove the user from the organization
    pub user: Option<String>,
    /// `--team-user` slug/login pair
    pub team_user: Option<String>,
    /// `--outside-collab` repo/login pair
    pub outside_collab: Option<String>,
    /// `--repo-collab` repo/login pair
    pub repo_collab: Option<String>,
}

/// Raw addition flags as supplied on the command line.
#[derive(Debug, Default)]
pub struct AddArgs {
    /// `--team-user` slug/login pair
    pub team_user: Option<String>,
    /// `--outside-collab` repo/login pair
    pub outside_collab: Option<String>,
    /// Optional permission for the invitation (`pull` when omitted)
    pub permission: Option<String>,
}

/// Enforce the exactly-one-target rule over a set of (flag, value)
/// candidates, returning the single supplied flag's value.
fn exactly_one<'a>(
    candidates: &[(&'static str, Option<&'a str>)],
    expected: &'static str,
) -> Result<(&'static str, &'a str), MutateError> {
    let mut found: Option<(&'static str, &'a str)> = None;
    for (flag, value) in candidates {
        if let Some(value) = value {
            match found {
                None => found = Some((flag, value)),
                Some((first, _)) => {
                    return Err(MutateError::AmbiguousTarget {
                        first,
                        second: flag,
                    });
                }
            }
        }
    }
    found.ok_or(MutateError::MissingTarget { expected })
}

/// Parse removal flags into a validated [`Mutation`]. Grammar failures
/// abort here, before any network call.
pub fn parse_remove(args: &RemoveArgs) -> Result<Mutation, MutateError> {
    let (flag, value) = exactly_one(
        &[
            ("--team", args.team.as_deref()),
            ("--user", args.user.as_deref()),
            ("--team-user", args.team_user.as_deref()),
            ("--outside-collab", args.outside_collab.as_deref()),
            ("--repo-collab", args.repo_collab.as_deref()),
        ],
        "--team, --user, --team-user, --outside-collab, --repo-collab",
    )?;

    match flag {
        "--team" => {
            let slug = ident::validate_team_slug(value)?;
            Ok(Mutation::DeleteTeam {
                slug: slug.to_string(),
            })
        }
        "--user" => {
            let login = ident::validate_user_login(value)?;
            Ok(Mutation::RemoveOrgMember {
                login: login.to_string(),
            })
        }
        "--team-user" => {
            let (slug, login) = ident::parse_team_user_pair(value)?;
            Ok(Mutation::RemoveTeamMember {
                slug: slug.to_string(),
                login: login.to_string(),
            })
        }
        "--outside-collab" => {
            let (repo, login) = ident::parse_repo_user_pair(value)?;
            Ok(Mutation::RemoveOutsideCollaborator {
                repo: repo.to_string(),
                login: login.to_string(),
            })
        }
        _ => {
            let (repo, login) = ident::parse_repo_user_pair(value)?;
            Ok(Mutation::RemoveRepoCollaborator {
                repo: repo.to_string(),
                login: login.to_string(),
            })
        }
    }
}

/// Parse addition flags into a validated [`Mutation`].
pub fn parse_add(args: &AddArgs) -> Result<Mutation, MutateError> {
    let (flag, value) = exactly_one(
        &[
            ("--team-user", args.team_user.as_deref()),
            ("--outside-collab", args.outside_collab.as_deref()),
        ],
        "--team-user, --outside-collab",
    )?;

    match flag {
        "--team-user" => {
            if args.permission.is_some() {
                return Err(MutateError::InvalidPermission(
                    "--permission only applies to outside-collaborator invitations".to_string(),
                ));
            }
            let (slug, login) = ident::parse_team_user_pair(value)?;
            Ok(Mutation::AddTeamMember {
                slug: slug.to_string(),
                login: login.to_string(),
            })
        }
        _ => {
            let permission = match args.permission.as_deref() {
                None => RepoPermission::default(),
                Some(p) => p.parse().map_err(MutateError::InvalidPermission)?,
            };
            let (repo, login) = ident::parse_repo_user_pair(value)?;
            Ok(Mutation::AddOutsideCollaborator {
                repo: repo.to_string(),
                login: login.to_string(),
                permission,
            })
        }
    }
}

/// Result of putting a mutation through the executor.
#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum MutationOutcome {
    Preview { description: String },
    Executed { description: String, resynced: bool },
}

pub struct MutationService {
    remote: Arc<dyn RemoteClient>,
    sync: SyncService,
}

impl MutationService {
    pub fn new(remote: Arc<dyn RemoteClient>, sync: SyncService) -> Self {
        Self { remote, sync }
    }

    /// Run a mutation through the two-phase pipeline.
    ///
    /// In preview mode this returns a description without any network or
    /// cache access. In execute mode the remote call observes `cancel`
    /// and its failure is surfaced verbatim and never retried; after a
    /// success the affected cache slice is re-synced unless `resync` is
    /// false. A failed resync does not fail the mutation, since the
    /// remote change already happened; it is logged and reported as
    /// `resynced: false`.
    pub async fn run(
        &self,
        mutation: &Mutation,
        mode: ExecutionMode,
        resync: bool,
        cancel: &CancellationToken,
    ) -> Result<MutationOutcome, MutateError> {
        if mode == ExecutionMode::Preview {
            return Ok(MutationOutcome::Preview {
                description: format!("would {mutation}"),
            });
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MutateError::Cancelled),
            result = self.dispatch(mutation) => result?,
        }
        tracing::info!(change = %mutation, "remote mutation applied");

        let resynced = if resync {
            match self
                .sync
                .sync(&resync_target(mutation), true, cancel)
                .await
            {
                Ok(_) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "post-mutation resync failed; cache is stale");
                    false
                }
            }
        } else {
            false
        };

        Ok(MutationOutcome::Executed {
            description: mutation.to_string(),
            resynced,
        })
    }

    async fn dispatch(&self, mutation: &Mutation) -> Result<(), MutateError> {
        match mutation {
            Mutation::DeleteTeam { slug } => self.remote.delete_team(slug).await?,
            Mutation::RemoveOrgMember { login } => self.remote.remove_org_member(login).await?,
            Mutation::AddTeamMember { slug, login } => {
                self.remote.add_team_member(slug, login).await?
            }
            Mutation::RemoveTeamMember { slug, login } => {
                self.remote.remove_team_member(slug, login).await?
            }
            Mutation::AddOutsideCollaborator {
                repo,
                login,
                permission,
            } => {
                self.remote
                    .add_outside_collaborator(repo, login, *permission)
                    .await?
            }
            Mutation::RemoveOutsideCollaborator { repo, login } => {
                self.remote.remove_outside_collaborator(repo, login).await?
            }
            Mutation::RemoveRepoCollaborator { repo, login } => {
                self.remote.remove_repo_collaborator(repo, login).await?
            }
        }
        Ok(())
    }
}

/// The cache slice a successful mutation invalidates.
fn resync_target(mutation: &Mutation) -> FetchTarget {
    match mutation {
        Mutation::DeleteTeam { .. } => FetchTarget::Teams,
        Mutation::RemoveOrgMember { .. } => FetchTarget::Users,
        Mutation::AddTeamMember { slug, .. } | Mutation::RemoveTeamMember { slug, .. } => {
            FetchTarget::TeamMembers(Some(slug.clone()))
        }
        Mutation::AddOutsideCollaborator { repo, .. }
        | Mutation::RemoveOutsideCollaborator { repo, .. }
        | Mutation::RemoveRepoCollaborator { repo, .. } => {
            FetchTarget::RepoCollaborators(Some(repo.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::data::sqlite::repositories::collaborators;
    use crate::data::sqlite::test_pool;
    use crate::domain::fetch::FetchOptions;
    use crate::domain::testing::{FakeRemote, remote_member};

    fn team_user(pair: &str) -> RemoveArgs {
        RemoveArgs {
            team_user: Some(pair.to_string()),
            ..Default::default()
        }
    }

    async fn service(remote: FakeRemote) -> (MutationService, Arc<FakeRemote>) {
        let remote = Arc::new(remote);
        let pool = test_pool().await;
        let options = FetchOptions {
            per_page: 100,
            page_delay: Duration::from_millis(0),
        };
        let sync = SyncService::new(remote.clone(), pool, options);
        (MutationService::new(remote.clone(), sync), remote)
    }

    #[test]
    fn test_missing_target() {
        let err = parse_remove(&RemoveArgs::default()).unwrap_err();
        assert!(matches!(err, MutateError::MissingTarget { .. }));
    }

    #[test]
    fn test_ambiguous_target_names_both_flags() {
        let err = parse_remove(&RemoveArgs {
            team: Some("good-team".to_string()),
            user: Some("octocat".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            MutateError::AmbiguousTarget { first, second } => {
                assert_eq!(first, "--team");
                assert_eq!(second, "--user");
            }
            other => panic!("expected ambiguous target, got {other:?}"),
        }
    }

    #[test]
    fn test_grammar_checked_before_anything_else() {
        let err = parse_remove(&team_user("-team/user")).unwrap_err();
        assert!(matches!(err, MutateError::InvalidFormat(_)));
    }

    #[test]
    fn test_remove_targets_parse() {
        assert_eq!(
            parse_remove(&team_user("good-team/octocat")).unwrap(),
            Mutation::RemoveTeamMember {
                slug: "good-team".to_string(),
                login: "octocat".to_string(),
            }
        );
        assert_eq!(
            parse_remove(&RemoveArgs {
                repo_collab: Some("repo_one/octocat".to_string()),
                ..Default::default()
            })
            .unwrap(),
            Mutation::RemoveRepoCollaborator {
                repo: "repo_one".to_string(),
                login: "octocat".to_string(),
            }
        );
    }

    #[test]
    fn test_add_permission_aliases_and_rejects() {
        let parsed = parse_add(&AddArgs {
            outside_collab: Some("repo_one/octocat".to_string()),
            permission: Some("write".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            parsed,
            Mutation::AddOutsideCollaborator {
                repo: "repo_one".to_string(),
                login: "octocat".to_string(),
                permission: RepoPermission::Push,
            }
        );

        let err = parse_add(&AddArgs {
            outside_collab: Some("repo_one/octocat".to_string()),
            permission: Some("owner".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MutateError::InvalidPermission(_)));

        let err = parse_add(&AddArgs {
            team_user: Some("good-team/octocat".to_string()),
            permission: Some("pull".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, MutateError::InvalidPermission(_)));
    }

    #[tokio::test]
    async fn test_preview_makes_no_remote_calls() {
        let (svc, remote) = service(FakeRemote::default()).await;
        let cancel = CancellationToken::new();
        let mutation = parse_remove(&team_user("good-team/octocat")).unwrap();

        let outcome = svc
            .run(&mutation, ExecutionMode::Preview, true, &cancel)
            .await
            .unwrap();
        match outcome {
            MutationOutcome::Preview { description } => {
                assert_eq!(description, "would remove user 'octocat' from team 'good-team'");
            }
            other => panic!("expected preview, got {other:?}"),
        }
        assert!(remote.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_execute_calls_remote_and_resyncs_scope() {
        let mut team_members = HashMap::new();
        team_members.insert("good-team".to_string(), vec![remote_member(1, "left")]);
        let (svc, remote) = service(FakeRemote {
            teams: vec![crate::domain::testing::remote_team(7, "good-team")],
            team_members,
            ..Default::default()
        })
        .await;
        let cancel = CancellationToken::new();

        // The scoped resync needs the team in the cache.
        svc.sync
            .sync(&FetchTarget::Teams, true, &cancel)
            .await
            .unwrap();

        let mutation = parse_remove(&team_user("good-team/octocat")).unwrap();
        let outcome = svc
            .run(&mutation, ExecutionMode::Execute, true, &cancel)
            .await
            .unwrap();

        match outcome {
            MutationOutcome::Executed { resynced, .. } => assert!(resynced),
            other => panic!("expected executed, got {other:?}"),
        }
        let calls = remote.recorded();
        assert!(calls.contains(&"remove_team_member:good-team/octocat".to_string()));
        assert!(calls.contains(&"list_team_members:good-team".to_string()));
    }

    #[tokio::test]
    async fn test_execute_aborts_when_already_cancelled() {
        let (svc, remote) = service(FakeRemote::default()).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mutation = parse_remove(&team_user("good-team/octocat")).unwrap();

        let err = svc
            .run(&mutation, ExecutionMode::Execute, true, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, MutateError::Cancelled));
        assert!(remote.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_resync_suppressed() {
        let (svc, remote) = service(FakeRemote::default()).await;
        let cancel = CancellationToken::new();
        let mutation = parse_remove(&team_user("good-team/octocat")).unwrap();

        let outcome = svc
            .run(&mutation, ExecutionMode::Execute, false, &cancel)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            MutationOutcome::Executed { resynced: false, .. }
        ));
        assert!(
            !remote
                .recorded()
                .iter()
                .any(|c| c.starts_with("list_team_members"))
        );
    }

    #[tokio::test]
    async fn test_failed_resync_does_not_fail_the_mutation() {
        // Team is absent from the cache, so the scoped resync fails.
        let (svc, _remote) = service(FakeRemote::default()).await;
        let cancel = CancellationToken::new();
        let mutation = parse_remove(&team_user("good-team/octocat")).unwrap();

        let outcome = svc
            .run(&mutation, ExecutionMode::Execute, true, &cancel)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            MutationOutcome::Executed { resynced: false, .. }
        ));
    }

    #[tokio::test]
    async fn test_remote_failure_surfaces_and_leaves_cache_alone() {
        let (svc, remote) = service(FakeRemote {
            fail: ["remove_repo_collaborator".to_string()].into(),
            ..Default::default()
        })
        .await;
        let cancel = CancellationToken::new();

        collaborators::replace_collaborators_for_repo(
            svc.sync.pool(),
            "repo_one",
            &[crate::data::types::RepoCollaboratorRow {
                repo_name: "repo_one".to_string(),
                user_login: "octocat".to_string(),
                permission: Some("push".to_string()),
            }],
        )
        .await
        .unwrap();

        let mutation = parse_remove(&RemoveArgs {
            repo_collab: Some("repo_one/octocat".to_string()),
            ..Default::default()
        })
        .unwrap();
        let err = svc
            .run(&mutation, ExecutionMode::Execute, true, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, MutateError::Remote(_)));

        // No resync ran, the snapshot is untouched.
        assert!(
            !remote
                .recorded()
                .iter()
                .any(|c| c.starts_with("list_repo_collaborators"))
        );
        assert_eq!(
            collaborators::list_collaborators_for_repo(svc.sync.pool(), "repo_one")
                .await
                .unwrap()
                .len(),
            1
        );
    }
}
