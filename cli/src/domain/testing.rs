//! Test fake for the remote client
//!
//! Serves canned collections in a single page and records every call so
//! tests can assert what did (or did not) reach the remote API. Entries
//! in `fail` force the matching operation to return a 500.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::remote::{
    AuditEvent, Page, PageToken, RemoteClient, RemoteCollaborator, RemoteError, RemoteRepo,
    RemoteTeam, RemoteTeamMember, RemoteUser, RepoPermission, TokenPermissions,
};

#[derive(Default)]
pub(crate) struct FakeRemote {
    pub users: Vec<RemoteUser>,
    pub details: HashMap<String, RemoteUser>,
    pub teams: Vec<RemoteTeam>,
    pub repos: Vec<RemoteRepo>,
    pub team_members: HashMap<String, Vec<RemoteTeamMember>>,
    pub repo_collaborators: HashMap<String, Vec<RemoteCollaborator>>,
    pub repo_teams: HashMap<String, Vec<RemoteTeam>>,
    pub outside: Vec<RemoteUser>,
    pub audit: Vec<AuditEvent>,
    pub fail: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

pub(crate) fn remote_user(id: i64, login: &str) -> RemoteUser {
    RemoteUser {
        id,
        login: login.to_string(),
        name: None,
        email: None,
        company: None,
        location: None,
        created_at: Some("2024-01-01T00:00:00Z".to_string()),
        updated_at: None,
    }
}

pub(crate) fn remote_team(id: i64, slug: &str) -> RemoteTeam {
    RemoteTeam {
        id,
        slug: slug.to_string(),
        name: slug.to_uppercase(),
        description: None,
        privacy: Some("closed".to_string()),
        permission: Some("pull".to_string()),
    }
}

pub(crate) fn remote_repo(id: i64, name: &str) -> RemoteRepo {
    RemoteRepo {
        id,
        name: name.to_string(),
        full_name: format!("acme/{name}"),
        description: None,
        private: false,
        language: None,
        size: 0,
        stargazers_count: 0,
        watchers_count: 0,
        forks_count: 0,
        created_at: None,
        updated_at: None,
        pushed_at: None,
    }
}

pub(crate) fn remote_member(id: i64, login: &str) -> RemoteTeamMember {
    RemoteTeamMember {
        id,
        login: login.to_string(),
        role: "member".to_string(),
        created_at: None,
    }
}

impl FakeRemote {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn gate(&self, key: &str) -> Result<(), RemoteError> {
        if self.fail.contains(key) {
            return Err(RemoteError::status(500, key, "forced failure"));
        }
        Ok(())
    }

    fn one_page<T: Clone>(items: &[T]) -> Page<T> {
        Page {
            items: items.to_vec(),
            next: None,
        }
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn list_members(
        &self,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteUser>, RemoteError> {
        self.record("list_members");
        self.gate("list_members")?;
        Ok(Self::one_page(&self.users))
    }

    async fn get_user(&self, login: &str) -> Result<RemoteUser, RemoteError> {
        self.record(format!("get_user:{login}"));
        self.gate(&format!("get_user:{login}"))?;
        self.details
            .get(login)
            .cloned()
            .ok_or_else(|| RemoteError::status(404, format!("/users/{login}"), "not found"))
    }

    async fn list_teams(
        &self,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteTeam>, RemoteError> {
        self.record("list_teams");
        self.gate("list_teams")?;
        Ok(Self::one_page(&self.teams))
    }

    async fn list_repos(
        &self,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteRepo>, RemoteError> {
        self.record("list_repos");
        self.gate("list_repos")?;
        Ok(Self::one_page(&self.repos))
    }

    async fn list_team_members(
        &self,
        slug: &str,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteTeamMember>, RemoteError> {
        self.record(format!("list_team_members:{slug}"));
        self.gate(&format!("team:{slug}"))?;
        Ok(Self::one_page(
            self.team_members.get(slug).map(Vec::as_slice).unwrap_or(&[]),
        ))
    }

    async fn list_repo_collaborators(
        &self,
        repo: &str,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteCollaborator>, RemoteError> {
        self.record(format!("list_repo_collaborators:{repo}"));
        self.gate(&format!("repo:{repo}"))?;
        Ok(Self::one_page(
            self.repo_collaborators
                .get(repo)
                .map(Vec::as_slice)
                .unwrap_or(&[]),
        ))
    }

    async fn list_repo_teams(
        &self,
        repo: &str,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteTeam>, RemoteError> {
        self.record(format!("list_repo_teams:{repo}"));
        self.gate(&format!("repo:{repo}"))?;
        Ok(Self::one_page(
            self.repo_teams.get(repo).map(Vec::as_slice).unwrap_or(&[]),
        ))
    }

    async fn list_outside_collaborators(
        &self,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<RemoteUser>, RemoteError> {
        self.record("list_outside_collaborators");
        self.gate("list_outside_collaborators")?;
        Ok(Self::one_page(&self.outside))
    }

    async fn search_audit_log(
        &self,
        phrase: &str,
        _token: &PageToken,
        _per_page: u32,
    ) -> Result<Page<AuditEvent>, RemoteError> {
        self.record(format!("search_audit_log:{phrase}"));
        self.gate("search_audit_log")?;
        Ok(Self::one_page(&self.audit))
    }

    async fn token_permissions(&self) -> Result<TokenPermissions, RemoteError> {
        self.record("token_permissions");
        self.gate("token_permissions")?;
        Ok(TokenPermissions {
            login: "octocat".to_string(),
            scopes: vec!["admin:org".to_string(), "repo".to_string()],
            rate_limit: 5000,
            rate_remaining: 4999,
            rate_reset: 1700000000,
        })
    }

    async fn delete_team(&self, slug: &str) -> Result<(), RemoteError> {
        self.record(format!("delete_team:{slug}"));
        self.gate("delete_team")
    }

    async fn remove_org_member(&self, login: &str) -> Result<(), RemoteError> {
        self.record(format!("remove_org_member:{login}"));
        self.gate("remove_org_member")
    }

    async fn add_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError> {
        self.record(format!("add_team_member:{slug}/{login}"));
        self.gate("add_team_member")
    }

    async fn remove_team_member(&self, slug: &str, login: &str) -> Result<(), RemoteError> {
        self.record(format!("remove_team_member:{slug}/{login}"));
        self.gate("remove_team_member")
    }

    async fn add_outside_collaborator(
        &self,
        repo: &str,
        login: &str,
        permission: RepoPermission,
    ) -> Result<(), RemoteError> {
        self.record(format!("add_outside_collaborator:{repo}/{login}:{permission}"));
        self.gate("add_outside_collaborator")
    }

    async fn remove_outside_collaborator(
        &self,
        repo: &str,
        login: &str,
    ) -> Result<(), RemoteError> {
        self.record(format!("remove_outside_collaborator:{repo}/{login}"));
        self.gate("remove_outside_collaborator")
    }

    async fn remove_repo_collaborator(&self, repo: &str, login: &str) -> Result<(), RemoteError> {
        self.record(format!("remove_repo_collaborator:{repo}/{login}"));
        self.gate("remove_repo_collaborator")
    }
}
