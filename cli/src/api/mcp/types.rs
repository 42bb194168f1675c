use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Deserialize, JsonSchema)]
pub struct SyncInput {
    /// Fetch target: users, detail-users, teams, repos, team-users,
    /// {slug}/users, repo-users, {repo}/collaborators, repo-teams,
    /// {repo}/teams, outside-collaborators, token
    pub target: String,
    /// Fetch and count only; leave the cache untouched
    pub no_store: Option<bool>,
}

#[derive(Deserialize, JsonSchema)]
pub struct TeamMembersInput {
    /// Team slug
    pub slug: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct RepoCollaboratorsInput {
    /// Repository name
    pub repo: String,
}

#[derive(Deserialize, JsonSchema)]
pub struct PreviewRemoveInput {
    /// Team slug: delete the team itself
    pub team: Option<String>,
    /// User login: remove the user from the organization
    pub user: Option<String>,
    /// slug/login pair: remove the user from the team
    pub team_user: Option<String>,
    /// repo/login pair: remove an outside collaborator
    pub outside_collab: Option<String>,
    /// repo/login pair: remove a direct repository collaborator
    pub repo_collab: Option<String>,
}

#[derive(Deserialize, JsonSchema)]
pub struct AuditPhraseInput {
    /// Actor login to search for
    pub user: String,
    /// Restrict to one repository
    pub repo: Option<String>,
    /// Created window: YYYY-MM-DD, >=/<= comparison, or start..end range
    pub created: Option<String>,
}
