use std::sync::Arc;

use chrono::Utc;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo, ToolsCapability,
};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use tokio_util::sync::CancellationToken;

use crate::data::sqlite::repositories::{collaborators, memberships, repos, teams, token, users};
use crate::domain::audit;
use crate::domain::mutate::{self, RemoveArgs};
use crate::domain::sync::{FetchTarget, SyncService};

use super::types::*;

type McpError = rmcp::model::ErrorData;

#[derive(Clone)]
pub struct McpServer {
    sync: Arc<SyncService>,
    org: String,
    cancel: CancellationToken,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(sync: Arc<SyncService>, org: String, cancel: CancellationToken) -> Self {
        Self {
            sync,
            org,
            cancel,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: "OrgMirror".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"OrgMirror - inspect a mirrored organization's members, teams and repositories.

The local cache reflects the last successful sync; use the sync tool to refresh a
collection before reading it when freshness matters.

TOOLS:
- list_users / list_teams / list_repos: cached collections
- list_team_members(slug) / list_repo_collaborators(repo): cached link tables
- get_token_permissions: scope and rate-limit snapshot of the configured token
- sync(target): fetch a remote collection and replace the cached snapshot
- preview_remove: describe a removal without performing it (removals only execute via the CLI)
- build_audit_phrase: construct an audit-log search phrase with a created window"#;

#[tool_router]
impl McpServer {
    #[tool(description = "List cached organization members.")]
    async fn list_users(&self) -> Result<CallToolResult, McpError> {
        let rows = users::list(self.sync.pool()).await.map_err(mcp_err)?;
        ok_json(&rows)
    }

    #[tool(description = "List cached teams.")]
    async fn list_teams(&self) -> Result<CallToolResult, McpError> {
        let rows = teams::list(self.sync.pool()).await.map_err(mcp_err)?;
        ok_json(&rows)
    }

    #[tool(description = "List cached repositories.")]
    async fn list_repos(&self) -> Result<CallToolResult, McpError> {
        let rows = repos::list(self.sync.pool()).await.map_err(mcp_err)?;
        ok_json(&rows)
    }

    #[tool(description = "List a team's cached members by team slug.")]
    async fn list_team_members(
        &self,
        Parameters(input): Parameters<TeamMembersInput>,
    ) -> Result<CallToolResult, McpError> {
        let rows = memberships::list_for_team(self.sync.pool(), &input.slug)
            .await
            .map_err(mcp_err)?;
        ok_json(&rows)
    }

    #[tool(description = "List a repository's cached collaborators by repository name.")]
    async fn list_repo_collaborators(
        &self,
        Parameters(input): Parameters<RepoCollaboratorsInput>,
    ) -> Result<CallToolResult, McpError> {
        let rows = collaborators::list_collaborators_for_repo(self.sync.pool(), &input.repo)
            .await
            .map_err(mcp_err)?;
        ok_json(&rows)
    }

    #[tool(
        description = "Get the cached token-permission snapshot: login, scopes, rate-limit state."
    )]
    async fn get_token_permissions(&self) -> Result<CallToolResult, McpError> {
        let row = token::current(self.sync.pool()).await.map_err(mcp_err)?;
        match row {
            Some(row) => ok_json(&row),
            None => Err(McpError::invalid_params(
                "no token snapshot cached; run sync with target 'token' first",
                None,
            )),
        }
    }

    #[tool(
        description = "Fetch a remote collection and replace the cached snapshot. Returns the sync report."
    )]
    async fn sync(
        &self,
        Parameters(input): Parameters<SyncInput>,
    ) -> Result<CallToolResult, McpError> {
        let target = FetchTarget::parse(&input.target)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let store = !input.no_store.unwrap_or(false);
        let report = self
            .sync
            .sync(&target, store, &self.cancel)
            .await
            .map_err(mcp_err)?;
        ok_json(&report)
    }

    #[tool(
        description = "Describe a removal without performing it. Supply exactly one of team, user, team_user, outside_collab, repo_collab."
    )]
    async fn preview_remove(
        &self,
        Parameters(input): Parameters<PreviewRemoveInput>,
    ) -> Result<CallToolResult, McpError> {
        let args = RemoveArgs {
            team: input.team,
            user: input.user,
            team_user: input.team_user,
            outside_collab: input.outside_collab,
            repo_collab: input.repo_collab,
        };
        let mutation = mutate::parse_remove(&args)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        ok_json(&serde_json::json!({ "description": format!("would {mutation}") }))
    }

    #[tool(
        description = "Build an audit-log search phrase for an actor, optionally scoped to a repository and a created window."
    )]
    async fn build_audit_phrase(
        &self,
        Parameters(input): Parameters<AuditPhraseInput>,
    ) -> Result<CallToolResult, McpError> {
        let phrase = audit::build_phrase(
            &self.org,
            Some(&input.user),
            input.repo.as_deref(),
            input.created.as_deref().unwrap_or(""),
            Utc::now(),
        )
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        ok_json(&serde_json::json!({ "phrase": phrase }))
    }
}

fn ok_json(value: &impl serde::Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(value).map_err(mcp_err)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn mcp_err(e: impl std::fmt::Display) -> McpError {
    tracing::debug!(error = %e, "MCP tool error");
    McpError::internal_error(e.to_string(), None)
}
