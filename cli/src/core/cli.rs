use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{
    ENV_API_BASE, ENV_CONFIG, ENV_ORG, ENV_PAGE_DELAY_MS, ENV_PER_PAGE, ENV_TOKEN,
};

#[derive(Parser)]
#[command(name = "orgmirror")]
#[command(version, about = "Organization membership mirror and admin tool", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Organization name on the remote forge
    #[arg(long, short = 'o', global = true, env = ENV_ORG)]
    pub org: Option<String>,

    /// API token used for authentication
    #[arg(long, global = true, env = ENV_TOKEN, hide_env_values = true)]
    pub token: Option<String>,

    /// API base URL
    #[arg(long, global = true, env = ENV_API_BASE)]
    pub api_base: Option<String>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Delay between page requests in milliseconds
    #[arg(long, global = true, env = ENV_PAGE_DELAY_MS)]
    pub page_delay_ms: Option<u64>,

    /// Items requested per page (max 100)
    #[arg(long, global = true, env = ENV_PER_PAGE)]
    pub per_page: Option<u32>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Fetch a remote collection and replace the cached snapshot
    Fetch {
        /// What to fetch: users, detail-users, teams, repos, team-users,
        /// {slug}/users, repo-users, {repo}/collaborators, repo-teams,
        /// {repo}/teams, outside-collaborators, token
        target: String,

        /// Fetch and count only; leave the cache untouched
        #[arg(long)]
        no_store: bool,
    },
    /// Remove a team, member or collaborator (dry-run unless --exec)
    Remove {
        /// Team slug: delete the team itself
        #[arg(long)]
        team: Option<String>,

        /// User login: remove the user from the organization
        #[arg(long)]
        user: Option<String>,

        /// slug/login pair: remove the user from the team
        #[arg(long)]
        team_user: Option<String>,

        /// repo/login pair: remove an outside collaborator
        #[arg(long)]
        outside_collab: Option<String>,

        /// repo/login pair: remove a direct repository collaborator
        #[arg(long)]
        repo_collab: Option<String>,

        /// Perform the real remote mutation instead of describing it
        #[arg(long)]
        exec: bool,

        /// Skip the post-success cache resync
        #[arg(long)]
        no_resync: bool,
    },
    /// Add a team member or invite an outside collaborator (dry-run unless --exec)
    Add {
        /// slug/login pair: add the user to the team
        #[arg(long)]
        team_user: Option<String>,

        /// repo/login pair: invite an outside collaborator
        #[arg(long)]
        outside_collab: Option<String>,

        /// Permission for the invitation: pull, push, admin (aliases: read, write)
        #[arg(long)]
        permission: Option<String>,

        /// Perform the real remote mutation instead of describing it
        #[arg(long)]
        exec: bool,

        /// Skip the post-success cache resync
        #[arg(long)]
        no_resync: bool,
    },
    /// Search the organization audit log
    Audit {
        /// Actor login to search for
        #[arg(long)]
        user: Option<String>,

        /// Restrict to one repository
        #[arg(long)]
        repo: Option<String>,

        /// Created window: YYYY-MM-DD, >=/<= comparison, or start..end range
        #[arg(long)]
        created: Option<String>,
    },
    /// Query the local cache (JSON on stdout)
    Query {
        /// What to list: users, outside, teams, repos, team-users,
        /// repo-users, repo-teams, token; or a single-row lookup with
        /// user {login} or repo {name}
        what: String,

        /// Key for scoped queries and lookups (login, team slug or repo name)
        key: Option<String>,
    },
    /// Serve the cache and preview operations over MCP stdio
    Mcp,
    /// System maintenance commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum SystemCommands {
    /// Delete the local data directory (cache database). Requires confirmation.
    Prune {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub org: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub config: Option<PathBuf>,
    pub page_delay_ms: Option<u64>,
    pub per_page: Option<u32>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        org: cli.org,
        token: cli.token,
        api_base: cli.api_base,
        config: cli.config,
        page_delay_ms: cli.page_delay_ms,
        per_page: cli.per_page,
    };
    (config, cli.command)
}
