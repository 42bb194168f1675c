//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::core::cli::{self, CliConfig, Commands, SystemCommands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::core::storage::AppStorage;
use crate::data::SqliteService;
use crate::data::sqlite::repositories::{collaborators, memberships, repos, teams, token, users};
use crate::domain::audit;
use crate::domain::fetch;
use crate::domain::mutate::{
    AddArgs, ExecutionMode, Mutation, MutationService, RemoveArgs, parse_add, parse_remove,
};
use crate::domain::sync::{FetchTarget, SyncService};
use crate::remote::{GithubClient, PageToken, RemoteClient};

pub struct CoreApp {
    pub config: AppConfig,
    pub storage: AppStorage,
    pub database: SqliteService,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        // Prune never touches the database; handle it before init so a
        // corrupt cache can still be deleted.
        if let Commands::System { command: system_cmd } = command {
            return Self::handle_system_command(system_cmd);
        }

        let app = Self::init(&cli_config).await?;
        let cancel = install_interrupt_handler();

        let result = app.dispatch(command, &cancel).await;
        app.database.close().await;
        result
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let storage = AppStorage::init().await?;
        let database = SqliteService::init(&storage)
            .await
            .context("Failed to initialize cache database")?;

        Ok(Self {
            config,
            storage,
            database,
        })
    }

    async fn dispatch(&self, command: Commands, cancel: &CancellationToken) -> Result<()> {
        match command {
            Commands::Fetch { target, no_store } => self.fetch(&target, no_store, cancel).await,
            Commands::Remove {
                team,
                user,
                team_user,
                outside_collab,
                repo_collab,
                exec,
                no_resync,
            } => {
                let args = RemoveArgs {
                    team,
                    user,
                    team_user,
                    outside_collab,
                    repo_collab,
                };
                let mutation = parse_remove(&args)?;
                self.mutate(&mutation, exec, no_resync, cancel).await
            }
            Commands::Add {
                team_user,
                outside_collab,
                permission,
                exec,
                no_resync,
            } => {
                let args = AddArgs {
                    team_user,
                    outside_collab,
                    permission,
                };
                let mutation = parse_add(&args)?;
                self.mutate(&mutation, exec, no_resync, cancel).await
            }
            Commands::Audit {
                user,
                repo,
                created,
            } => self.audit(user, repo, created, cancel).await,
            Commands::Query { what, key } => self.query(&what, key.as_deref()).await,
            Commands::Mcp => self.mcp(cancel.clone()).await,
            Commands::System { .. } => unreachable!("handled before init"),
        }
    }

    fn remote(&self) -> Result<Arc<dyn RemoteClient>> {
        let ctx = self.config.require_remote()?;
        let client = GithubClient::new(&ctx.api_base, &ctx.org, &ctx.token)?;
        Ok(Arc::new(client))
    }

    fn sync_service(&self) -> Result<SyncService> {
        Ok(SyncService::new(
            self.remote()?,
            self.database.pool().clone(),
            self.config.fetch_options(),
        ))
    }

    async fn fetch(
        &self,
        target: &str,
        no_store: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let target = FetchTarget::parse(target)?;
        let sync = self.sync_service()?;
        let report = sync.sync(&target, !no_store, cancel).await?;
        print_json(&report)
    }

    async fn mutate(
        &self,
        mutation: &Mutation,
        exec: bool,
        no_resync: bool,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let remote = self.remote()?;
        let sync = SyncService::new(
            remote.clone(),
            self.database.pool().clone(),
            self.config.fetch_options(),
        );
        let service = MutationService::new(remote, sync);

        let mode = if exec {
            ExecutionMode::Execute
        } else {
            ExecutionMode::Preview
        };
        let outcome = service.run(mutation, mode, !no_resync, cancel).await?;
        print_json(&outcome)
    }

    async fn audit(
        &self,
        user: Option<String>,
        repo: Option<String>,
        created: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let ctx = self.config.require_remote()?;
        let phrase = audit::build_phrase(
            &ctx.org,
            user.as_deref(),
            repo.as_deref(),
            created.as_deref().unwrap_or(""),
            chrono::Utc::now(),
        )?;
        tracing::debug!(phrase = %phrase, "Searching audit log");

        let remote = self.remote()?;
        let options = self.config.fetch_options();
        let client = &remote;
        let phrase_ref = &phrase;
        let events = fetch::fetch_all(
            PageToken::start_cursor(),
            &options,
            cancel,
            |t, pp| async move { client.search_audit_log(phrase_ref, &t, pp).await },
        )
        .await
        .map_err(|f| f.error)
        .context("audit-log search failed")?;

        for event in &events {
            println!("{}", serde_json::to_string(event)?);
        }
        tracing::info!(events = events.len(), "Audit search finished");
        Ok(())
    }

    async fn query(&self, what: &str, key: Option<&str>) -> Result<()> {
        let pool = self.database.pool();
        match what {
            "users" => print_json(&users::list(pool).await?),
            "user" => {
                let login = key.context("query user requires a login")?;
                match users::get_by_login(pool, login).await? {
                    Some(row) => print_json(&row),
                    None => anyhow::bail!("user '{login}' is not in the cache"),
                }
            }
            "repo" => {
                let name = key.context("query repo requires a repository name")?;
                match repos::get_by_name(pool, name).await? {
                    Some(row) => print_json(&row),
                    None => anyhow::bail!("repository '{name}' is not in the cache"),
                }
            }
            "outside" => print_json(&users::list_outside(pool).await?),
            "teams" => print_json(&teams::list(pool).await?),
            "repos" => print_json(&repos::list(pool).await?),
            "team-users" => {
                let slug = key.context("query team-users requires a team slug")?;
                print_json(&memberships::list_for_team(pool, slug).await?)
            }
            "repo-users" => {
                let repo = key.context("query repo-users requires a repository name")?;
                print_json(&collaborators::list_collaborators_for_repo(pool, repo).await?)
            }
            "repo-teams" => {
                let repo = key.context("query repo-teams requires a repository name")?;
                print_json(&collaborators::list_grants_for_repo(pool, repo).await?)
            }
            "token" => match token::current(pool).await? {
                Some(row) => print_json(&row),
                None => {
                    anyhow::bail!("no token snapshot cached; run 'fetch token' first")
                }
            },
            other => anyhow::bail!(
                "unknown query '{other}': expected users, user, outside, teams, repos, \
                 repo, team-users, repo-users, repo-teams or token"
            ),
        }
    }

    async fn mcp(&self, cancel: CancellationToken) -> Result<()> {
        let ctx = self.config.require_remote()?;
        let sync = Arc::new(self.sync_service()?);
        crate::api::mcp::serve(sync, ctx.org, cancel).await
    }

    fn handle_system_command(cmd: SystemCommands) -> Result<()> {
        match cmd {
            SystemCommands::Prune { yes } => Self::prune_data(yes),
        }
    }

    fn prune_data(skip_confirm: bool) -> Result<()> {
        let data_dir = AppStorage::resolve_data_dir();

        if !data_dir.exists() {
            println!(
                "Nothing to prune. Data directory does not exist: {}",
                data_dir.display()
            );
            return Ok(());
        }

        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);

        println!("This will permanently delete the local data directory:");
        println!("  {}", data_dir.display());

        if !skip_confirm {
            print!("\nContinue? [y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
                println!("Aborted.");
                return Ok(());
            }
        }

        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("Failed to delete data directory: {}", data_dir.display()))?;
        println!("Pruned: {}", data_dir.display());
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Ctrl-C cancels the shared token; in-flight page requests and
/// mutations observe it and return promptly.
fn install_interrupt_handler() -> CancellationToken {
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received; cancelling");
            handle.cancel();
        }
    });
    cancel
}
