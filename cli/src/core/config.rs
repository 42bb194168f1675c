//! Application configuration
//!
//! Layered lowest to highest: built-in defaults, the profile config file
//! (`~/.orgmirror/orgmirror.json`), a local or CLI-specified config file,
//! then CLI arguments (which carry env-var fallbacks via clap). The API
//! token is held opaquely; it is never logged and never written back out.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::fetch::{DEFAULT_PAGE_DELAY_MS, FetchOptions, PAGE_SIZE};
use crate::remote::github::DEFAULT_API_BASE;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

/// Fetch configuration section (from JSON config file)
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FetchFileConfig {
    pub per_page: Option<u32>,
    pub page_delay_ms: Option<u64>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub org: Option<String>,
    pub token: Option<String>,
    pub api_base: Option<String>,
    pub fetch: Option<FetchFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if other.org.is_some() {
            tracing::trace!(org = ?other.org, "Merging org");
            self.org = other.org;
        }
        if other.token.is_some() {
            tracing::trace!(token = "***", "Merging token");
            self.token = other.token;
        }
        if other.api_base.is_some() {
            tracing::trace!(api_base = ?other.api_base, "Merging api_base");
            self.api_base = other.api_base;
        }
        if let Some(fetch) = other.fetch {
            let current = self.fetch.get_or_insert_with(FetchFileConfig::default);
            if fetch.per_page.is_some() {
                tracing::trace!(per_page = ?fetch.per_page, "Merging fetch.per_page");
                current.per_page = fetch.per_page;
            }
            if fetch.page_delay_ms.is_some() {
                tracing::trace!(page_delay_ms = ?fetch.page_delay_ms, "Merging fetch.page_delay_ms");
                current.page_delay_ms = fetch.page_delay_ms;
            }
        }
    }
}

/// Remote API context required by fetch, mutation and audit operations
#[derive(Debug, Clone)]
pub struct RemoteContext {
    pub org: String,
    pub token: String,
    pub api_base: String,
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub org: Option<String>,
    token: Option<String>,
    pub api_base: String,
    pub per_page: u32,
    pub page_delay_ms: u64,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.orgmirror/orgmirror.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let file_fetch = file_config.fetch.unwrap_or_default();

        let org = cli.org.clone().or(file_config.org);
        let token = cli.token.clone().or(file_config.token);
        let api_base = cli
            .api_base
            .clone()
            .or(file_config.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        // Page size is capped at the listing endpoints' maximum.
        let per_page = cli
            .per_page
            .or(file_fetch.per_page)
            .unwrap_or(PAGE_SIZE)
            .clamp(1, PAGE_SIZE);
        let page_delay_ms = cli
            .page_delay_ms
            .or(file_fetch.page_delay_ms)
            .unwrap_or(DEFAULT_PAGE_DELAY_MS);

        Ok(Self {
            org,
            token,
            api_base,
            per_page,
            page_delay_ms,
        })
    }

    /// Organization and credentials, required before any remote operation
    /// is started.
    pub fn require_remote(&self) -> Result<RemoteContext> {
        let org = self
            .org
            .clone()
            .context("no organization configured: set --org, ORGMIRROR_ORG or the config file")?;
        let token = self
            .token
            .clone()
            .context("no API token configured: set --token, ORGMIRROR_TOKEN or the config file")?;
        Ok(RemoteContext {
            org,
            token,
            api_base: self.api_base.clone(),
        })
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            per_page: self.per_page,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }
}

/// Path of the profile config file (`~/.orgmirror/orgmirror.json`)
fn profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
