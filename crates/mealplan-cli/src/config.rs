//! Configuration file management for mealplan.
//!
//! Provides a TOML-based config file at `~/.config/mealplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use mealplan_core::ClientConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub user: UserSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSection {
    pub base_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserSection {
    pub id: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mealplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mealplan` or `~/.config/mealplan`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mealplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mealplan")
}

/// Return the path to the mealplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(&config_path(), config)
}

/// Write `config` to `path`. Sets file permissions to 0600 on Unix.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------

/// Values given on the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliOverrides<'a> {
    pub base_url: Option<&'a str>,
    pub user_id: Option<&'a str>,
}

/// Resolve the client configuration using the chain:
/// CLI flag > env var > config file > default.
///
/// - Base URL: `--base-url` > `MEALPLAN_BASE_URL` > `server.base_url` > `ClientConfig::DEFAULT_BASE_URL`
/// - User id: `--user-id` > `MEALPLAN_USER_ID` > `user.id` > `ClientConfig::DEFAULT_USER_ID`
pub fn resolve(cli: CliOverrides<'_>) -> Result<ClientConfig> {
    let file_config = load_config().ok();
    resolve_with(cli, file_config.as_ref())
}

pub fn resolve_with(cli: CliOverrides<'_>, file_config: Option<&ConfigFile>) -> Result<ClientConfig> {
    let base_url = if let Some(url) = cli.base_url {
        url.to_string()
    } else if let Ok(url) = std::env::var("MEALPLAN_BASE_URL") {
        url
    } else if let Some(cfg) = file_config {
        cfg.server.base_url.clone()
    } else {
        ClientConfig::DEFAULT_BASE_URL.to_string()
    };

    let user_id = if let Some(id) = cli.user_id {
        id.to_string()
    } else if let Ok(id) = std::env::var("MEALPLAN_USER_ID") {
        id
    } else if let Some(cfg) = file_config {
        cfg.user.id.clone()
    } else {
        ClientConfig::DEFAULT_USER_ID.to_string()
    };

    ClientConfig::new(&base_url, user_id).context("invalid client configuration")
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
