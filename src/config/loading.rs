//! Configuration loading.
//!
//! Handles path resolution, default file generation, parsing, and the
//! validation pass.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::OnceLock;

use super::Config;
use super::validation::validate_config;

/// Global configuration directory, set once at startup from `--config`.
static CONFIG_DIR: OnceLock<Option<PathBuf>> = OnceLock::new();

/// Contents written when no configuration file exists yet.
const DEFAULT_CONFIG_CONTENT: &str = r#"#[Connectivity]
connection = "any"   # Interface class to watch: "any", "wired", "wireless"

#[Polling]
poll_timeout = 500   # Seconds before a phase end to switch to aggressive polling
idle_interval = 0    # Fixed poll interval in seconds (0 = full blocking wait)

#[Notifications]
# bot_token = ""     # Telegram bot credentials; omit to disable notifications
# chat_id = ""

[night]
start = "22:00"      # Watch for disconnection in this window
end = "06:00"

[morning]
start = "06:00"      # Watch for reconnection in this window
end = "08:00"
"#;

/// Set the configuration directory for the current process.
/// Can only be called once, typically at startup.
pub fn set_config_dir(dir: Option<String>) -> Result<()> {
    CONFIG_DIR
        .set(dir.map(PathBuf::from))
        .map_err(|_| anyhow::anyhow!("Configuration directory already set"))
}

/// Get the custom configuration directory if one was set.
pub fn get_custom_config_dir() -> Option<PathBuf> {
    CONFIG_DIR.get().and_then(|d| d.clone())
}

/// Get the configuration file path.
pub fn get_config_path() -> Result<PathBuf> {
    if let Some(custom_dir) = get_custom_config_dir() {
        return Ok(custom_dir.join("dozr.toml"));
    }

    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join("dozr").join("dozr.toml"))
}

/// Load configuration using automatic path detection.
///
/// Creates a commented default configuration file if none exists.
pub fn load() -> Result<Config> {
    let config_path = get_config_path()?;

    if !config_path.exists() {
        create_default_config(&config_path)
            .context("Failed to create default config during load")?;
        log_block_start!("Created default configuration");
        log_indented!("{}", config_path.display());
    }

    load_from_path(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))
}

/// Load configuration from a specific path. Does not create defaults.
pub fn load_from_path(path: &PathBuf) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    validate_config(&config)?;

    Ok(config)
}

/// Write the default configuration file, creating parent directories.
pub fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG_CONTENT)
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}
