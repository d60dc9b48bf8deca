//! Configuration loading for qbot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback token file, relative to the working directory.
pub const TOKEN_FILE: &str = ".token";

/// Get the qbot home directory (~/.qbot).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".qbot"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.qbot/settings.json, falling back to defaults when
/// the file does not exist.
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.queue.page_size == 0 {
        return Err(Error::Config("queue.page_size must be at least 1".to_string()));
    }
    if settings.queue.max_item_length == 0 {
        return Err(Error::Config(
            "queue.max_item_length must be at least 1".to_string(),
        ));
    }
    if settings.logging.file_name.trim().is_empty() {
        return Err(Error::Config("logging.file_name must not be empty".to_string()));
    }
    Ok(())
}

/// Read a bot token from the first line of a token file.
pub fn read_token_file(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let token = content.lines().next()?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Telegram channel configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
}

/// Limits and presentation of chat queues.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct QueueSettings {
    /// Maximum lines per `/queue` message.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum item length, in characters.
    #[serde(default = "default_max_item_length")]
    pub max_item_length: usize,

    #[serde(default = "default_forbidden_characters")]
    pub forbidden_characters: Vec<char>,

    /// Show when each item was queued in `/queue`.
    #[serde(default)]
    pub show_added_time: bool,
}

fn default_page_size() -> usize {
    25
}

fn default_max_item_length() -> usize {
    30
}

fn default_forbidden_characters() -> Vec<char> {
    vec!['\n']
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_item_length: default_max_item_length(),
            forbidden_characters: default_forbidden_characters(),
            show_added_time: false,
        }
    }
}

/// Chat administrator lookups.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AdminSettings {
    /// How long a chat's administrator list is trusted. 0 disables caching.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for AdminSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

/// Where conversation state is kept.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process memory only, lost on restart.
    #[default]
    Memory,
    /// One JSON file per conversation.
    Json,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Directory for the JSON backend (default ~/.qbot/chats).
    pub path: Option<PathBuf>,
}

impl StoreSettings {
    pub fn resolved_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_home_dir()?.join("chats")),
        }
    }
}

/// Log output. `RUST_LOG` still overrides `filter`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    /// Directory for rolling log files (default: platform data dir + `logs`).
    pub dir: Option<PathBuf>,

    #[serde(default = "default_log_file_name")]
    pub file_name: String,

    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// Mirror logs to stderr.
    #[serde(default = "default_true")]
    pub console: bool,
}

fn default_log_file_name() -> String {
    "qbot.log".to_string()
}

fn default_log_filter() -> String {
    "info,qbot=debug".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            dir: None,
            file_name: default_log_file_name(),
            filter: default_log_filter(),
            console: true,
        }
    }
}

impl LogSettings {
    pub fn resolved_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.dir {
            return Ok(dir.clone());
        }
        let dirs = directories::ProjectDirs::from("com", "qbot", "qbot")
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))?;
        Ok(dirs.data_dir().join("logs"))
    }
}

/// qbot settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub queue: QueueSettings,

    #[serde(default)]
    pub admins: AdminSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    /// Pick the bot token: explicit value first, then settings, then the token file.
    pub fn resolve_token(&self, explicit: Option<&str>) -> Result<String> {
        explicit
            .map(str::to_string)
            .or_else(|| self.telegram.bot_token.clone())
            .or_else(|| read_token_file(Path::new(TOKEN_FILE)))
            .ok_or_else(|| {
                Error::Config(format!(
                    "No bot token: pass --token, set QBOT_TOKEN, fill telegram.bot_token or write it to '{}'",
                    TOKEN_FILE
                ))
            })
    }
}
