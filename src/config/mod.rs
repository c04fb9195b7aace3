//! # Configuration Management Module
//!
//! TOML configuration for the abysm console and its storage, logging and
//! flavor-text collaborators.
//!
//! ## Configuration Structure
//!
//! - [`GameConfig`] - world name, map viewport, default player identity
//! - [`StorageConfig`] - where player records live
//! - [`LoggingConfig`] - log level and optional log file
//! - [`FlavorConfig`] - generative flavor text for bestiary lookups
//!
//! ## Usage
//!
//! ```rust,no_run
//! use abysm::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Config::create_default("config.toml").await?;
//!     let mut config = Config::load("config.toml").await?;
//!     config.apply_env_overrides();
//!     config.validate()?;
//!     println!("World: {}", config.game.world_name);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [game]
//! world_name = "The Abysm of Karth"
//! map_width = 7
//! map_height = 5
//! default_player_name = "Wanderer"
//!
//! [storage]
//! data_dir = "./data"
//! autosave = true
//!
//! [flavor]
//! enabled = false
//! ```
//!
//! Every section and field has a default, so a partial file is fine.
//!
//! ## Environment Integration
//!
//! Precedence: CLI args > Environment > Config file > Defaults. Recognised
//! variables are listed on [`Config::apply_env_overrides`].

use anyhow::{anyhow, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

use crate::engine::world::MapSize;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub flavor: FlavorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Shown in the console welcome banner.
    pub world_name: String,
    /// Viewport width. Must be odd.
    pub map_width: i32,
    /// Viewport height. Must be odd.
    pub map_height: i32,
    /// Player id used when neither `--player` nor `ABYSM_PLAYER_ID` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    pub default_player_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world_name: "The Abysm of Karth".to_string(),
            map_width: 7,
            map_height: 5,
            player_id: None,
            default_player_name: "Wanderer".to_string(),
        }
    }
}

impl GameConfig {
    pub fn map_size(&self) -> MapSize {
        MapSize::new(self.map_width, self.map_height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Sled database directory. Defaults to `<data_dir>/players`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    /// Save the player after every command.
    pub autosave: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
            autosave: true,
        }
    }
}

impl StorageConfig {
    pub fn db_path(&self) -> PathBuf {
        match &self.db_path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(&self.data_dir).join("players"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("abysm.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlavorConfig {
    /// Enable/disable the generative collaborator. The seeded fallback is
    /// always available.
    pub enabled: bool,
    pub api_key: String,
    pub model: String,
    /// API base, without the `/models/...` suffix.
    pub endpoint: String,
    pub temperature: f32,
    /// Reasoning token budget; -1 lets the service decide.
    pub thinking_budget: i32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    pub system_prompt: String,
}

impl Default for FlavorConfig {
    fn default() -> Self {
        Self {
            enabled: false, // Disabled by default until an API key is provided
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.9,
            thinking_budget: -1,
            timeout_seconds: 4,
            system_prompt: "You write terse, grim bestiary entries for a dark fantasy text game. Two short lines, no markdown.".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Load `path` if it exists, otherwise start from defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Apply process environment overrides:
    ///
    /// - `ABYSM_DATA_DIR`, `ABYSM_DB_PATH`
    /// - `ABYSM_FLAVOR_API_KEY` (falls back to `GEMINI_API_KEY`)
    /// - `ABYSM_FLAVOR_TEMPERATURE`, `ABYSM_FLAVOR_THINKING_BUDGET`
    /// - `ABYSM_PLAYER_ID`, `ABYSM_PLAYER_NAME`
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Config::apply_env_overrides`] with an injectable lookup.
    /// Malformed numbers are logged and the previous value kept.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("ABYSM_DATA_DIR") {
            self.storage.data_dir = v;
        }
        if let Some(v) = get("ABYSM_DB_PATH") {
            self.storage.db_path = Some(v);
        }
        if let Some(v) = get("ABYSM_FLAVOR_API_KEY").or_else(|| get("GEMINI_API_KEY")) {
            self.flavor.api_key = v;
        }
        if let Some(v) = get("ABYSM_FLAVOR_TEMPERATURE") {
            match v.trim().parse::<f32>() {
                Ok(t) => self.flavor.temperature = t,
                Err(_) => warn!("Ignoring malformed ABYSM_FLAVOR_TEMPERATURE '{}'", v),
            }
        }
        if let Some(v) = get("ABYSM_FLAVOR_THINKING_BUDGET") {
            match v.trim().parse::<i32>() {
                Ok(b) => self.flavor.thinking_budget = b,
                Err(_) => warn!("Ignoring malformed ABYSM_FLAVOR_THINKING_BUDGET '{}'", v),
            }
        }
        if let Some(v) = get("ABYSM_PLAYER_ID") {
            self.game.player_id = Some(v);
        }
        if let Some(v) = get("ABYSM_PLAYER_NAME") {
            self.game.default_player_name = v;
        }
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("map_width", self.game.map_width),
            ("map_height", self.game.map_height),
        ] {
            if value < 1 || value % 2 == 0 {
                return Err(anyhow!(
                    "game.{} must be a positive odd number (got {})",
                    label,
                    value
                ));
            }
        }
        if self.flavor.timeout_seconds == 0 {
            return Err(anyhow!("flavor.timeout_seconds must be at least 1"));
        }
        Ok(())
    }
}
