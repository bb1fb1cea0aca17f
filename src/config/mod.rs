use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::report::Period;

pub const DEFAULT_BASE_URL: &str = "https://api.clockify.me/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeFormat {
    #[default]
    HoursMinutes,  // "3h 15m"
    Decimal,       // "3.25h"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub workspace_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub time_format: TimeFormat,
    #[serde(default)]
    pub default_period: Period,
    #[serde(default = "default_true")]
    pub fill_empty_days: bool,
    /// Environment values; they win over the fields above and are never saved
    #[serde(skip)]
    overrides: Overrides,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Overrides {
    api_key: Option<String>,
    workspace_id: Option<String>,
    user_id: Option<String>,
    base_url: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_true() -> bool {
    true
}

fn default_font_scale() -> f32 {
    1.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            workspace_id: String::new(),
            user_id: String::new(),
            base_url: default_base_url(),
            font_scale: 1.0,
            time_format: TimeFormat::HoursMinutes,
            default_period: Period::Week,
            fill_empty_days: true,
            overrides: Overrides::default(),
        }
    }
}

impl Config {
    /// Load the saved config, then let the environment override credentials.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            serde_json::from_str(&contents)
                .context("Failed to parse config file")?
        } else {
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = self.to_json()?;
        fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write {}", config_path.display()))?;

        log::info!("Saved config to {}", config_path.display());
        Ok(())
    }

    /// Apply `CLOCKIFY_API_KEY`, `WORKSPACE_ID`, `USER_ID` and `CLOCKIFY_BASE_URL`.
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        self.overrides = Overrides {
            api_key: get("CLOCKIFY_API_KEY"),
            workspace_id: get("WORKSPACE_ID"),
            user_id: get("USER_ID"),
            base_url: get("CLOCKIFY_BASE_URL"),
        };
    }

    /// True when any connection value comes from the environment
    pub fn has_overrides(&self) -> bool {
        self.overrides != Overrides::default()
    }

    /// Persisted settings only; environment overrides are left out
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// API key in effect, environment first
    pub fn api_key(&self) -> Option<&str> {
        self.overrides
            .api_key
            .as_deref()
            .or(self.api_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn workspace_id(&self) -> &str {
        self.overrides.workspace_id.as_deref().unwrap_or(&self.workspace_id)
    }

    pub fn user_id(&self) -> &str {
        self.overrides.user_id.as_deref().unwrap_or(&self.user_id)
    }

    pub fn is_configured(&self) -> bool {
        !self.workspace_id().is_empty() && !self.user_id().is_empty() && self.api_key().is_some()
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "tallyboard", "tallyboard")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    pub fn api_base(&self) -> String {
        let base = self
            .overrides
            .base_url
            .as_deref()
            .unwrap_or(&self.base_url)
            .trim()
            .trim_end_matches('/');
        if base.is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            base.to_string()
        }
    }
}
