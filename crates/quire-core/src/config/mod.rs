//! Client configuration.
//!
//! Read from `<config dir>/quire/config.json` when present, then overridden by
//! environment variables (`SUPABASE_URL`, `SUPABASE_ANON_KEY`, `QUIRE_*`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::autosave::DEFAULT_AUTOSAVE_DELAY;
use crate::error::{Error, Result};
use crate::util::{is_http_url, non_blank};

const CONFIG_DIR_NAME: &str = "quire";
const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "notes.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    /// Session token for the signed-in user
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Local SQLite file; defaults to `notes.db` next to the config file
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub autosave_delay_ms: Option<u64>,
}

/// Remote settings once every required value is present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub anon_key: String,
    pub access_token: Option<String>,
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the file at `path` (missing is fine) and apply process env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a config file. A missing file yields the default config.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config.normalized())
    }

    /// Override fields from environment variables looked up through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |key: &str| non_blank(lookup(key));

        if let Some(url) = read("SUPABASE_URL") {
            self.supabase_url = Some(url);
        }
        if let Some(key) = read("SUPABASE_ANON_KEY") {
            self.supabase_anon_key = Some(key);
        }
        if let Some(token) = read("QUIRE_ACCESS_TOKEN") {
            self.access_token = Some(token);
        }
        if let Some(user) = read("QUIRE_USER_ID") {
            self.user_id = Some(user);
        }
        if let Some(name) = read("QUIRE_DISPLAY_NAME") {
            self.display_name = Some(name);
        }
        if let Some(path) = read("QUIRE_DATABASE_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(delay) = read("QUIRE_AUTOSAVE_DELAY_MS") {
            match delay.parse() {
                Ok(ms) => self.autosave_delay_ms = Some(ms),
                Err(error) => {
                    tracing::warn!("Ignoring QUIRE_AUTOSAVE_DELAY_MS={}: {}", delay, error);
                }
            }
        }
    }

    fn normalized(self) -> Self {
        Self {
            supabase_url: non_blank(self.supabase_url),
            supabase_anon_key: non_blank(self.supabase_anon_key),
            access_token: non_blank(self.access_token),
            user_id: non_blank(self.user_id),
            display_name: non_blank(self.display_name),
            database_path: self.database_path,
            autosave_delay_ms: self.autosave_delay_ms,
        }
    }

    pub fn autosave_delay(&self) -> Duration {
        self.autosave_delay_ms
            .map_or(DEFAULT_AUTOSAVE_DELAY, Duration::from_millis)
    }

    /// Local database path, falling back to the platform data directory
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(|| {
            dirs::data_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(DATABASE_FILE_NAME))
        })
    }

    /// Validated remote settings, or `None` when the remote is not configured
    pub fn remote(&self) -> Result<Option<RemoteSettings>> {
        let (Some(url), Some(anon_key)) = (
            non_blank(self.supabase_url.clone()),
            non_blank(self.supabase_anon_key.clone()),
        ) else {
            return Ok(None);
        };
        if !is_http_url(&url) {
            return Err(Error::InvalidInput(
                "supabase_url must include http:// or https://".to_string(),
            ));
        }
        Ok(Some(RemoteSettings {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
            access_token: non_blank(self.access_token.clone()),
        }))
    }
}
