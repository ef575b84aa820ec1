//! TOML-based application configuration.
//!
//! Stores:
//! - Timer length, starting mode and sound preference
//! - Feedback server port, data file and static asset directory
//! - Feedback client target URL
//!
//! Configuration is stored at `~/.config/scatimer/config.toml`.
//! `PORT` and `VERCEL` in the environment take precedence over the file
//! for the server settings.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use super::feedback::FEEDBACK_FILE_NAME;
use crate::error::{ConfigError, Result};
use crate::timer::{Mode, TimerSettings, DEFAULT_TOTAL_SECONDS};

pub const DEFAULT_PORT: u16 = 3000;

/// Timer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_total_seconds")]
    pub total_seconds: u32,
    #[serde(default)]
    pub default_mode: Mode,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
}

/// Feedback server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Feedback log location. Defaults to `feedback.json` in the data dir.
    #[serde(default)]
    pub feedback_file: Option<PathBuf>,
    /// Directory served for non-API GET requests.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

/// Feedback client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
}

/// How the feedback API is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deployment {
    /// Own HTTP listener, persistent data file.
    Listener,
    /// Hosted by an external dispatcher, data file in the temp dir.
    Serverless,
}

impl Deployment {
    /// `VERCEL=1` selects the serverless variant.
    pub fn from_env() -> Self {
        Self::from_flag(std::env::var("VERCEL").ok().as_deref())
    }

    fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("1") => Deployment::Serverless,
            _ => Deployment::Listener,
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/scatimer/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

// Default functions
fn default_total_seconds() -> u32 {
    DEFAULT_TOTAL_SECONDS
}
fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_server_url() -> String {
    format!("http://localhost:{DEFAULT_PORT}")
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            total_seconds: default_total_seconds(),
            default_mode: Mode::Standard,
            sound_enabled: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            feedback_file: None,
            static_dir: None,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
        }
    }
}

impl TimerConfig {
    pub fn settings(&self) -> TimerSettings {
        TimerSettings {
            total_seconds: self.total_seconds,
            mode: self.default_mode,
            sound_enabled: self.sound_enabled,
        }
    }
}

impl ServerConfig {
    /// Port to listen on: `PORT` if set and valid, else the configured one.
    pub fn resolved_port(&self) -> u16 {
        self.port_with_override(std::env::var("PORT").ok().as_deref())
    }

    fn port_with_override(&self, env_port: Option<&str>) -> u16 {
        env_port
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(self.port)
    }

    /// Data file for the given deployment.
    pub fn feedback_path(&self, deployment: Deployment) -> PathBuf {
        match deployment {
            Deployment::Serverless => std::env::temp_dir().join(FEEDBACK_FILE_NAME),
            Deployment::Listener => self.feedback_file.clone().unwrap_or_else(|| {
                data_dir()
                    .map(|d| d.join(FEEDBACK_FILE_NAME))
                    .unwrap_or_else(|_| PathBuf::from(FEEDBACK_FILE_NAME))
            }),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let new_value = match existing {
                serde_json::Value::Bool(_) => serde_json::Value::Bool(
                    value
                        .parse::<bool>()
                        .map_err(|e| invalid(e.to_string()))?,
                ),
                serde_json::Value::Number(_) => serde_json::Value::Number(
                    value
                        .parse::<u64>()
                        .map_err(|e| invalid(e.to_string()))?
                        .into(),
                ),
                // Optional paths are null until first set.
                serde_json::Value::Null | serde_json::Value::String(_) => {
                    serde_json::Value::String(value.into())
                }
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
            };
            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                ConfigError::LoadFailed {
                    path: path.clone(),
                    message: e.to_string(),
                }
                .into()
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<()> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key and persist. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.apply(key, value)?;
        self.save()
    }

    /// Set a config value in memory only.
    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "using default configuration");
            Self::default()
        })
    }
}
