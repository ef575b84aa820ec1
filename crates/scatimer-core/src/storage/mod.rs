mod config;
pub mod feedback;

pub use config::{ClientConfig, Config, Deployment, ServerConfig, TimerConfig, DEFAULT_PORT};
pub use feedback::FeedbackStore;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/scatimer[-dev]/` based on SCATIMER_ENV.
///
/// Set SCATIMER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SCATIMER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("scatimer-dev")
    } else {
        base_dir.join("scatimer")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
