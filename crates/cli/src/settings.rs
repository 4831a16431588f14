use std::path::{Path, PathBuf};

use sitebook_recon::ReconcileConfig;

use crate::exit_codes;
use crate::CliError;

/// Default config location: `<config dir>/sitebook/clean-templates.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sitebook")
        .join("clean-templates.toml")
}

/// Explicit path > default path if it exists > built-in defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ReconcileConfig, CliError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_config_path();
            if !p.exists() {
                return Ok(ReconcileConfig::default());
            }
            p
        }
    };

    tracing::debug!(path = %path.display(), "loading config");
    ReconcileConfig::load(&path).map_err(|e| CliError {
        code: exit_codes::EXIT_INVALID_CONFIG,
        message: e.to_string(),
        hint: Some(format!("check {}", path.display())),
    })
}
