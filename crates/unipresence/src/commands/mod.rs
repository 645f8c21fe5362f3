//! Command handlers.

pub mod check;
pub mod run;
pub mod status;

use unipresence_core::PresenceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load, validate and translate the config file selected by `--config`.
pub fn load_presence_config(global: &GlobalOpts) -> Result<PresenceConfig, CliError> {
    let path = global
        .config
        .clone()
        .unwrap_or_else(unipresence_config::config_path);
    tracing::debug!(path = %path.display(), "loading configuration");

    let cfg = unipresence_config::load_config_from(&path)
        .map_err(|e| CliError::from_config(e, &path))?;
    cfg.to_presence_config()
        .map_err(|e| CliError::from_config(e, &path))
}
