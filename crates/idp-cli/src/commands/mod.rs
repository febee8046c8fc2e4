//! CLI subcommands and the helpers they share.

pub mod analytics;
pub mod batch;
pub mod config;
pub mod export;
pub mod process;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::debug;

use idp_core::models::config::IdpConfig;

/// Image formats accepted as input.
pub const SUPPORTED_EXTENSIONS: [&str; 8] =
    ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// History location shared by the commands that read or write it.
#[derive(Args, Clone, Debug, Default)]
pub struct HistoryArgs {
    /// JSON-lines history file (overrides `history.path` from the config)
    #[arg(long)]
    pub history: Option<PathBuf>,
}

impl HistoryArgs {
    pub fn apply(&self, config: &mut IdpConfig) {
        if let Some(path) = &self.history {
            config.history.path = Some(path.clone());
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("idp")
        .join("config.json")
}

/// Load the configuration from `config_path`, the default location, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<IdpConfig> {
    if let Some(path) = config_path {
        return IdpConfig::from_file(Path::new(path))
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e));
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return Ok(IdpConfig::from_file(&default_path)?);
    }

    Ok(IdpConfig::default())
}

pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
