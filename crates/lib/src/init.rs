//! Initialize the configuration directory: create ~/.triptt and a starter config.json.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Starter config: credentials left empty so the `MESSENGER_*` env vars can supply them.
static DEFAULT_CONFIG: &str = r#"{
  "gateway": {
    "bind": "127.0.0.1",
    "port": 8080
  },
  "messenger": {
    "pageAccessToken": null,
    "appSecret": null,
    "verifyToken": null
  }
}
"#;

/// Create the config directory and write a starter `config.json` if missing.
/// Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, DEFAULT_CONFIG)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}
