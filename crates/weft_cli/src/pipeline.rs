//! Shared helpers for CLI commands: locating and loading the application.

use std::path::{Path, PathBuf};

use tracing::debug;
use weft_app::{BaseApp, ComponentRegistry};
use weft_config::{AppConfig, CONFIG_FILE_NAME};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing `weft.toml`.
pub fn find_app_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE_NAME).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE_NAME} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the configuration named by `--config`, or the nearest `weft.toml`.
///
/// Returns the application directory together with the configuration.
pub fn load(global: &GlobalArgs) -> Result<(PathBuf, AppConfig), Box<dyn std::error::Error>> {
    let (root, config) = match &global.config {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                let root = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (root, weft_config::load_config_file(&path)?)
            } else {
                let config = weft_config::load_config(&path)?;
                (path, config)
            }
        }
        None => {
            let root = find_app_root(&std::env::current_dir()?)?;
            let config = weft_config::load_config(&root)?;
            (root, config)
        }
    };
    debug!(root = %root.display(), app = %config.app.name, "loaded configuration");
    Ok((root, config))
}

/// Loads the configuration and assembles the application.
pub fn assemble(global: &GlobalArgs) -> Result<(PathBuf, BaseApp), Box<dyn std::error::Error>> {
    let (root, config) = load(global)?;
    let app = BaseApp::new(config, &ComponentRegistry::with_library())?;
    Ok((root, app))
}
