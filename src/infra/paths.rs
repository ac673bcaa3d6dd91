// src/infra/paths.rs — Config locations
//
// CALAI_HOME overrides the config directory. Otherwise config lives in
// ~/.calai/. Session folders are always given explicitly on the CLI.

use directories::BaseDirs;
use std::path::PathBuf;

fn calai_home() -> Option<PathBuf> {
    std::env::var_os("CALAI_HOME").map(PathBuf::from)
}

/// Configuration directory: $CALAI_HOME/ or ~/.calai/
pub fn config_dir() -> Option<PathBuf> {
    if let Some(home) = calai_home() {
        return Some(home);
    }
    BaseDirs::new().map(|b| b.home_dir().join(".calai"))
}

/// Config file path, if a home directory can be determined.
pub fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}
