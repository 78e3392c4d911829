//! Configuration file discovery.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://clinicaltrials.gov/api/v2"
//! site_url = "https://clinicaltrials.gov"
//! page_size = 20
//! timeout_secs = 30
//!
//! [rate_limits]
//! request_delay_ms = 1500
//!
//! [downloads]
//! default_path = "./clinical_trial_documents"
//! search_multiplier = 2
//! scan_multiplier = 50
//! write_manifest = true
//! ```

use std::path::{Path, PathBuf};

use super::ConfigError;

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "trial-docs.toml";

/// Directory under the platform config dir
pub const CONFIG_DIR_NAME: &str = "trial-docs";

/// File name inside [`CONFIG_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Locate the config file to load.
///
/// An explicit path must exist. Otherwise `./trial-docs.toml` is tried, then
/// `<config dir>/trial-docs/config.toml`; finding neither is not an error.
pub fn find_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(Some(path.to_path_buf()));
        }
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    Ok(search_locations(Path::new("."), dirs::config_dir().as_deref()))
}

fn search_locations(cwd: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    let local = cwd.join(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    let global = config_dir?.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
    global.is_file().then_some(global)
}
