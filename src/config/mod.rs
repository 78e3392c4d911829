//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TRIAL_DOCS_*` environment variables (sections separated by `__`, e.g.
//! `TRIAL_DOCS_RATE_LIMITS__REQUEST_DELAY_MS=0`). Command-line flags are
//! applied on top by the binary.

mod file_config;

pub use file_config::{find_config_file, CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOCAL_CONFIG_FILE};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sources::{CLINICALTRIALS_API_BASE, CLINICALTRIALS_SITE};
use crate::utils::{validate_url, DEFAULT_USER_AGENT};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "TRIAL_DOCS";

/// Largest page the registry serves
pub const MAX_PAGE_SIZE: usize = 1000;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Registry endpoints and HTTP settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Rate limiting settings
    #[serde(default)]
    pub rate_limits: RateLimitConfig,

    /// Download settings
    #[serde(default)]
    pub downloads: DownloadConfig,
}

/// Registry endpoints and HTTP settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Public site; also serves uploaded documents
    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            site_url: default_site_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    CLINICALTRIALS_API_BASE.to_string()
}

fn default_site_url() -> String {
    CLINICALTRIALS_SITE.to_string()
}

fn default_page_size() -> usize {
    20
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Rate limiting configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between requests; 0 disables pacing
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: default_request_delay_ms(),
        }
    }
}

// ~50 requests per minute
fn default_request_delay_ms() -> u64 {
    1500
}

/// Download configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default output directory
    #[serde(default = "default_download_dir")]
    pub default_path: PathBuf,

    /// Matches searched for per requested pair
    #[serde(default = "default_search_multiplier")]
    pub search_multiplier: usize,

    /// Studies examined per searched match before giving up
    #[serde(default = "default_scan_multiplier")]
    pub scan_multiplier: usize,

    /// Write `manifest.json` after a successful run
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            default_path: default_download_dir(),
            search_multiplier: default_search_multiplier(),
            scan_multiplier: default_scan_multiplier(),
            write_manifest: true,
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./clinical_trial_documents")
}

fn default_search_multiplier() -> usize {
    2
}

fn default_scan_multiplier() -> usize {
    50
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Check values that deserialize fine but make no sense
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url(&self.api.base_url)
            .map_err(|e| ConfigError::Invalid(format!("api.base_url: {}", e)))?;
        validate_url(&self.api.site_url)
            .map_err(|e| ConfigError::Invalid(format!("api.site_url: {}", e)))?;

        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Invalid(format!(
                "api.page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.downloads.search_multiplier == 0 || self.downloads.scan_multiplier == 0 {
            return Err(ConfigError::Invalid(
                "downloads multipliers must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Render as TOML, in the same shape the config file uses
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to render configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from defaults, an optional file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    build_config(path, environment())
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn build_config(path: Option<&Path>, env: config::Environment) -> Result<Config, ConfigError> {
    let defaults = config::Config::try_from(&Config::default())?;
    let mut builder = config::Config::builder().add_source(defaults);

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        tracing::debug!(path = %path.display(), "loading config file");
        builder = builder.add_source(
            config::File::from(path)
                .format(config::FileFormat::Toml)
                .required(true),
        );
    }

    let settings = builder.add_source(env).build()?;
    let config: Config = settings.try_deserialize()?;
    config.validate()?;
    Ok(config)
}
