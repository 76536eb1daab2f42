// rest_api/src/config.rs

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use lib::storage_engine::StorageConfig;

pub const DEFAULT_REST_API_PORT: u16 = 8082;
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production-please-32b";

/// Represents the configuration for the REST API server itself.
#[derive(Debug, Clone, Deserialize)]
pub struct RestApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// JSON array of users added to the directory when the server starts.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

/// Token settings shared with the authentication layer.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

// Define a wrapper struct to match the 'rest_api:' key in the YAML config.
#[derive(Debug, Deserialize)]
struct RestApiConfigWrapper {
    rest_api: RestApiConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_REST_API_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> u64 {
    24
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for RestApiConfig {
    fn default() -> Self {
        RestApiConfig {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            auth: AuthConfig::default(),
            storage: StorageConfig::default(),
            seed_file: None,
        }
    }
}

impl RestApiConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.auth.jwt_secret == DEFAULT_JWT_SECRET
    }
}

/// `rest_api_config.yaml` next to this crate's manifest.
pub fn default_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("rest_api_config.yaml")
}

/// Parses the YAML text of a configuration file.
pub fn parse_rest_api_config(content: &str) -> Result<RestApiConfig> {
    let wrapper: RestApiConfigWrapper = serde_yaml2::from_str(content)
        .map_err(|e| anyhow::anyhow!("Failed to parse REST API config: {}", e))?;
    Ok(wrapper.rest_api)
}

/// Loads the REST API configuration.
///
/// Reads `config_file_path` (or the default path). A missing file yields the
/// built-in defaults; environment variables are applied on top either way.
/// Runs before logging is initialised, so it reports nothing itself.
pub fn load_rest_api_config(config_file_path: Option<PathBuf>) -> Result<RestApiConfig> {
    let path_to_use = config_file_path.unwrap_or_else(default_config_path);
    let mut config = read_config_file(&path_to_use)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<RestApiConfig> {
    if !path.exists() {
        return Ok(RestApiConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read REST API config file {}", path.display()))?;
    parse_rest_api_config(&content)
        .with_context(|| format!("Invalid REST API config file {}", path.display()))
}

/// Applies `PRESCRIPTIONS_*` overrides, looking variables up through `lookup`.
pub fn apply_env_overrides<F>(config: &mut RestApiConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("PRESCRIPTIONS_HOST") {
        config.host = host;
    }
    if let Some(port) = lookup("PRESCRIPTIONS_PORT") {
        config.port = port
            .parse()
            .with_context(|| format!("PRESCRIPTIONS_PORT is not a valid port: {}", port))?;
    }
    if let Some(secret) = lookup("PRESCRIPTIONS_JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(dir) = lookup("PRESCRIPTIONS_DATA_DIR") {
        config.storage.data_directory = PathBuf::from(dir);
    }
    if let Some(path) = lookup("PRESCRIPTIONS_SEED_FILE") {
        config.seed_file = Some(PathBuf::from(path));
    }
    Ok(())
}
