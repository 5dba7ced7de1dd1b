use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Overrides `storage.database-path`
pub const ENV_DATABASE_PATH: &str = "CEDI_DATABASE_PATH";

/// Search index application id
pub const ENV_ALGOLIA_APP_ID: &str = "ALGOLIA_APP_ID";

/// Search index write key
pub const ENV_ALGOLIA_API_KEY: &str = "ALGOLIA_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// Environment overrides are applied before validation, so a file without
/// credentials is valid as long as the environment supplies them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config = parse_config(&content)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Parses TOML text into a configuration without validating it
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Layers environment-provided settings over the parsed file
///
/// `lookup` resolves a variable name to its value; empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(path) = read(ENV_DATABASE_PATH) {
        config.storage.database_path = path;
    }
    if let Some(app_id) = read(ENV_ALGOLIA_APP_ID) {
        config.search_index.app_id = Some(app_id);
    }
    if let Some(api_key) = read(ENV_ALGOLIA_API_KEY) {
        config.search_index.api_key = Some(api_key);
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so operators can tell which configuration a running
/// process was started with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
