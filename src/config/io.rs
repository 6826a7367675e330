//! Configuration I/O - Loading configuration
//!
//! Handles reading configuration from files and environment variables.

use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;

use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Defaults
/// 2. Config file (`config.toml`, or JSON5 by extension) if it exists
/// 3. Environment variables (a `.env` file is loaded first, without
///    overriding variables already set in the process)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        tracing::debug!("Loading config file {}", config_path.display());
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    dotenvy::dotenv().ok();
    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    // Detect format by extension
    let config: Config = if path.extension().map_or(false, |ext| ext == "json") {
        json5::from_str(&content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        // Try TOML first, then JSON5
        toml::from_str(&content)
            .or_else(|_| json5::from_str(&content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply process environment variable overrides to an existing config.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides from an arbitrary key lookup.
///
/// Unparseable numeric values are ignored and the previous value is kept.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Completion provider
    if let Some(key) = lookup("OPENAI_API_KEY") {
        config.llm.api_key = SecretString::from(key);
    }
    if let Some(model) = lookup("OPENAI_MODEL") {
        config.llm.model = model;
    }
    if let Some(url) = lookup("OPENAI_BASE_URL") {
        config.llm.base_url = url;
    }
    if let Some(v) = lookup("OPENAI_TEMPERATURE").and_then(|s| s.parse().ok()) {
        config.llm.temperature = v;
    }
    if let Some(v) = lookup("OPENAI_TIMEOUT").and_then(|s| s.parse().ok()) {
        config.llm.timeout_secs = v;
    }

    // Search tool
    if let Some(key) = lookup("TAVILY_API_KEY") {
        config.search.api_key = Some(SecretString::from(key));
    }
    if let Some(url) = lookup("TAVILY_BASE_URL") {
        config.search.base_url = url;
    }
    if let Some(v) = lookup("TAVILY_MAX_RESULTS").and_then(|s| s.parse().ok()) {
        config.search.max_results = v;
    }

    // Logging
    if let Some(level) = lookup("RUST_LOG") {
        config.log.level = level;
    }
    if let Some(v) = lookup("LOG_FORMAT").and_then(|s| s.parse().ok()) {
        config.log.format = v;
    }
    if let Some(file) = lookup("LOG_FILE") {
        config.log.file = if file.is_empty() {
            None
        } else {
            Some(file.into())
        };
    }

    // Front ends
    if let Some(ms) = lookup("STREAM_DELAY_MS").and_then(|s| s.parse().ok()) {
        config.ui.stream_delay = Duration::from_millis(ms);
    }
    if let Some(bind) = lookup("ASKAGENT_BIND") {
        config.ui.bind = bind;
    }
    if let Some(v) = lookup("ASKAGENT_PORT").and_then(|s| s.parse().ok()) {
        config.ui.port = v;
    }
}
