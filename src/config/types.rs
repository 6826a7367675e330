//! Core configuration types
//!
//! Every section deserializes with per-field defaults so a partial config
//! file (or none at all) still yields a usable `Config`.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Completion provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Web search tool settings
    #[serde(default)]
    pub search: SearchConfig,
    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
    /// Front-end settings
    #[serde(default)]
    pub ui: UiConfig,
}

impl Config {
    /// Validate that all required configuration is present and sane
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.expose_secret().is_empty() {
            return Err(Error::Config("OPENAI_API_KEY is required".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.search.max_results == 0 {
            return Err(Error::Config(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// OpenAI-compatible completion provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key
    #[serde(default = "default_secret")]
    pub api_key: SecretString,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Base URL of the chat completions API
    #[serde(default = "default_llm_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            api_key: default_secret(),
            model: default_model(),
            temperature: default_temperature(),
            base_url: default_llm_url(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

/// Tavily search configuration.
///
/// The tool is only offered to the model when `api_key` is present; this is
/// decided once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// API key (absent = search disabled)
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL of the search API
    #[serde(default = "default_search_url")]
    pub base_url: String,
    /// Maximum number of results per query
    #[serde(default = "default_max_results")]
    pub max_results: u8,
    /// Request timeout in seconds
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl SearchConfig {
    /// Whether a usable credential is configured
    pub fn is_enabled(&self) -> bool {
        self.api_key
            .as_ref()
            .map(|k| !k.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            api_key: None,
            base_url: default_search_url(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_url() -> String {
    "https://api.tavily.com".to_string()
}

fn default_max_results() -> u8 {
    5
}

fn default_search_timeout() -> u64 {
    30
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(Error::Config(format!(
                "Invalid log format: {}. Valid options: pretty, json",
                s
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level filter, used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: LogFormat,
    /// File that receives a copy of every log line (None = stdout only)
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
            format: LogFormat::default(),
            file: default_log_file(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("agent_app.log"))
}

/// Front-end configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    /// Delay between characters when typing out an answer
    #[serde(default = "default_stream_delay", with = "humantime_serde")]
    pub stream_delay: Duration,
    /// Web server bind address
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Web server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            stream_delay: default_stream_delay(),
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_stream_delay() -> Duration {
    Duration::from_millis(10)
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8501
}
