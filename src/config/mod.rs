//! Configuration module
//!
//! - types.rs: Configuration types and validation
//! - io.rs: Layered loading from file and environment
//! - paths.rs: Configuration file paths
//!
//! A `Config` is built once at startup and handed to constructors by
//! reference; nothing inside the agent loop reads the environment.

mod io;
mod paths;
mod types;

pub use types::{Config, LlmConfig, LogConfig, LogFormat, SearchConfig, UiConfig};

pub use io::{apply_env_overrides, apply_overrides_from, load_config, load_config_from_path};
pub use paths::{config_dir, config_path};
