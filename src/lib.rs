//! # AskAgent
//!
//! A small question-answering assistant: a question goes to an LLM, which
//! may call a web search tool over a bounded number of rounds before
//! answering. The answer is streamed back character by character.
//!
//! ## Layout
//!
//! - [`agent`]: completion client, conversation, and the agentic loop
//! - [`tools`]: tool trait, registry, and the Tavily search tool
//! - [`config`]: layered configuration built once at startup
//! - [`logging`]: tracing subscriber setup
//! - [`typewriter`]: character streaming for the front ends

pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod tools;
pub mod typewriter;

pub use config::Config;
pub use error::{Error, Result};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const NAME: &str = env!("CARGO_PKG_NAME");
