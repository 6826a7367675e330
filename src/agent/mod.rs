//! Agent module - LLM logic and the question-answering loop
//!
//! This module handles all AI-related functionality including:
//! - The `CompletionClient` seam and its OpenAI-compatible implementation
//! - Per-question conversation bookkeeping
//! - System prompts
//! - The bounded tool-calling loop

mod agentic_loop;
mod client;
mod conversation;
pub mod prompts;
mod types;

pub use agentic_loop::{
    validate_question, AgentLoop, AgentLoopOutput, LoopCallback, LoopConfig, LoopOutcome,
    LoopState, LoopStep, LoopTrace, NoOpCallback, ToolAction, ToolObservation,
    ERROR_ANSWER_PREFIX, EXHAUSTED_MESSAGE, MAX_ITERATIONS,
};
pub use client::{Completion, CompletionClient, OpenAiClient};
pub use conversation::Conversation;
pub use types::*;
