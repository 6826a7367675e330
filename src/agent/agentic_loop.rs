//! Agentic loop engine.
//!
//! Turns one question into one answer by alternating completion calls and
//! tool dispatches under a fixed round budget. Every outcome, including
//! provider failures and budget exhaustion, resolves to answer text.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::agent::client::{CompletionClient, OpenAiClient};
use crate::agent::conversation::Conversation;
use crate::agent::prompts::{self, preview};
use crate::agent::types::*;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tools::{ToolCall, ToolRegistry};

/// Round budget shared by every run
pub const MAX_ITERATIONS: u32 = 10;

/// Answer returned when the budget runs out before a final answer
pub const EXHAUSTED_MESSAGE: &str = "Max iterations reached without completing the agent task";

/// Prefix of the answer returned when a completion call fails
pub const ERROR_ANSWER_PREFIX: &str = "Error during processing: ";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configurable limits for the agentic loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    /// Maximum completion rounds before the loop gives up.
    pub max_iterations: u32,
    /// System prompt override. `None` picks a prompt based on whether tools
    /// are available.
    pub system_prompt: Option<String>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            system_prompt: None,
        }
    }
}

// ---------------------------------------------------------------------------
// State and trace types
// ---------------------------------------------------------------------------

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// About to ask the model for its next turn.
    AwaitingModel,
    /// Answering the tool calls from the latest assistant turn.
    DispatchingTools,
    /// The model produced a final answer.
    Done,
    /// The round budget ran out.
    Exhausted,
}

/// How the loop finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The model returned a turn without tool calls.
    Completed,
    /// Hit `max_iterations` without a final answer.
    MaxIterationsExceeded,
    /// A completion call failed; the run was aborted.
    Failed(String),
}

/// The result of executing a single tool call.
#[derive(Debug, Clone)]
pub struct ToolObservation {
    pub call_id: String,
    pub content: String,
    pub duration_ms: u64,
}

/// A recorded action (tool call) and its observation (result).
#[derive(Debug, Clone)]
pub struct ToolAction {
    pub tool_name: String,
    pub arguments: Value,
    pub observation: ToolObservation,
}

/// One round of the agentic loop.
#[derive(Debug, Clone)]
pub struct LoopStep {
    pub iteration: u32,
    /// Text content produced by the model in this round (may be empty).
    pub thought: String,
    /// Tool calls executed in this round, in emission order.
    pub actions: Vec<ToolAction>,
    pub finish_reason: Option<String>,
    pub timestamp: Instant,
}

/// Full trace of a loop execution.
#[derive(Debug, Clone)]
pub struct LoopTrace {
    pub steps: Vec<LoopStep>,
    pub outcome: LoopOutcome,
    pub total_duration_ms: u64,
}

// ---------------------------------------------------------------------------
// Callback trait
// ---------------------------------------------------------------------------

/// Hooks for front ends that want to show progress. Purely observational:
/// nothing a callback does changes control flow.
#[async_trait]
pub trait LoopCallback: Send + Sync {
    /// Human-readable progress, once per round ("Processing... Iteration N").
    async fn on_status(&self, _status: &str) {}
    /// Called after each individual tool has been executed.
    async fn on_tool_executed(&self, _tool_name: &str, _observation: &ToolObservation) {}
    /// Called once after the loop terminates; clear status indicators here.
    async fn on_loop_complete(&self, _trace: &LoopTrace) {}
}

/// Default no-op callback.
#[derive(Debug, Default)]
pub struct NoOpCallback;

#[async_trait]
impl LoopCallback for NoOpCallback {}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// The result of running the agentic loop.
#[derive(Debug)]
pub struct AgentLoopOutput {
    /// The answer text shown to the user.
    pub response: String,
    pub outcome: LoopOutcome,
    /// Completion rounds performed.
    pub iterations: u32,
    /// Tool calls dispatched across all rounds.
    pub tool_calls: u32,
    pub trace: LoopTrace,
    /// The conversation as it stood when the loop ended.
    pub final_messages: Vec<Message>,
    pub total_usage: Usage,
}

// ---------------------------------------------------------------------------
// Agent loop
// ---------------------------------------------------------------------------

/// Orchestrates a completion client and a tool registry.
///
/// Holds no per-question state: each `run` owns a fresh `Conversation`.
pub struct AgentLoop {
    client: Arc<dyn CompletionClient>,
    tools: Arc<ToolRegistry>,
    tool_definitions: Vec<ToolDefinition>,
    config: LoopConfig,
}

impl AgentLoop {
    /// Create a loop over the given client and tools
    pub fn new(client: Arc<dyn CompletionClient>, tools: Arc<ToolRegistry>, config: LoopConfig) -> Self {
        let tool_definitions = tools.definitions();
        Self {
            client,
            tools,
            tool_definitions,
            config,
        }
    }

    /// Wire the OpenAI-compatible client and the configured tools
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(config.llm.clone())?;
        info!(
            "Completion client initialized: model={}, temperature={}",
            client.model(),
            config.llm.temperature
        );
        let tools = ToolRegistry::from_config(&config.search);
        Ok(Self::new(Arc::new(client), Arc::new(tools), LoopConfig::default()))
    }

    /// Tool catalog offered to the model on every round
    pub fn tool_definitions(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    /// Answer a question. Never fails: errors come back as answer text.
    pub async fn run(&self, question: &str) -> String {
        self.run_with_callback(question, &NoOpCallback).await.response
    }

    /// Answer a question, reporting progress to `callback`.
    pub async fn run_with_callback<C: LoopCallback + ?Sized>(
        &self,
        question: &str,
        callback: &C,
    ) -> AgentLoopOutput {
        let loop_start = Instant::now();
        info!("Agent started with user input: {}...", preview(question, 100));

        let system_prompt = self.config.system_prompt.clone().unwrap_or_else(|| {
            prompts::system_prompt(!self.tool_definitions.is_empty()).to_string()
        });
        let mut conversation = Conversation::new(system_prompt, question);
        debug!("Initial messages count: {}", conversation.len());

        let mut state = LoopState::AwaitingModel;
        let mut iteration: u32 = 0;
        let mut tool_calls_made: u32 = 0;
        let mut pending: Vec<ToolCall> = Vec::new();
        let mut current_step: Option<LoopStep> = None;
        let mut steps: Vec<LoopStep> = Vec::new();
        let mut total_usage = Usage::default();
        let mut response = String::new();
        let mut outcome = LoopOutcome::Completed;

        loop {
            debug!("Loop state: {:?}", state);
            match state {
                LoopState::AwaitingModel => {
                    if iteration >= self.config.max_iterations {
                        warn!(
                            "Agent reached max iterations ({}) without completion",
                            self.config.max_iterations
                        );
                        response = EXHAUSTED_MESSAGE.to_string();
                        outcome = LoopOutcome::MaxIterationsExceeded;
                        state = LoopState::Exhausted;
                        continue;
                    }

                    iteration += 1;
                    let iter_start = Instant::now();
                    info!("Starting iteration {}/{}", iteration, self.config.max_iterations);
                    callback
                        .on_status(&format!("Processing... Iteration {}", iteration))
                        .await;

                    debug_assert!(
                        !conversation.has_pending_calls(),
                        "completion requested with unanswered tool calls"
                    );
                    debug!("Invoking LLM with {} messages", conversation.len());
                    let completion = match self
                        .client
                        .complete(conversation.messages(), &self.tool_definitions)
                        .await
                    {
                        Ok(c) => c,
                        Err(e) => {
                            error!("Error during iteration {}: {}", iteration, e);
                            response = format!("{}{}", ERROR_ANSWER_PREFIX, e);
                            outcome = LoopOutcome::Failed(e.to_string());
                            break;
                        }
                    };

                    if let Some(ref usage) = completion.usage {
                        total_usage.accumulate(usage);
                    }
                    debug!(
                        "LLM response received, tool_calls count: {}",
                        completion.tool_calls.len()
                    );

                    let mut step = LoopStep {
                        iteration,
                        thought: completion.content.clone(),
                        actions: Vec::new(),
                        finish_reason: completion.finish_reason.clone(),
                        timestamp: iter_start,
                    };

                    if completion.is_final() {
                        info!("Agent completed successfully at iteration {}", iteration);
                        info!("Final answer length: {} characters", completion.content.len());
                        response = completion.content;
                        step.thought = response.clone();
                        steps.push(step);
                        state = LoopState::Done;
                        continue;
                    }

                    if let Err(e) =
                        conversation.push_tool_calls(completion.content, &completion.tool_calls)
                    {
                        response = self.abort(&mut outcome, iteration, e);
                        break;
                    }
                    debug!("Assistant message added, total messages: {}", conversation.len());

                    pending = completion.tool_calls;
                    current_step = Some(step);
                    state = LoopState::DispatchingTools;
                }

                LoopState::DispatchingTools => {
                    let mut actions = Vec::with_capacity(pending.len());

                    for (idx, call) in pending.drain(..).enumerate() {
                        tool_calls_made += 1;
                        info!("Processing tool call {}: {}", idx + 1, call.name);
                        debug!("Tool call arguments: {}", call.arguments);

                        let tool_start = Instant::now();
                        let content = self.tools.invoke(&call).await;
                        let duration_ms = tool_start.elapsed().as_millis() as u64;
                        debug!("Tool result length: {} characters", content.len());

                        if let Err(e) = conversation.push_tool_result(&call.id, content.clone()) {
                            response = self.abort(&mut outcome, iteration, e);
                            break;
                        }
                        debug!("Tool result message added, total messages: {}", conversation.len());

                        let observation = ToolObservation {
                            call_id: call.id,
                            content,
                            duration_ms,
                        };
                        callback.on_tool_executed(&call.name, &observation).await;

                        actions.push(ToolAction {
                            tool_name: call.name,
                            arguments: call.arguments,
                            observation,
                        });
                    }

                    if let Some(mut step) = current_step.take() {
                        step.actions = actions;
                        steps.push(step);
                    }

                    if matches!(outcome, LoopOutcome::Failed(_)) {
                        break;
                    }
                    state = LoopState::AwaitingModel;
                }

                LoopState::Done | LoopState::Exhausted => break,
            }
        }

        let total_duration_ms = loop_start.elapsed().as_millis() as u64;

        let trace = LoopTrace {
            steps,
            outcome: outcome.clone(),
            total_duration_ms,
        };

        callback.on_loop_complete(&trace).await;

        info!(
            "Agentic loop finished: outcome={:?}, iterations={}, tool_calls={}, duration={}ms",
            outcome, iteration, tool_calls_made, total_duration_ms,
        );

        AgentLoopOutput {
            response,
            outcome,
            iterations: iteration,
            tool_calls: tool_calls_made,
            trace,
            final_messages: conversation.into_messages(),
            total_usage,
        }
    }

    /// Record a bookkeeping failure as the run's outcome and build its answer.
    fn abort(&self, outcome: &mut LoopOutcome, iteration: u32, e: Error) -> String {
        error!("Error during iteration {}: {}", iteration, e);
        *outcome = LoopOutcome::Failed(e.to_string());
        format!("{}{}", ERROR_ANSWER_PREFIX, e)
    }
}

/// Reject blank questions before they reach the loop.
pub fn validate_question(question: &str) -> Result<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("Please enter a question".to_string()));
    }
    Ok(trimmed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
