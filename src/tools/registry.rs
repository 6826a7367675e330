//! Tool registry - manages available tools for the agent

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::agent::ToolDefinition;
use crate::config::SearchConfig;

use super::tavily_search::TavilySearchTool;
use super::traits::{Tool, ToolCall};

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Build the registry from startup configuration.
    ///
    /// The search tool is registered only when its credential is present, so
    /// a missing key means the model is never offered the tool.
    pub fn from_config(search: &SearchConfig) -> Self {
        let mut registry = Self::new();

        match TavilySearchTool::from_config(search) {
            Some(tool) => registry.register(tool),
            None => info!("TAVILY_API_KEY not set, web search disabled"),
        }

        info!("Tools registered: {} tool(s)", registry.count());
        for name in registry.names() {
            debug!("  - Tool: {}", name);
        }

        registry
    }

    /// Register a tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Get all tool definitions, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        defs
    }

    /// Invoke a tool call. Always yields text: unknown names, argument
    /// errors and tool failures all become the result string.
    pub async fn invoke(&self, call: &ToolCall) -> String {
        let Some(tool) = self.get(&call.name) else {
            warn!("Unknown tool encountered: {}", call.name);
            return format!("Unknown tool: {}", call.name);
        };

        match tool.execute(call.arguments.clone()).await {
            Ok(result) => {
                if !result.success {
                    warn!("Tool {} reported failure", call.name);
                }
                result.to_string()
            }
            Err(e) => {
                warn!("Tool {} failed: {}", call.name, e);
                format!("Tool error: {}", e)
            }
        }
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are available
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List tool names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}
