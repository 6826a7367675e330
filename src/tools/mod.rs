//! Tools module - tool system for agent capabilities
//!
//! Each tool implements the `Tool` trait and is registered into a
//! `ToolRegistry`, which offers its definitions to the LLM for function
//! calling and dispatches the calls the model makes.
//!
//! ## Built-in Tools
//!
//! - **tavily_search**: Web search via the Tavily API (requires API key)

mod registry;
mod tavily_search;
mod traits;

// Core trait and types
pub use traits::{Tool, ToolCall, ToolResult};

// Registry
pub use registry::ToolRegistry;

// Built-in tools
pub use tavily_search::{TavilySearchTool, SEARCH_ERROR_PREFIX};

use serde::{Deserialize, Serialize};

/// A search result from any provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the page
    pub title: String,
    /// URL of the page
    pub url: String,
    /// Snippet or description
    pub snippet: String,
}

/// Format search results for display
pub(crate) fn format_search_results(results: &[SearchResult]) -> String {
    let mut output = String::new();

    for (i, result) in results.iter().enumerate() {
        output.push_str(&format!(
            "{}. **{}**\n   URL: {}\n   {}\n\n",
            i + 1,
            result.title,
            result.url,
            result.snippet
        ));
    }

    output
}
