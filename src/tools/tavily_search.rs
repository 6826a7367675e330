//! Tavily Search tool
//!
//! Web search using the Tavily Search API. Requires a Tavily API key; the
//! tool is only constructed when one is configured.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use super::format_search_results;
use super::traits::{Tool, ToolResult};
use super::SearchResult;
use crate::config::SearchConfig;
use crate::{Error, Result};

/// Prefix of every failure message this tool returns
pub const SEARCH_ERROR_PREFIX: &str = "Search error: ";

#[derive(Debug, Serialize)]
struct TavilySearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u8,
}

/// Tavily Search API response structures
#[derive(Debug, Deserialize)]
struct TavilySearchResponse {
    #[serde(default)]
    results: Vec<TavilySearchResult>,
}

#[derive(Debug, Deserialize)]
struct TavilySearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Arguments the model passes to `tavily_search`
#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
}

/// Tavily Search tool for web searching
pub struct TavilySearchTool {
    client: Client,
    api_key: SecretString,
    base_url: String,
    max_results: u8,
}

impl TavilySearchTool {
    /// Create the tool if the configuration carries a credential
    pub fn from_config(config: &SearchConfig) -> Option<Self> {
        if !config.is_enabled() {
            return None;
        }
        let api_key = config.api_key.clone()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Some(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    /// Perform a web search
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!("{}/search", self.base_url);

        let request = TavilySearchRequest {
            api_key: self.api_key.expose_secret(),
            query,
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Provider(format!("Tavily search request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text: String = response.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Tavily search failed with status {}: {}",
                status, text
            )));
        }

        let tavily_response: TavilySearchResponse = response
            .json::<TavilySearchResponse>()
            .await
            .map_err(|e| Error::Provider(format!("Failed to parse Tavily response: {}", e)))?;

        let results = tavily_response
            .results
            .into_iter()
            .take(self.max_results as usize)
            .map(|r| SearchResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect();

        Ok(results)
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        "tavily_search"
    }

    fn description(&self) -> &str {
        "Search the internet for current information about a topic using Tavily Search. \
         Use this to find the latest news, events, and information about any topic."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let SearchArgs { query } = serde_json::from_value(args)
            .map_err(|_| Error::InvalidInput("Missing 'query' parameter".to_string()))?;
        if query.trim().is_empty() {
            return Err(Error::InvalidInput("Missing 'query' parameter".to_string()));
        }

        // Startup gating already keeps a key-less tool out of the registry.
        if self.api_key.expose_secret().is_empty() {
            let err = Error::ToolUnavailable(self.name().to_string());
            error!("{}", err);
            return Ok(ToolResult::failure(format!(
                "{}search tool is not configured",
                SEARCH_ERROR_PREFIX
            )));
        }

        info!("Tavily search initiated with query: {}", query);

        match self.search(&query).await {
            Ok(results) => {
                if results.is_empty() {
                    Ok(ToolResult::success("No results found for the query."))
                } else {
                    let formatted = format_search_results(&results);
                    info!(
                        "Tavily search completed successfully, results length: {}",
                        formatted.len()
                    );
                    Ok(ToolResult::success(formatted))
                }
            }
            Err(e) => {
                error!("Tavily search failed: {}", e);
                let detail = match e {
                    Error::Provider(msg) => msg,
                    other => other.to_string(),
                };
                Ok(ToolResult::failure(format!("{}{}", SEARCH_ERROR_PREFIX, detail)))
            }
        }
    }
}
