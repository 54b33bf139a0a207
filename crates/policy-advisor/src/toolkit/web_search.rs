//! Web Search Tool
//!
//! Ranked web search through the Tavily API, with source attribution.

use std::time::Duration;

use agent_core::{
    tool::{ParameterSchema, Tool, ToolSchema},
    AgentError, Result as CoreResult, ToolCall,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";
const MAX_RESULTS: usize = 3;

#[derive(Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    content: String,
}

/// Tool searching the public web
#[derive(Clone)]
pub struct WebSearchTool {
    http: reqwest::Client,
    api_key: String,
}

impl WebSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    /// Build from `TAVILY_API_KEY`; `None` when the key is not configured,
    /// in which case the tool is simply not registered
    pub fn from_env() -> Option<Self> {
        match std::env::var("TAVILY_API_KEY") {
            Ok(key) if !key.is_empty() => Some(Self::new(key)),
            _ => {
                tracing::warn!("TAVILY_API_KEY not set; web search tool is disabled");
                None
            }
        }
    }
}

fn format_results(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return "No web results found for the query.".into();
    }

    let mut output = String::from("Web search results:\n");
    for (rank, result) in results.iter().enumerate() {
        output.push_str(&format!(
            "{}. {} ({})\n   {}\n",
            rank + 1,
            result.title,
            result.url,
            result.content
        ));
    }
    output.trim_end().to_owned()
}

#[async_trait]
impl Tool for WebSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "web_search".into(),
            description: "Searches the web and returns ranked snippets with their source \
                          URLs. Use this for current regulations, market practice or \
                          general insurance knowledge not covered by internal documents or \
                          a specific provided policy document."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "query",
                "The web search query",
            )],
        }
    }

    async fn invoke(&self, call: &ToolCall) -> CoreResult<String> {
        let query = call
            .arg_str("query")
            .ok_or_else(|| AgentError::ToolValidation("Missing query".into()))?;

        tracing::info!(%query, "executing web search");

        let response = self
            .http
            .post(TAVILY_ENDPOINT)
            .json(&SearchRequest {
                api_key: &self.api_key,
                query,
                max_results: MAX_RESULTS,
            })
            .send()
            .await;

        let response = match response {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "web search request rejected");
                return Ok(format!(
                    "Error executing the web search: the search service answered {}.",
                    resp.status()
                ));
            }
            Err(e) => {
                tracing::warn!(error = %e, "web search request failed");
                return Ok("Error executing the web search: the search service is \
                           unreachable."
                    .into());
            }
        };

        match response.json::<SearchResponse>().await {
            Ok(parsed) => Ok(format_results(&parsed.results)),
            Err(e) => {
                tracing::warn!(error = %e, "web search response unparseable");
                Ok("Error executing the web search: unexpected response format.".into())
            }
        }
    }
}
