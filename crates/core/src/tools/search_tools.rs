//! # Search Tools
//!
//! Flight, hotel and web search exposed to the agents. Search errors are
//! returned as text so the agent can still write a (degraded) document.

use super::{Tool, ToolKind, ToolOutput};
use crate::search::{FlightQuery, HotelQuery, SearchClient, SearchOutcome};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

fn outcome_to_output<T: Serialize>(label: &str, outcome: SearchOutcome<T>) -> ToolOutput {
    match outcome {
        SearchOutcome::Results(items) if items.is_empty() => {
            ToolOutput::Text(format!("No {} found for these parameters.", label))
        }
        SearchOutcome::Results(items) => match serde_json::to_value(&items) {
            Ok(value) => ToolOutput::Structured(json!({ label: value })),
            Err(e) => ToolOutput::Text(format!("Failed to encode {}: {}", label, e)),
        },
        SearchOutcome::Error(msg) => {
            tracing::warn!(label, "Search tool degraded: {}", msg);
            ToolOutput::Text(format!("{} search failed: {}", label, msg))
        }
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}))
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Value) -> Result<T, ToolOutput> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolOutput::Text(format!("Invalid tool arguments: {}", e)))
}

/// Find flights using the Google Flights engine.
pub struct FlightSearchTool {
    client: Arc<SearchClient>,
}

impl FlightSearchTool {
    pub fn new(client: Arc<SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for FlightSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::FlightSearch
    }

    fn description(&self) -> &'static str {
        "Find round-trip flights between two airports (IATA codes) for given YYYY-MM-DD dates."
    }

    fn parameters(&self) -> Value {
        schema_of::<FlightQuery>()
    }

    async fn execute(&self, arguments: Value) -> ToolOutput {
        let query: FlightQuery = match parse_args(arguments) {
            Ok(q) => q,
            Err(output) => return output,
        };
        outcome_to_output("flights", self.client.find_flights(&query).await)
    }
}

/// Find hotels using the Google Hotels engine.
pub struct HotelSearchTool {
    client: Arc<SearchClient>,
}

impl HotelSearchTool {
    pub fn new(client: Arc<SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for HotelSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::HotelSearch
    }

    fn description(&self) -> &'static str {
        "Find hotels in a location for YYYY-MM-DD check-in/check-out dates, filtered by rating and star class."
    }

    fn parameters(&self) -> Value {
        schema_of::<HotelQuery>()
    }

    async fn execute(&self, arguments: Value) -> ToolOutput {
        let query: HotelQuery = match parse_args(arguments) {
            Ok(q) => q,
            Err(output) => return output,
        };
        outcome_to_output("hotels", self.client.find_hotels(&query).await)
    }
}

/// Arguments for web search
#[derive(Debug, Deserialize, JsonSchema)]
pub struct WebSearchArgs {
    /// Search query
    pub query: String,
    /// Maximum number of results (default: 5)
    pub max_results: Option<u32>,
}

/// General web search for destination and itinerary research.
pub struct WebSearchTool {
    client: Arc<SearchClient>,
}

impl WebSearchTool {
    pub fn new(client: Arc<SearchClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn kind(&self) -> ToolKind {
        ToolKind::WebSearch
    }

    fn description(&self) -> &'static str {
        "Search the web. Returns titles, links and snippets."
    }

    fn parameters(&self) -> Value {
        schema_of::<WebSearchArgs>()
    }

    async fn execute(&self, arguments: Value) -> ToolOutput {
        let args: WebSearchArgs = match parse_args(arguments) {
            Ok(a) => a,
            Err(output) => return output,
        };
        let max_results = args.max_results.unwrap_or(5).clamp(1, 20) as usize;
        outcome_to_output(
            "results",
            self.client.search_web(&args.query, max_results).await,
        )
    }
}
