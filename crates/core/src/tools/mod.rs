//! # Agent Tools
//!
//! Capability interface for the calls an agent may make while reasoning.
//! The set of tools is fixed; the registry is built once per pipeline and
//! each agent profile names the [`ToolKind`]s it is allowed to use.

pub mod search_tools;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::search::SearchClient;

pub use search_tools::{FlightSearchTool, HotelSearchTool, WebSearchTool};

/// Upper bound on a rendered observation fed back into the transcript.
const MAX_OBSERVATION_CHARS: usize = 12_000;

/// The fixed set of tool implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    FlightSearch,
    HotelSearch,
    WebSearch,
}

impl ToolKind {
    /// Name the model uses to request the tool.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::FlightSearch => "search_flights",
            ToolKind::HotelSearch => "search_hotels",
            ToolKind::WebSearch => "search_web",
        }
    }

    pub fn from_name(name: &str) -> Option<ToolKind> {
        match name.trim() {
            "search_flights" => Some(ToolKind::FlightSearch),
            "search_hotels" => Some(ToolKind::HotelSearch),
            "search_web" => Some(ToolKind::WebSearch),
            _ => None,
        }
    }
}

/// What a tool hands back: structured data or plain text (including errors).
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Structured(Value),
    Text(String),
}

impl ToolOutput {
    pub fn is_text(&self) -> bool {
        matches!(self, ToolOutput::Text(_))
    }

    /// Text form for the agent transcript, truncated on a char boundary.
    pub fn render(&self) -> String {
        let full = match self {
            ToolOutput::Structured(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
            ToolOutput::Text(text) => text.clone(),
        };
        if full.chars().count() <= MAX_OBSERVATION_CHARS {
            return full;
        }
        let mut truncated: String = full.chars().take(MAX_OBSERVATION_CHARS).collect();
        truncated.push_str("\n... [TRUNCATED]");
        truncated
    }
}

/// A callable capability bound into an agent's reasoning loop.
#[async_trait]
pub trait Tool: Send + Sync {
    fn kind(&self) -> ToolKind;

    fn description(&self) -> &'static str;

    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;

    /// Run the tool. Never fails: problems come back as [`ToolOutput::Text`].
    async fn execute(&self, arguments: Value) -> ToolOutput;
}

/// Registry of tools resolved at pipeline-build time.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolKind, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flight, hotel and web search, all sharing one search client.
    pub fn standard(client: SearchClient) -> Self {
        let client = Arc::new(client);
        let mut registry = Self::new();
        registry.register(FlightSearchTool::new(Arc::clone(&client)));
        registry.register(HotelSearchTool::new(Arc::clone(&client)));
        registry.register(WebSearchTool::new(client));
        registry
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        tracing::debug!(tool = tool.kind().name(), "Registered tool");
        self.tools.insert(tool.kind(), Arc::new(tool));
    }

    pub fn get(&self, kind: ToolKind) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Prompt section describing the allowed tools and their argument schemas.
    pub fn describe(&self, allowed: &[ToolKind]) -> String {
        allowed
            .iter()
            .filter_map(|kind| self.get(*kind))
            .map(|tool| {
                format!(
                    "- {}: {}\n  arguments (JSON schema): {}",
                    tool.kind().name(),
                    tool.description(),
                    tool.parameters()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Execute a tool call requested by the model.
    ///
    /// `raw_arguments` is the JSON text the model produced. Unknown tools,
    /// tools outside `allowed` and unparseable arguments yield a text error.
    pub async fn execute(&self, name: &str, allowed: &[ToolKind], raw_arguments: &str) -> ToolOutput {
        let Some(kind) = ToolKind::from_name(name) else {
            return ToolOutput::Text(format!("Tool '{}' does not exist", name));
        };
        if !allowed.contains(&kind) {
            return ToolOutput::Text(format!("Tool '{}' is not available to this agent", name));
        }
        let Some(tool) = self.get(kind) else {
            return ToolOutput::Text(format!("Tool '{}' is not registered", name));
        };

        let raw = raw_arguments.trim();
        let arguments = if raw.is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str::<Value>(raw) {
                Ok(value) => value,
                Err(e) => return ToolOutput::Text(format!("Invalid tool arguments: {}", e)),
            }
        };

        tracing::debug!(tool = name, "Executing tool");
        tool.execute(arguments).await
    }
}
