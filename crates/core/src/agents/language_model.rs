//! # Language Model Seam
//!
//! One reasoning step at a time: the agent loop hands the model its system
//! instructions plus the transcript so far and gets back an [`AgentStep`].

use crate::models::ModelConfig;
use crate::run_llm_function;
use async_trait::async_trait;
use radkit::macros::LLMOutput;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One step of the agent's reasoning loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, LLMOutput)]
pub struct AgentStep {
    /// Short reasoning about what to do next
    #[serde(default)]
    pub thought: String,
    /// Name of the tool to call, if one is needed
    #[serde(default)]
    pub tool: Option<String>,
    /// JSON object with the tool arguments
    #[serde(default)]
    pub tool_input: Option<String>,
    /// The complete final document in Markdown, once no more tools are needed
    #[serde(default)]
    pub final_answer: Option<String>,
}

impl AgentStep {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            final_answer: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn call(tool: &str, input: serde_json::Value) -> Self {
        Self {
            thought: format!("I should use {}", tool),
            tool: Some(tool.to_string()),
            tool_input: Some(input.to_string()),
            final_answer: None,
        }
    }
}

/// Text-completion capability shared by every agent.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Identifier for logs, e.g. `gemini/gemini-1.5-flash`.
    fn describe(&self) -> String;

    async fn next_step(&self, system: &str, transcript: &str) -> anyhow::Result<AgentStep>;
}

/// [`LanguageModel`] backed by radkit's structured-output functions.
#[derive(Debug, Clone)]
pub struct RadkitModel {
    config: ModelConfig,
}

impl RadkitModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[async_trait]
impl LanguageModel for RadkitModel {
    fn describe(&self) -> String {
        format!(
            "{}/{}",
            self.config.provider.id(),
            self.config.model
        )
    }

    async fn next_step(&self, system: &str, transcript: &str) -> anyhow::Result<AgentStep> {
        run_llm_function!(&self.config, AgentStep, system, transcript.to_string())
    }
}
