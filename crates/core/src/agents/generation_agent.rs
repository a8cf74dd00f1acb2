//! # Generation Agent
//!
//! A role-labelled agent running a bounded tool-augmented reasoning loop.
//!
//! Each iteration asks the model for one [`AgentStep`]. A step either carries
//! the final document or names a tool to call; tool observations are appended
//! to the transcript and the loop continues. Once the iteration budget is
//! spent the agent asks one last time for an answer with tools disabled, and
//! if that yields nothing it falls back to its best-effort text. Running out
//! of iterations is never an error.

use std::sync::Arc;

use super::language_model::{AgentStep, LanguageModel};
use super::profiles::AgentProfile;
use crate::tools::ToolRegistry;

const PROTOCOL: &str = include_str!("defaults/agent_protocol.md");

/// One role-bound agent. Cheap to clone; the model and tools are shared.
#[derive(Clone)]
pub struct GenerationAgent {
    profile: AgentProfile,
    model: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
}

impl GenerationAgent {
    pub fn new(profile: AgentProfile, model: Arc<dyn LanguageModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            profile,
            model,
            tools,
        }
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// System instructions: role label, protocol and the allowed tools.
    fn system_prompt(&self, tools_enabled: bool) -> String {
        let tools = if tools_enabled && self.profile.uses_tools() {
            self.tools.describe(&self.profile.tools)
        } else {
            String::new()
        };
        let tools = if tools.is_empty() {
            "No tools are available. Answer from the information you have.".to_string()
        } else {
            tools
        };

        format!(
            "You are the {}.\n\nGoal: {}\n\n{}\n\n{}\n\n## Tools\n\n{}",
            self.profile.title,
            self.profile.goal,
            self.profile.backstory,
            PROTOCOL.trim(),
            tools
        )
    }

    /// Run the task to completion and return the document text.
    ///
    /// Errors only when the model itself fails; tool failures become
    /// observations.
    #[tracing::instrument(skip_all, fields(agent = %self.profile.title))]
    pub async fn generate(&self, task: &str, expected_output: &str) -> anyhow::Result<String> {
        let system = self.system_prompt(true);
        let mut transcript = format!(
            "## Task\n\n{}\n\n## Expected output\n\n{}\n",
            task.trim(),
            expected_output.trim()
        );
        let mut best_effort = BestEffort::default();

        for iteration in 1..=self.profile.max_iterations {
            let step = self.model.next_step(&system, &transcript).await?;
            tracing::debug!(iteration, thought = %step.thought, tool = ?step.tool, "Agent step");
            best_effort.note_thought(&step.thought);

            if let Some(answer) = usable_answer(&step) {
                return Ok(answer);
            }

            match step.tool.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                Some(tool) => {
                    let arguments = step.tool_input.as_deref().unwrap_or("");
                    let observation = self
                        .tools
                        .execute(tool, &self.profile.tools, arguments)
                        .await
                        .render();
                    transcript.push_str(&format!(
                        "\nThought: {}\nAction: {}\nAction Input: {}\nObservation: {}\n",
                        step.thought.trim(),
                        tool,
                        arguments.trim(),
                        observation
                    ));
                    best_effort.note_observation(observation);
                }
                None => {
                    transcript.push_str(&format!(
                        "\nThought: {}\nObservation: No tool was called and no final answer was given. \
                         Provide the final answer now.\n",
                        step.thought.trim()
                    ));
                }
            }
        }

        tracing::warn!(
            budget = self.profile.max_iterations,
            "Iteration budget spent, requesting final answer"
        );
        transcript.push_str(
            "\nYou have used all available iterations. Do not call any more tools. \
             Write the complete final answer now using the information above.\n",
        );

        match self.model.next_step(&self.system_prompt(false), &transcript).await {
            Ok(step) => {
                if let Some(answer) = usable_answer(&step) {
                    return Ok(answer);
                }
                best_effort.note_thought(&step.thought);
            }
            Err(e) => tracing::warn!(error = %e, "Final answer request failed"),
        }

        Ok(best_effort.into_text(&self.profile.title))
    }
}

/// The step's final answer, cleaned, if it has any content.
fn usable_answer(step: &AgentStep) -> Option<String> {
    step.final_answer
        .as_deref()
        .map(clean_answer)
        .filter(|answer| !answer.is_empty())
}

/// Strip a code fence wrapping the whole answer.
pub fn clean_answer(text: &str) -> String {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(body) = rest.strip_suffix("```") {
            // Drop the info string (```markdown) on the opening line.
            let body = match body.split_once('\n') {
                Some((info, remainder)) if !info.trim().contains(' ') => remainder,
                _ => body,
            };
            return body.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Text collected along the way, used when the model never answers.
#[derive(Default)]
struct BestEffort {
    last_thought: String,
    observations: Vec<String>,
}

impl BestEffort {
    fn note_thought(&mut self, thought: &str) {
        if !thought.trim().is_empty() {
            self.last_thought = thought.trim().to_string();
        }
    }

    fn note_observation(&mut self, observation: String) {
        self.observations.push(observation);
    }

    fn into_text(self, title: &str) -> String {
        let mut text = format!("# {} notes\n\n", title);
        if !self.last_thought.is_empty() {
            text.push_str(&self.last_thought);
            text.push_str("\n\n");
        }
        if self.observations.is_empty() {
            text.push_str("No further details could be gathered for this request.\n");
        } else {
            text.push_str("## Collected information\n\n");
            for observation in self.observations {
                text.push_str(&observation);
                text.push_str("\n\n");
            }
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::profiles::AgentRole;
    use crate::tools::{Tool, ToolKind, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of steps, recording every transcript it sees.
    struct ScriptedModel {
        steps: Mutex<VecDeque<anyhow::Result<AgentStep>>>,
        transcripts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(steps: Vec<anyhow::Result<AgentStep>>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                transcripts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.transcripts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        async fn next_step(&self, _system: &str, transcript: &str) -> anyhow::Result<AgentStep> {
            self.transcripts.lock().unwrap().push(transcript.to_string());
            self.steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(AgentStep::default()))
        }
    }

    struct FixedFlights;

    #[async_trait]
    impl Tool for FixedFlights {
        fn kind(&self) -> ToolKind {
            ToolKind::FlightSearch
        }

        fn description(&self) -> &'static str {
            "Fixed flights"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object"})
        }

        async fn execute(&self, _arguments: Value) -> ToolOutput {
            ToolOutput::Text("Thai Airways TG 330, 4h 10m, 18500 INR".to_string())
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry.register(FixedFlights);
        Arc::new(registry)
    }

    #[tokio::test]
    async fn test_returns_final_answer() {
        let model = ScriptedModel::new(vec![Ok(AgentStep::answer("# Flights\n\nTG 330"))]);
        let agent = GenerationAgent::new(AgentRole::FlightExpert.profile(3), model.clone(), registry());

        let text = agent.generate("Find flights", "A list").await.unwrap();
        assert_eq!(text, "# Flights\n\nTG 330");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_tool_observation_reaches_transcript() {
        let model = ScriptedModel::new(vec![
            Ok(AgentStep::call("search_flights", json!({"departure_id": "HYD"}))),
            Ok(AgentStep::answer("# Flights\n\nTG 330")),
        ]);
        let agent = GenerationAgent::new(AgentRole::FlightExpert.profile(3), model.clone(), registry());

        agent.generate("Find flights", "A list").await.unwrap();
        let transcripts = model.transcripts.lock().unwrap();
        assert!(transcripts[1].contains("Observation: Thai Airways TG 330"));
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_not_an_error() {
        let looping: Vec<_> = (0..10)
            .map(|_| Ok(AgentStep::call("search_flights", json!({}))))
            .collect();
        let model = ScriptedModel::new(looping);
        let agent = GenerationAgent::new(AgentRole::FlightExpert.profile(2), model.clone(), registry());

        let text = agent.generate("Find flights", "A list").await.unwrap();
        assert!(!text.trim().is_empty());
        assert!(text.contains("Thai Airways"));
        // two iterations plus the forced final request
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_forced_final_answer_used() {
        let model = ScriptedModel::new(vec![
            Ok(AgentStep::call("search_flights", json!({}))),
            Ok(AgentStep::answer("```markdown\n# Flights\n```")),
        ]);
        let agent = GenerationAgent::new(AgentRole::FlightExpert.profile(1), model.clone(), registry());

        let text = agent.generate("Find flights", "A list").await.unwrap();
        assert_eq!(text, "# Flights");
    }

    #[tokio::test]
    async fn test_disallowed_tool_becomes_observation() {
        let model = ScriptedModel::new(vec![
            Ok(AgentStep::call("search_flights", json!({}))),
            Ok(AgentStep::answer("done")),
        ]);
        let agent = GenerationAgent::new(
            AgentRole::VerificationSpecialist.profile(3),
            model.clone(),
            registry(),
        );

        agent.generate("Verify", "A document").await.unwrap();
        let transcripts = model.transcripts.lock().unwrap();
        assert!(transcripts[1].contains("not available to this agent"));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let model = ScriptedModel::new(vec![Err(anyhow::anyhow!("provider unreachable"))]);
        let agent = GenerationAgent::new(AgentRole::FlightExpert.profile(3), model, registry());

        let err = agent.generate("Find flights", "A list").await.unwrap_err();
        assert!(err.to_string().contains("provider unreachable"));
    }

    #[test]
    fn test_clean_answer_strips_fences() {
        assert_eq!(clean_answer("```md\n# Title\nBody\n```"), "# Title\nBody");
        assert_eq!(clean_answer("  # Title  "), "# Title");
        assert_eq!(clean_answer("```\n```"), "");
    }
}
