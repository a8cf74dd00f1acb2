//! # Planner Configuration
//!
//! One explicit configuration struct, loaded once at startup and handed to
//! the search client, the artifact store and the orchestrator.

use crate::error::{PlannerError, PlannerResult};
use crate::models::{LlmProvider, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the persisted config file.
pub const DEFAULT_CONFIG_PATH: &str = ".wayfarer/config.json";

/// SerpApi connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// Never serialized back to disk.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub currency: String,
    pub language: String,
    pub country: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://serpapi.com/search.json".to_string(),
            api_key: None,
            currency: "INR".to_string(),
            language: "en".to_string(),
            country: "us".to_string(),
            timeout_secs: 30,
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bounded fixed-delay retry used when reading a just-written artifact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// No waiting between attempts (tests).
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            delay_ms: 0,
        }
    }
}

/// Where draft and final artifacts live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub draft_dir: PathBuf,
    pub final_dir: PathBuf,
    pub read_retry: RetryPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            draft_dir: PathBuf::from(".wayfarer/temp_outputs"),
            final_dir: PathBuf::from(".wayfarer/output"),
            read_retry: RetryPolicy::default(),
        }
    }
}

impl StorageConfig {
    /// Both directories under one root.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            draft_dir: root.join("temp_outputs"),
            final_dir: root.join("output"),
            read_retry: RetryPolicy::default(),
        }
    }
}

/// How the orchestrator schedules the stage graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Four drafts in order, then four verifications in order.
    #[default]
    Sequential,
    /// Four concurrent lanes, each generating then verifying its own category.
    PerCategory,
}

/// Top-level configuration for a planner instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlannerConfig {
    pub model: ModelConfig,
    pub search: SearchConfig,
    pub storage: StorageConfig,
    pub agent_max_iterations: u32,
    pub execution: ExecutionMode,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            search: SearchConfig::default(),
            storage: StorageConfig::default(),
            agent_max_iterations: 5,
            execution: ExecutionMode::Sequential,
        }
    }
}

impl PlannerConfig {
    /// Load from a JSON file; a missing file yields the defaults.
    pub async fn load(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let path = path.as_ref();
        let config = match tokio::fs::read_to_string(path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(PlannerError::io(path, e)),
        };
        Ok(config)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> PlannerResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PlannerError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|e| PlannerError::io(path, e))
    }

    /// Apply process environment overrides. Called once at startup.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("SERPAPI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.search.api_key = Some(key);
        }
        if let Some(provider) = lookup("WAYFARER_PROVIDER").and_then(|p| LlmProvider::parse(&p)) {
            if provider != self.model.provider {
                self.model = ModelConfig::for_provider(provider);
            }
        }
        if let Some(model) = lookup("WAYFARER_MODEL").filter(|m| !m.trim().is_empty()) {
            self.model.model = model;
        }
        if let Some(url) = lookup("WAYFARER_BASE_URL") {
            self.model = self.model.with_base_url(url);
        }
        self
    }

    pub fn validate(&self) -> PlannerResult<()> {
        let mut errors = Vec::new();
        if self.storage.read_retry.attempts == 0 {
            errors.push("storage.read_retry.attempts must be greater than 0");
        }
        if self.agent_max_iterations == 0 {
            errors.push("agent_max_iterations must be greater than 0");
        }
        if self.search.timeout_secs == 0 {
            errors.push("search.timeout_secs must be greater than 0");
        }
        if self.model.model.trim().is_empty() {
            errors.push("model.model must not be empty");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::Config(errors.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_validate() {
        let config = PlannerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent_max_iterations, 5);
        assert_eq!(config.storage.read_retry.attempts, 3);
        assert_eq!(config.search.currency, "INR");
    }

    #[test]
    fn test_validate_rejects_zero_budgets() {
        let mut config = PlannerConfig::default();
        config.agent_max_iterations = 0;
        config.storage.read_retry.attempts = 0;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("agent_max_iterations"));
        assert!(err.contains("read_retry"));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SERPAPI_API_KEY", "secret"),
            ("WAYFARER_PROVIDER", "openai"),
            ("WAYFARER_BASE_URL", "http://localhost:1234/v1"),
        ]
        .into_iter()
        .collect();

        let config =
            PlannerConfig::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.search.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model.provider, LlmProvider::OpenAI);
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(
            config.model.base_url.as_deref(),
            Some("http://localhost:1234/v1")
        );
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut config = PlannerConfig::default();
        config.search.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[tokio::test]
    async fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlannerConfig::load(dir.path().join("nope.json"))
            .await
            .unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.json");
        let mut config = PlannerConfig::default();
        config.execution = ExecutionMode::PerCategory;
        config.save(&path).await.unwrap();

        let loaded = PlannerConfig::load(&path).await.unwrap();
        assert_eq!(loaded.execution, ExecutionMode::PerCategory);
    }
}
