//! # Pipeline Events
//!
//! Progress notifications emitted while a run executes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::category::StageId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineEventKind {
    RunStarted,
    StageStarted,
    StageCompleted,
    /// Stage raised; its slot keeps whatever was there before
    StageFailed,
    /// Foreign-category sections were removed from a verified document
    PurityViolation,
    PhaseChanged,
    /// A missing or empty final artifact was replaced
    PlaceholderWritten,
    RunCompleted,
    RunFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub kind: PipelineEventKind,
    #[serde(default)]
    pub stage: Option<StageId>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl PipelineEvent {
    pub fn new(kind: PipelineEventKind) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            kind,
            stage: None,
            data: None,
        }
    }

    pub fn for_stage(kind: PipelineEventKind, stage: StageId) -> Self {
        Self {
            stage: Some(stage),
            ..Self::new(kind)
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Optional event channel. A closed receiver never fails the run.
#[derive(Debug, Clone, Default)]
pub struct EventSink {
    tx: Option<mpsc::Sender<PipelineEvent>>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub async fn emit(&self, event: PipelineEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).await.is_err() {
                tracing::debug!("Event receiver dropped");
            }
        }
    }
}
