//! A single prompt-bound unit of work.

use std::path::PathBuf;

use serde::Serialize;

use super::category::{Category, StageId, StageKind};
use crate::agents::AgentRole;

/// Immutable description of one stage, created when the plan is built.
#[derive(Debug, Clone, Serialize)]
pub struct StageTask {
    pub id: StageId,
    /// Which agent runs the stage.
    pub agent: AgentRole,
    pub prompt: String,
    pub expected_output: String,
    /// The draft this stage reads. Only verification stages have one, and it
    /// is always their own category's draft.
    pub source: Option<PathBuf>,
    /// Where the stage's output is written.
    pub sink: PathBuf,
}

impl StageTask {
    pub fn category(&self) -> Category {
        self.id.category
    }

    pub fn is_verification(&self) -> bool {
        self.id.kind == StageKind::Verified
    }
}
