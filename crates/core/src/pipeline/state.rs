//! # Run State
//!
//! Per-run state machine: `NotStarted -> DraftsWritten -> Verified -> Bundled`,
//! with `Failed` reachable from any non-terminal phase.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    /// Every generation stage has run (successfully or not).
    DraftsWritten,
    /// Every verification stage has run.
    Verified,
    /// Final artifacts checked and placeholders written.
    Bundled,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Bundled | RunPhase::Failed)
    }
}

/// The run state machine
#[derive(Debug, Clone, Serialize)]
pub struct RunState {
    pub phase: RunPhase,
    /// Stages that raised instead of producing output
    pub failed_stages: u32,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            phase: RunPhase::NotStarted,
            failed_stages: 0,
        }
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to the next phase. Terminal phases stay put.
    pub fn advance(&mut self) -> RunPhase {
        self.phase = match self.phase {
            RunPhase::NotStarted => RunPhase::DraftsWritten,
            RunPhase::DraftsWritten => RunPhase::Verified,
            RunPhase::Verified => RunPhase::Bundled,
            RunPhase::Bundled => RunPhase::Bundled,
            RunPhase::Failed => RunPhase::Failed,
        };
        self.phase
    }

    /// Count a stage failure. The run itself keeps going.
    pub fn record_stage_failure(&mut self) {
        self.failed_stages += 1;
    }

    pub fn fail(&mut self) {
        self.phase = RunPhase::Failed;
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.phase == RunPhase::Bundled
    }
}
