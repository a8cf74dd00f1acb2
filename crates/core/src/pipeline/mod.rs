//! # Pipeline
//!
//! Stage tasks, the per-category plan, the run state machine and the
//! orchestrator that executes them.

pub mod category;
pub mod events;
pub mod orchestrator;
pub mod plan;
pub mod prompts;
pub mod purity;
pub mod stage;
pub mod state;

pub use category::{Category, StageId, StageKind};
pub use events::{EventSink, PipelineEvent, PipelineEventKind};
pub use orchestrator::{count_itinerary_days, Orchestrator, RunReport, StageOutcome, StageStatus};
pub use plan::{CategoryLane, PipelinePlan};
pub use purity::{PurityGate, PurityReport, RemovedSection};
pub use stage::StageTask;
pub use state::{RunPhase, RunState};
