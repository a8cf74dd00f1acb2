//! # Orchestrator
//!
//! Executes a [`PipelinePlan`] for one set of trip parameters.
//!
//! Component failures (model, tools, a single stage's storage write) are
//! logged and recorded as stage outcomes; the run always continues to the
//! bundler. Only failures that stop the bundler from producing the four
//! documents surface as [`PlannerError`].

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tokio::sync::mpsc;

use super::category::{Category, StageId, StageKind};
use super::events::{EventSink, PipelineEvent, PipelineEventKind};
use super::plan::PipelinePlan;
use super::prompts::with_draft;
use super::purity::{PurityGate, RemovedSection};
use super::stage::StageTask;
use super::state::{RunPhase, RunState};
use crate::agents::{GenerationAgent, LanguageModel, RadkitModel};
use crate::bundler::{ResultBundler, RunResult};
use crate::config::{ExecutionMode, PlannerConfig};
use crate::error::{PlannerError, PlannerResult};
use crate::search::SearchClient;
use crate::state::{ArtifactStore, DRAFT_PLACEHOLDER};
use crate::tools::ToolRegistry;
use crate::trip::TripParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed,
    /// Verification skipped because the draft was never written.
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageOutcome {
    pub stage: StageId,
    pub status: StageStatus,
    /// Bytes written to the stage's sink
    pub bytes: usize,
    pub error: Option<String>,
    /// Sections the purity gate dropped (verification stages only)
    pub removed_sections: Vec<RemovedSection>,
    pub duration_ms: u64,
}

impl StageOutcome {
    fn new(stage: StageId, status: StageStatus, started: Instant) -> Self {
        Self {
            stage,
            status,
            bytes: 0,
            error: None,
            removed_sections: Vec::new(),
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    fn failed(stage: StageId, error: String, started: Instant) -> Self {
        Self {
            error: Some(error),
            ..Self::new(stage, StageStatus::Failed, started)
        }
    }
}

/// Everything a completed run reports back.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub phase: RunPhase,
    pub result: RunResult,
    pub stages: Vec<StageOutcome>,
    /// Distinct "Day N" headings found in the final itinerary
    pub itinerary_days: usize,
    /// Days the trip spans
    pub expected_days: i64,
}

impl RunReport {
    pub fn outcome(&self, stage: StageId) -> Option<&StageOutcome> {
        self.stages.iter().find(|outcome| outcome.stage == stage)
    }

    pub fn failed_stages(&self) -> usize {
        self.stages
            .iter()
            .filter(|outcome| outcome.status == StageStatus::Failed)
            .count()
    }
}

static DAY_HEADING: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?im)^\s*(?:#{1,6}\s*|\*\*)day\s+(\d+)\b"));

/// Count distinct day numbers in `Day N` headings (or bold `**Day N` lines).
pub fn count_itinerary_days(text: &str) -> usize {
    let re = match &*DAY_HEADING {
        Ok(re) => re,
        Err(e) => {
            tracing::error!("Day heading pattern failed to compile: {}", e);
            return 0;
        }
    };
    let mut days: Vec<u32> = re
        .captures_iter(text)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();
    days.sort_unstable();
    days.dedup();
    days.len()
}

pub struct Orchestrator {
    store: ArtifactStore,
    model: Arc<dyn LanguageModel>,
    tools: Arc<ToolRegistry>,
    gate: PurityGate,
    events: EventSink,
    mode: ExecutionMode,
    max_iterations: u32,
}

impl Orchestrator {
    /// Wire up the radkit-backed model and the standard search tools.
    pub fn new(config: &PlannerConfig) -> PlannerResult<Self> {
        let model: Arc<dyn LanguageModel> = Arc::new(RadkitModel::new(config.model.clone()));
        let tools = ToolRegistry::standard(SearchClient::new(config.search.clone()));
        Self::with_parts(config, model, tools)
    }

    /// Build with an explicit model and tool registry.
    pub fn with_parts(
        config: &PlannerConfig,
        model: Arc<dyn LanguageModel>,
        tools: ToolRegistry,
    ) -> PlannerResult<Self> {
        config.validate()?;
        Ok(Self {
            store: ArtifactStore::new(&config.storage),
            model,
            tools: Arc::new(tools),
            gate: PurityGate::new(),
            events: EventSink::disabled(),
            mode: config.execution,
            max_iterations: config.agent_max_iterations,
        })
    }

    /// Stream progress events to `tx`.
    pub fn with_event_channel(mut self, tx: mpsc::Sender<PipelineEvent>) -> Self {
        self.events = EventSink::new(tx);
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Run the whole pipeline for one trip.
    #[tracing::instrument(skip_all, fields(destination = %trip.destination(), mode = ?self.mode))]
    pub async fn run(&self, trip: &TripParameters) -> PlannerResult<RunReport> {
        let run_id = uuid::Uuid::new_v4().to_string();
        tracing::info!(run_id = %run_id, model = %self.model.describe(), "Starting run");
        self.events
            .emit(PipelineEvent::new(PipelineEventKind::RunStarted).with_data(serde_json::json!({
                "run_id": run_id,
                "destination": trip.destination(),
                "days": trip.trip_days(),
            })))
            .await;

        let mut state = RunState::new();
        match self.execute(trip, &run_id, &mut state).await {
            Ok(report) => {
                tracing::info!(
                    run_id = %run_id,
                    failed_stages = report.failed_stages(),
                    placeholders = report.result.placeholders.len(),
                    "Run complete"
                );
                self.events
                    .emit(PipelineEvent::new(PipelineEventKind::RunCompleted).with_data(
                        serde_json::json!({
                            "run_id": run_id,
                            "placeholders": report.result.placeholders,
                        }),
                    ))
                    .await;
                Ok(report)
            }
            Err(e) => {
                state.fail();
                tracing::error!(run_id = %run_id, error = %e, "Run failed");
                self.events
                    .emit(PipelineEvent::new(PipelineEventKind::RunFailed).with_data(
                        serde_json::json!({
                            "run_id": run_id,
                            "kind": e.kind(),
                            "detail": e.detail(),
                        }),
                    ))
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        trip: &TripParameters,
        run_id: &str,
        state: &mut RunState,
    ) -> PlannerResult<RunReport> {
        self.store.prepare_run().await?;
        let plan = PipelinePlan::build(trip, &self.store);

        let stages = match self.mode {
            ExecutionMode::Sequential => {
                let mut outcomes = Vec::with_capacity(8);
                for lane in plan.lanes() {
                    outcomes.push(self.run_stage(&lane.generate).await);
                }
                self.advance(state).await;
                for lane in plan.lanes() {
                    outcomes.push(self.run_stage(&lane.verify).await);
                }
                self.advance(state).await;
                outcomes
            }
            ExecutionMode::PerCategory => {
                let lanes = plan.lanes().iter().map(|lane| async move {
                    let generated = self.run_stage(&lane.generate).await;
                    let verified = self.run_stage(&lane.verify).await;
                    [generated, verified]
                });
                let outcomes: Vec<StageOutcome> =
                    join_all(lanes).await.into_iter().flatten().collect();
                self.advance(state).await;
                self.advance(state).await;
                outcomes
            }
        };

        for outcome in &stages {
            if outcome.status == StageStatus::Failed {
                state.record_stage_failure();
            }
        }

        let result = ResultBundler::finalize(&self.store, &Category::ALL, run_id).await?;
        for category in &result.placeholders {
            self.events
                .emit(
                    PipelineEvent::for_stage(
                        PipelineEventKind::PlaceholderWritten,
                        StageId::verified(*category),
                    )
                    .with_data(serde_json::json!({ "category": category })),
                )
                .await;
        }
        self.advance(state).await;

        let itinerary = self
            .store
            .load_final(Category::Itinerary)
            .await
            .map(|artifact| artifact.content)
            .unwrap_or_default();
        let itinerary_days = count_itinerary_days(&itinerary);
        let expected_days = trip.trip_days();
        if !result.is_placeholder(Category::Itinerary) && itinerary_days as i64 != expected_days {
            tracing::warn!(
                found = itinerary_days,
                expected = expected_days,
                "Itinerary day count does not match the trip length"
            );
        }

        Ok(RunReport {
            run_id: run_id.to_string(),
            phase: state.phase,
            result,
            stages,
            itinerary_days,
            expected_days,
        })
    }

    async fn advance(&self, state: &mut RunState) {
        let phase = state.advance();
        tracing::info!(phase = ?phase, "Phase changed");
        self.events
            .emit(
                PipelineEvent::new(PipelineEventKind::PhaseChanged)
                    .with_data(serde_json::json!({ "phase": phase })),
            )
            .await;
    }

    fn agent_for(&self, stage: &StageTask) -> GenerationAgent {
        GenerationAgent::new(
            stage.agent.profile(self.max_iterations),
            Arc::clone(&self.model),
            Arc::clone(&self.tools),
        )
    }

    /// Run one stage. Never fails; problems are recorded in the outcome.
    #[tracing::instrument(skip_all, fields(stage = %stage.id))]
    async fn run_stage(&self, stage: &StageTask) -> StageOutcome {
        let started = Instant::now();
        self.events
            .emit(
                PipelineEvent::for_stage(PipelineEventKind::StageStarted, stage.id)
                    .with_data(serde_json::json!({ "agent": stage.agent })),
            )
            .await;

        let outcome = match stage.id.kind {
            StageKind::Draft => self.run_generation(stage, started).await,
            StageKind::Verified => self.run_verification(stage, started).await,
        };

        let event = match outcome.status {
            StageStatus::Failed => {
                tracing::warn!(error = ?outcome.error, "Stage failed");
                PipelineEvent::for_stage(PipelineEventKind::StageFailed, stage.id)
                    .with_data(serde_json::json!({ "error": outcome.error }))
            }
            StageStatus::Completed | StageStatus::Skipped => {
                tracing::info!(status = ?outcome.status, bytes = outcome.bytes, "Stage finished");
                PipelineEvent::for_stage(PipelineEventKind::StageCompleted, stage.id).with_data(
                    serde_json::json!({ "status": outcome.status, "bytes": outcome.bytes }),
                )
            }
        };
        self.events.emit(event).await;
        outcome
    }

    async fn run_generation(&self, stage: &StageTask, started: Instant) -> StageOutcome {
        let text = match self
            .agent_for(stage)
            .generate(&stage.prompt, &stage.expected_output)
            .await
        {
            Ok(text) => text,
            Err(e) => return StageOutcome::failed(stage.id, format!("{:#}", e), started),
        };

        match self.store.write_draft(stage.category(), &text).await {
            Ok(()) => StageOutcome {
                bytes: text.len(),
                ..StageOutcome::new(stage.id, StageStatus::Completed, started)
            },
            Err(e) => StageOutcome::failed(stage.id, e.detail(), started),
        }
    }

    async fn run_verification(&self, stage: &StageTask, started: Instant) -> StageOutcome {
        let category = stage.category();
        let draft = match &stage.source {
            Some(source) => self.store.read_with_retry(source, DRAFT_PLACEHOLDER).await,
            None => self.store.read_draft(category).await,
        };
        if draft.trim() == DRAFT_PLACEHOLDER {
            tracing::warn!("Draft was never written, skipping verification");
            return StageOutcome::new(stage.id, StageStatus::Skipped, started);
        }

        let task = with_draft(&stage.prompt, &draft);
        let text = match self
            .agent_for(stage)
            .generate(&task, &stage.expected_output)
            .await
        {
            Ok(text) => text,
            Err(e) => return StageOutcome::failed(stage.id, format!("{:#}", e), started),
        };

        let report = self.gate.enforce(category, &text);
        if !report.removed.is_empty() {
            tracing::warn!(removed = report.removed.len(), "Removed foreign sections");
            self.events
                .emit(
                    PipelineEvent::for_stage(PipelineEventKind::PurityViolation, stage.id)
                        .with_data(serde_json::json!({ "removed": report.removed })),
                )
                .await;
        } else if report.kept_original {
            tracing::warn!("Every section looked foreign; keeping the verified text unchanged");
        }

        match self.store.write_final(category, &report.cleaned).await {
            Ok(artifact) => StageOutcome {
                bytes: artifact.content.len(),
                removed_sections: report.removed,
                ..StageOutcome::new(stage.id, StageStatus::Completed, started)
            },
            Err(e) => StageOutcome::failed(stage.id, e.detail(), started),
        }
    }
}
