//! # Pipeline Plan
//!
//! The run as a small DAG: one lane per category, each lane a generation
//! stage followed by the verification of that same draft. Lanes share
//! nothing, so any schedule that keeps `draft -> verified` within a lane is
//! valid.

use serde::Serialize;

use super::category::{Category, StageId, StageKind};
use super::prompts::{draft_prompt, verify_prompt};
use super::stage::StageTask;
use crate::agents::AgentRole;
use crate::state::ArtifactStore;
use crate::trip::TripParameters;

/// Generate-then-verify stages of one category.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryLane {
    pub category: Category,
    pub generate: StageTask,
    pub verify: StageTask,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelinePlan {
    lanes: Vec<CategoryLane>,
}

fn generator_for(category: Category) -> AgentRole {
    match category {
        Category::Destination => AgentRole::DestinationSpecialist,
        Category::Flight => AgentRole::FlightExpert,
        Category::Hotel => AgentRole::HotelStrategist,
        Category::Itinerary => AgentRole::ItinerarySpecialist,
    }
}

impl PipelinePlan {
    /// Build the fixed eight-stage plan for one run.
    pub fn build(trip: &TripParameters, store: &ArtifactStore) -> Self {
        let lanes = Category::ALL
            .into_iter()
            .map(|category| {
                let (prompt, expected_output) = draft_prompt(category, trip);
                let generate = StageTask {
                    id: StageId::draft(category),
                    agent: generator_for(category),
                    prompt,
                    expected_output,
                    source: None,
                    sink: store.draft_path(category),
                };

                let (prompt, expected_output) = verify_prompt(category, trip);
                let verify = StageTask {
                    id: StageId::verified(category),
                    agent: AgentRole::VerificationSpecialist,
                    prompt,
                    expected_output,
                    source: Some(store.draft_path(category)),
                    sink: store.final_path(category),
                };

                CategoryLane {
                    category,
                    generate,
                    verify,
                }
            })
            .collect();

        Self { lanes }
    }

    pub fn lanes(&self) -> &[CategoryLane] {
        &self.lanes
    }

    pub fn lane(&self, category: Category) -> Option<&CategoryLane> {
        self.lanes.iter().find(|lane| lane.category == category)
    }

    pub fn stage(&self, id: StageId) -> Option<&StageTask> {
        self.lane(id.category).map(|lane| match id.kind {
            StageKind::Draft => &lane.generate,
            StageKind::Verified => &lane.verify,
        })
    }

    /// Stages that must complete before `id` may start.
    pub fn dependencies(&self, id: StageId) -> Vec<StageId> {
        match id.kind {
            StageKind::Draft => Vec::new(),
            StageKind::Verified => vec![StageId::draft(id.category)],
        }
    }

    /// All stages in the reference order: every draft, then every verification.
    pub fn stages(&self) -> Vec<&StageTask> {
        self.lanes
            .iter()
            .map(|lane| &lane.generate)
            .chain(self.lanes.iter().map(|lane| &lane.verify))
            .collect()
    }
}
