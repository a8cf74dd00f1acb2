//! End-to-end runs of the planning pipeline against a temporary directory,
//! driven by an in-memory language model.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;

use wayfarer_core::agents::{AgentStep, LanguageModel};
use wayfarer_core::config::{RetryPolicy, SearchConfig, StorageConfig};
use wayfarer_core::pipeline::{PipelineEventKind, RunPhase, StageId, StageStatus};
use wayfarer_core::search::SearchClient;
use wayfarer_core::tools::ToolRegistry;
use wayfarer_core::{
    Category, ExecutionMode, Orchestrator, PlannerConfig, ResultBundler, TripParameters,
    TripRequest, TripValidationError,
};

const GUIDE: &str = "# Bangkok Destination Guide\n\n## Top attractions\n\n\
    The Grand Palace and Wat Pho temples are must-visit sights.\n\n## Local culture\n\n\
    Dress modestly at temples and respect local customs.\n";

const FLIGHTS: &str = "# Flight Options\n\n| Airline | Flight | Stops | Price |\n|---|---|---|---|\n\
    | Thai Airways | TG 330 | Nonstop | 18,500 INR |\n| IndiGo | 6E 1065 | Nonstop | 14,200 INR |\n";

const LEAKED_HOTEL: &str = "\n## Where to stay\n\nThe Siam Kempinski Hotel offers family rooms, \
    a pool and great amenities. Rooms start at 9,000 INR per night.\n";

const HOTELS: &str = "# Hotel Recommendations\n\n## 1. Siam Kempinski\n\n\
    Five-star hotel with family rooms, a pool and a kids club.\n";

/// Plays every agent role, keyed off the role title in the system prompt.
#[derive(Default)]
struct TravelModel {
    /// Flight expert appends a hotel section to its draft.
    leak_hotels_into_flights: bool,
    /// Flight expert calls the flight search tool before answering.
    search_flights_first: bool,
    /// Verification of the draft containing this marker fails.
    fail_verification_of: Option<&'static str>,
    calls: Mutex<Vec<(String, String)>>,
}

impl TravelModel {
    fn verification_transcripts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| system.contains("Verification Specialist"))
            .map(|(_, transcript)| transcript.clone())
            .collect()
    }
}

fn between<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let from = text.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = text[from..].find(end).map(|i| from + i).unwrap_or(text.len());
    &text[from..to]
}

fn itinerary(days: usize) -> String {
    let mut doc = String::from("# Bangkok Itinerary\n");
    for day in 1..=days {
        doc.push_str(&format!(
            "\n## Day {}: Temples and markets\n\nMorning: the Grand Palace and Wat Pho temples, \
             steeped in culture and history. Afternoon: local markets and street food, then a museum. \
             Respect local customs and etiquette, carry currency for tipping and watch for scams \
             in the busy districts. Evening: dinner cruise.\n",
            day
        ));
    }
    doc
}

#[async_trait]
impl LanguageModel for TravelModel {
    fn describe(&self) -> String {
        "travel-model".to_string()
    }

    async fn next_step(&self, system: &str, transcript: &str) -> anyhow::Result<AgentStep> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), transcript.to_string()));

        if system.contains("Verification Specialist") {
            let draft = between(transcript, "<draft>\n", "\n</draft>");
            if let Some(marker) = self.fail_verification_of {
                if draft.contains(marker) {
                    anyhow::bail!("model overloaded");
                }
            }
            return Ok(AgentStep::answer(draft));
        }

        if system.contains("Flight Booking Expert") {
            if self.search_flights_first && !transcript.contains("Observation:") {
                return Ok(AgentStep::call(
                    "search_flights",
                    json!({
                        "departure_airport": "HYD",
                        "arrival_airport": "BKK",
                        "outbound_date": "2025-03-01",
                        "return_date": "2025-03-08",
                        "adults": 2,
                        "children": 1
                    }),
                ));
            }
            let mut doc = FLIGHTS.to_string();
            if transcript.contains("Observation:") {
                let observation = between(transcript, "Observation: ", "\n");
                doc.push_str(&format!("\nLive fares unavailable ({}); prices are estimates.\n", observation));
            }
            if self.leak_hotels_into_flights {
                doc.push_str(LEAKED_HOTEL);
            }
            return Ok(AgentStep::answer(doc));
        }

        if system.contains("Hotel Booking Strategist") {
            return Ok(AgentStep::answer(HOTELS));
        }

        if system.contains("Itinerary Specialist") {
            let days = Regex::new(r"(\d+)-day itinerary")?
                .captures(transcript)
                .and_then(|caps| caps[1].parse().ok())
                .unwrap_or(1);
            return Ok(AgentStep::answer(itinerary(days)));
        }

        Ok(AgentStep::answer(GUIDE))
    }
}

fn bangkok() -> TripParameters {
    TripRequest {
        outbound_date: "2025-03-01".to_string(),
        return_date: "2025-03-08".to_string(),
        ..TripRequest::default()
    }
    .validate()
    .unwrap()
}

fn config(dir: &TempDir) -> PlannerConfig {
    let mut storage = StorageConfig::rooted_at(dir.path());
    storage.read_retry = RetryPolicy::immediate(2);
    PlannerConfig {
        storage,
        ..PlannerConfig::default()
    }
}

/// Search client without an API key: every call returns an error string.
fn offline_tools() -> ToolRegistry {
    ToolRegistry::standard(SearchClient::new(SearchConfig::default()))
}

fn orchestrator(config: &PlannerConfig, model: Arc<TravelModel>) -> Orchestrator {
    Orchestrator::with_parts(config, model, offline_tools()).unwrap()
}

#[tokio::test]
async fn test_run_produces_four_non_empty_artifacts() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let orchestrator = orchestrator(&config, Arc::new(TravelModel::default()));

    let report = orchestrator.run(&bangkok()).await.unwrap();

    assert_eq!(report.phase, RunPhase::Bundled);
    assert_eq!(report.result.artifacts.len(), 4);
    assert!(report.result.placeholders.is_empty());
    assert_eq!(report.stages.len(), 8);
    assert_eq!(report.failed_stages(), 0);
    for (category, path) in &report.result.artifacts {
        let content = std::fs::read_to_string(path).unwrap();
        assert!(!content.trim().is_empty(), "{} is empty", category);
    }
}

#[tokio::test]
async fn test_verification_output_is_category_pure() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let model = Arc::new(TravelModel {
        leak_hotels_into_flights: true,
        ..TravelModel::default()
    });
    let orchestrator = orchestrator(&config, model);

    let report = orchestrator.run(&bangkok()).await.unwrap();

    let draft = std::fs::read_to_string(orchestrator.store().draft_path(Category::Flight)).unwrap();
    assert!(draft.contains("Kempinski"));

    let flights = std::fs::read_to_string(&report.result.artifacts[&Category::Flight]).unwrap();
    assert!(!flights.contains("Kempinski"));
    assert!(!flights.contains("per night"));
    assert!(flights.contains("TG 330"));

    let outcome = report.outcome(StageId::verified(Category::Flight)).unwrap();
    assert_eq!(outcome.removed_sections.len(), 1);
    assert_eq!(outcome.removed_sections[0].detected, Category::Hotel);
}

#[tokio::test]
async fn test_search_error_still_yields_draft() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let model = Arc::new(TravelModel {
        search_flights_first: true,
        ..TravelModel::default()
    });
    let orchestrator = orchestrator(&config, model);

    let report = orchestrator.run(&bangkok()).await.unwrap();

    let outcome = report.outcome(StageId::draft(Category::Flight)).unwrap();
    assert_eq!(outcome.status, StageStatus::Completed);
    let draft = std::fs::read_to_string(orchestrator.store().draft_path(Category::Flight)).unwrap();
    assert!(draft.contains("TG 330"));
    assert!(draft.contains("search failed"));
    assert!(!report.result.is_placeholder(Category::Flight));
}

#[tokio::test]
async fn test_failed_verification_gets_placeholder() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let model = Arc::new(TravelModel {
        fail_verification_of: Some("Siam Kempinski"),
        ..TravelModel::default()
    });
    let orchestrator = orchestrator(&config, model);

    let report = orchestrator.run(&bangkok()).await.unwrap();

    assert_eq!(report.phase, RunPhase::Bundled);
    assert_eq!(report.result.placeholders, vec![Category::Hotel]);
    let outcome = report.outcome(StageId::verified(Category::Hotel)).unwrap();
    assert_eq!(outcome.status, StageStatus::Failed);
    assert!(outcome.error.as_deref().unwrap_or("").contains("model overloaded"));

    let hotels = std::fs::read_to_string(&report.result.artifacts[&Category::Hotel]).unwrap();
    assert!(hotels.contains("Hotel Recommendations"));
    assert!(hotels.contains("Sorry, there was an issue generating this content"));
}

#[tokio::test]
async fn test_archive_round_trip_is_byte_exact() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let orchestrator = orchestrator(&config, Arc::new(TravelModel::default()));
    let report = orchestrator.run(&bangkok()).await.unwrap();

    let archive = ResultBundler::package(&report.result).await.unwrap();
    let entries = ResultBundler::unpack(&archive).unwrap();

    assert_eq!(entries.len(), 4);
    for (category, path) in &report.result.artifacts {
        let original = std::fs::read(path).unwrap();
        let name = format!("{}.md", category.key());
        assert_eq!(entries[&name], original, "{} differs", name);
    }
}

#[test]
fn test_return_before_outbound_is_input_error() {
    let request = TripRequest {
        outbound_date: "2025-03-08".to_string(),
        return_date: "2025-03-01".to_string(),
        ..TripRequest::default()
    };

    let err = request.validate().unwrap_err();
    assert!(matches!(err, TripValidationError::ReturnNotAfterOutbound { .. }));
}

#[tokio::test]
async fn test_seven_day_trip_yields_seven_day_itinerary() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let model = Arc::new(TravelModel::default());
    let orchestrator = orchestrator(&config, Arc::clone(&model));
    let trip = bangkok();
    assert_eq!(trip.destination(), "Bangkok, Thailand");

    let report = orchestrator.run(&trip).await.unwrap();

    assert_eq!(report.expected_days, 7);
    assert_eq!(report.itinerary_days, 7);
    let verified = report
        .outcome(StageId::verified(Category::Itinerary))
        .unwrap();
    assert!(verified.removed_sections.is_empty());
    assert!(model
        .verification_transcripts()
        .iter()
        .any(|t| t.contains("Verify the 7-day itinerary for Bangkok, Thailand")));
}

#[tokio::test]
async fn test_per_category_mode_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let config = PlannerConfig {
        execution: ExecutionMode::PerCategory,
        ..config(&dir)
    };
    let orchestrator = orchestrator(&config, Arc::new(TravelModel::default()));

    let report = orchestrator.run(&bangkok()).await.unwrap();

    assert_eq!(report.phase, RunPhase::Bundled);
    assert!(report.result.placeholders.is_empty());
    assert_eq!(report.stages.len(), 8);
    for category in Category::ALL {
        let draft = report.outcome(StageId::draft(category)).unwrap();
        let verified = report.outcome(StageId::verified(category)).unwrap();
        assert_eq!(draft.status, StageStatus::Completed);
        assert_eq!(verified.status, StageStatus::Completed);
    }
}

#[tokio::test]
async fn test_events_stream_whole_run() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir);
    let (tx, mut rx) = mpsc::channel(256);
    let orchestrator =
        orchestrator(&config, Arc::new(TravelModel::default())).with_event_channel(tx);

    orchestrator.run(&bangkok()).await.unwrap();
    drop(orchestrator);

    let mut kinds = Vec::new();
    while let Some(event) = rx.recv().await {
        kinds.push(event.kind);
    }
    assert_eq!(kinds.first(), Some(&PipelineEventKind::RunStarted));
    assert_eq!(kinds.last(), Some(&PipelineEventKind::RunCompleted));
    let phases = kinds
        .iter()
        .filter(|k| **k == PipelineEventKind::PhaseChanged)
        .count();
    assert_eq!(phases, 3);
    let started = kinds
        .iter()
        .filter(|k| **k == PipelineEventKind::StageStarted)
        .count();
    assert_eq!(started, 8);
}
