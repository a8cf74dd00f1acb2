//! # Plan API
//!
//! Start a planning run, poll its status, fetch the four documents or the
//! archive, and follow progress over SSE. One run at a time.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Json, Response,
    },
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::{Stream, StreamExt};
use utoipa::ToSchema;

use wayfarer_core::pipeline::{PipelineEvent, PipelineEventKind};
use wayfarer_core::{
    ArtifactStore, Category, Orchestrator, PlannerError, ResultBundler, TripParameters,
    TripRequest,
};

use super::{ApiResponse, SharedState};

const IDLE: &str = "idle";
const RUNNING: &str = "running";
const COMPLETED: &str = "completed";
const FAILED: &str = "failed";

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlanStatus {
    /// idle, running, completed or failed
    status: String,
    run_id: Option<String>,
    phase: Option<String>,
    destination: Option<String>,
}

impl Default for PlanStatus {
    fn default() -> Self {
        Self {
            status: IDLE.to_string(),
            run_id: None,
            phase: None,
            destination: None,
        }
    }
}

/// Top-level failure shown instead of the documents.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorNotice {
    /// Stable classification, e.g. StorageError
    kind: String,
    message: String,
    /// Technical detail including the cause chain
    detail: String,
}

impl ErrorNotice {
    /// The run task ended without producing a report.
    fn aborted(detail: String) -> Self {
        Self {
            kind: "InternalError".to_string(),
            message: "An error occurred while generating your travel plan.".to_string(),
            detail,
        }
    }
}

impl From<&PlannerError> for ErrorNotice {
    fn from(err: &PlannerError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: "An error occurred while generating your travel plan.".to_string(),
            detail: err.detail(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanResultResponse {
    status: String,
    /// Category key to Markdown document
    documents: BTreeMap<String, String>,
    /// Categories whose document is a failure placeholder
    placeholders: Vec<String>,
    itinerary_days: Option<usize>,
    expected_days: Option<i64>,
    error: Option<ErrorNotice>,
}

/// Current run slot. Replaced wholesale when a new run starts.
#[derive(Default)]
pub struct RunSlot {
    status: PlanStatus,
    trip: Option<TripParameters>,
    report: Option<wayfarer_core::RunReport>,
    error: Option<ErrorNotice>,
}

pub fn plan_routes() -> Router<SharedState> {
    Router::new()
        .route("/", post(start_plan))
        .route("/status", get(get_status))
        .route("/result", get(get_result))
        .route("/archive", get(get_archive))
        .route("/events", get(events))
}

/// Get plan status
#[utoipa::path(
    get,
    path = "/api/v1/plan/status",
    tag = "plan",
    responses(
        (status = 200, description = "Current run status", body = PlanStatus)
    )
)]
pub async fn get_status(State(state): State<SharedState>) -> Json<PlanStatus> {
    let slot = state.run.read().await;
    Json(slot.status.clone())
}

/// Start planning a trip
#[utoipa::path(
    post,
    path = "/api/v1/plan",
    tag = "plan",
    request_body = TripRequest,
    responses(
        (status = 202, description = "Run started", body = ApiResponse),
        (status = 409, description = "A run is already in progress", body = ApiResponse),
        (status = 422, description = "Invalid trip parameters", body = ApiResponse)
    )
)]
pub async fn start_plan(
    State(state): State<SharedState>,
    Json(req): Json<TripRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let trip = match req.validate() {
        Ok(trip) => trip,
        Err(e) => {
            tracing::info!(error = %e, "Rejected trip parameters");
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse::error(e.to_string())),
            );
        }
    };

    {
        let mut slot = state.run.write().await;
        if slot.status.status == RUNNING {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A travel plan is already being generated")),
            );
        }
        *slot = RunSlot {
            status: PlanStatus {
                status: RUNNING.to_string(),
                destination: Some(trip.destination().to_string()),
                ..PlanStatus::default()
            },
            trip: Some(trip.clone()),
            ..RunSlot::default()
        };
    }

    let message = format!(
        "Planning {} days in {}",
        trip.trip_days(),
        trip.destination()
    );
    let run = tokio::spawn(execute_run(state.clone(), trip));
    tokio::spawn(supervise_run(state, run));

    (StatusCode::ACCEPTED, Json(ApiResponse::ok(message)))
}

/// Release the slot if the run task dies before recording an outcome.
async fn supervise_run(state: SharedState, run: JoinHandle<()>) {
    let Err(e) = run.await else {
        return;
    };
    tracing::error!(error = %e, "Planning task aborted");

    let mut slot = state.run.write().await;
    if slot.status.status == RUNNING {
        slot.status.status = FAILED.to_string();
        slot.error = Some(ErrorNotice::aborted(e.to_string()));
    }
}

async fn execute_run(state: SharedState, trip: TripParameters) {
    let (tx, mut rx) = mpsc::channel::<PipelineEvent>(64);

    let forwarder = {
        let state = state.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match event.kind {
                    PipelineEventKind::RunStarted => {
                        let run_id = event
                            .data
                            .as_ref()
                            .and_then(|d| d.get("run_id"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string);
                        state.run.write().await.status.run_id = run_id;
                    }
                    PipelineEventKind::PhaseChanged => {
                        let phase = event
                            .data
                            .as_ref()
                            .and_then(|d| d.get("phase"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string);
                        state.run.write().await.status.phase = phase;
                    }
                    _ => {}
                }
                // No subscribers is fine
                let _ = state.event_tx.send(event);
            }
        })
    };

    let outcome = match Orchestrator::new(&state.config) {
        Ok(orchestrator) => orchestrator.with_event_channel(tx).run(&trip).await,
        Err(e) => {
            drop(tx);
            Err(e)
        }
    };
    let _ = forwarder.await;

    let mut slot = state.run.write().await;
    match outcome {
        Ok(report) => {
            slot.status.status = COMPLETED.to_string();
            slot.status.run_id = Some(report.run_id.clone());
            slot.report = Some(report);
        }
        Err(e) => {
            tracing::error!(kind = e.kind(), "Travel plan failed: {}", e.detail());
            slot.status.status = FAILED.to_string();
            slot.error = Some(ErrorNotice::from(&e));
        }
    }
}

/// Get the generated documents
#[utoipa::path(
    get,
    path = "/api/v1/plan/result",
    tag = "plan",
    responses(
        (status = 200, description = "Four documents, pending notices, or the error notice", body = PlanResultResponse)
    )
)]
pub async fn get_result(State(state): State<SharedState>) -> Json<PlanResultResponse> {
    let (status, report, error) = {
        let slot = state.run.read().await;
        (slot.status.status.clone(), slot.report.clone(), slot.error.clone())
    };

    let mut response = PlanResultResponse {
        status,
        documents: Category::ALL
            .into_iter()
            .map(|category| (category.key().to_string(), category.pending_notice()))
            .collect(),
        placeholders: Vec::new(),
        itinerary_days: None,
        expected_days: None,
        error,
    };

    if let Some(report) = report {
        let store = ArtifactStore::new(&state.config.storage);
        for (category, text) in report.result.documents(&store).await {
            response.documents.insert(category.key().to_string(), text);
        }
        response.placeholders = report
            .result
            .placeholders
            .iter()
            .map(|category| category.key().to_string())
            .collect();
        response.itinerary_days = Some(report.itinerary_days);
        response.expected_days = Some(report.expected_days);
    }

    Json(response)
}

/// Download all documents as a zip archive
#[utoipa::path(
    get,
    path = "/api/v1/plan/archive",
    tag = "plan",
    responses(
        (status = 200, description = "Zip archive of the four documents", body = Vec<u8>, content_type = "application/zip"),
        (status = 404, description = "No completed plan", body = ApiResponse)
    )
)]
pub async fn get_archive(State(state): State<SharedState>) -> Response {
    let (report, trip) = {
        let slot = state.run.read().await;
        (slot.report.clone(), slot.trip.clone())
    };
    let (Some(report), Some(trip)) = (report, trip) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No completed travel plan")),
        )
            .into_response();
    };

    match ResultBundler::package(&report.result).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "application/zip".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", trip.archive_name()),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Archive packaging failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(e.detail())),
            )
                .into_response()
        }
    }
}

/// SSE endpoint for pipeline events with heartbeat
pub async fn events(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.event_tx.subscribe()).map(|item| {
        let event = match item {
            Ok(event) => Event::default()
                .event("pipeline")
                .data(serde_json::to_string(&event).unwrap_or_default()),
            // Lagged receivers skip ahead
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                Event::default().comment(format!("skipped {} events", skipped))
            }
        };
        Ok::<_, Infallible>(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tokio::sync::{broadcast, RwLock};
    use tower::ServiceExt; // for `oneshot`

    use wayfarer_core::PlannerConfig;

    use crate::api::{router, AppState};

    fn test_state(slot: RunSlot) -> SharedState {
        let (event_tx, _) = broadcast::channel(16);
        Arc::new(AppState {
            config: PlannerConfig::default(),
            config_path: ".wayfarer/config.json".into(),
            run: RwLock::new(slot),
            event_tx,
        })
    }

    fn running_slot() -> RunSlot {
        RunSlot {
            status: PlanStatus {
                status: RUNNING.to_string(),
                destination: Some("Bangkok, Thailand".to_string()),
                ..PlanStatus::default()
            },
            ..RunSlot::default()
        }
    }

    async fn send(state: SharedState, request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    fn post_plan(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/plan")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn test_trip_request_fills_defaults() {
        let req: TripRequest = serde_json::from_str(
            r#"{"destination": "Tokyo, Japan", "outbound_date": "2025-04-01", "return_date": "2025-04-05"}"#,
        )
        .unwrap();
        let trip = req.validate().unwrap();
        assert_eq!(trip.destination(), "Tokyo, Japan");
        assert_eq!(trip.adults(), 2);
        assert_eq!(trip.trip_days(), 4);
    }

    #[test]
    fn test_error_notice_carries_classification() {
        let err = PlannerError::Config("bad".to_string());
        let notice = ErrorNotice::from(&err);
        assert_eq!(notice.kind, "ConfigError");
        assert!(notice.detail.contains("bad"));
    }

    #[tokio::test]
    async fn test_invalid_trip_is_rejected() {
        let state = test_state(RunSlot::default());
        let (status, body) = send(
            state.clone(),
            post_plan(json!({"outbound_date": "2025-03-08", "return_date": "2025-03-01"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert!(body["message"].as_str().unwrap().contains("must be after"));
        assert_eq!(state.run.read().await.status.status, IDLE);
    }

    #[tokio::test]
    async fn test_second_run_conflicts() {
        let state = test_state(running_slot());
        let (status, body) = send(
            state.clone(),
            post_plan(json!({"outbound_date": "2025-03-01", "return_date": "2025-03-08"})),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        let slot = state.run.read().await;
        assert_eq!(slot.status.status, RUNNING);
        assert!(slot.trip.is_none());
    }

    #[tokio::test]
    async fn test_archive_missing_before_any_run() {
        let (status, body) =
            send(test_state(RunSlot::default()), get_request("/api/v1/plan/archive")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_result_shows_pending_notices() {
        let (status, body) =
            send(test_state(running_slot()), get_request("/api/v1/plan/result")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], RUNNING);
        assert_eq!(
            body["documents"]["itinerary_recommendations"],
            Category::Itinerary.pending_notice()
        );
        assert_eq!(body["documents"].as_object().unwrap().len(), 4);
        assert!(body["error"].is_null());
    }

    #[tokio::test]
    async fn test_result_shows_error_notice() {
        let slot = RunSlot {
            status: PlanStatus {
                status: FAILED.to_string(),
                ..PlanStatus::default()
            },
            error: Some(ErrorNotice::from(&PlannerError::Archive(zip::result::ZipError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))))),
            ..RunSlot::default()
        };
        let (status, body) =
            send(test_state(slot), get_request("/api/v1/plan/result")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], FAILED);
        assert_eq!(body["error"]["kind"], "ArchiveError");
        assert!(body["error"]["detail"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_aborted_run_releases_slot() {
        let state = test_state(running_slot());
        let run = tokio::spawn(async { panic!("provider client crashed") });

        supervise_run(state.clone(), run).await;

        let (status, body) = send(state, get_request("/api/v1/plan/status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], FAILED);
    }

    #[tokio::test]
    async fn test_finished_run_is_left_alone() {
        let state = test_state(running_slot());
        state.run.write().await.status.status = COMPLETED.to_string();
        let run = tokio::spawn(async {});

        supervise_run(state.clone(), run).await;

        let slot = state.run.read().await;
        assert_eq!(slot.status.status, COMPLETED);
        assert!(slot.error.is_none());
    }
}
