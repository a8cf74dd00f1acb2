//! # HTTP API
//!
//! Router, shared state and OpenAPI document for the planning service.

pub mod plan;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, RwLock};
use utoipa::{OpenApi, ToSchema};

use wayfarer_core::models::LlmProvider;
use wayfarer_core::pipeline::PipelineEvent;
use wayfarer_core::{ExecutionMode, PlannerConfig, TripRequest};

use plan::RunSlot;

/// Application state
pub struct AppState {
    config: PlannerConfig,
    config_path: PathBuf,
    run: RwLock<RunSlot>,
    event_tx: broadcast::Sender<PipelineEvent>,
}

pub type SharedState = Arc<AppState>;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse {
    success: bool,
    message: String,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Effective configuration. Secrets are reported only as present or absent.
#[derive(Serialize, ToSchema)]
pub struct ConfigResponse {
    config_path: String,
    provider: String,
    model: String,
    base_url: Option<String>,
    search_endpoint: String,
    search_api_key_configured: bool,
    currency: String,
    language: String,
    country: String,
    /// sequential or per_category
    execution: String,
    agent_max_iterations: u32,
    draft_dir: String,
    final_dir: String,
    read_retry_attempts: u32,
    read_retry_delay_ms: u64,
}

#[derive(Serialize, ToSchema)]
pub struct ProviderInfo {
    id: String,
    name: String,
    default_model: String,
    api_key_env: String,
    supports_base_url: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ProvidersResponse {
    providers: Vec<ProviderInfo>,
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Wayfarer API",
        version = "1.0.0",
        description = "API for the Wayfarer travel planning pipeline"
    ),
    paths(
        plan::get_status,
        plan::start_plan,
        plan::get_result,
        plan::get_archive,
        get_config,
        get_providers
    ),
    components(
        schemas(
            ApiResponse,
            ConfigResponse,
            ProviderInfo,
            ProvidersResponse,
            TripRequest,
            plan::PlanStatus,
            plan::PlanResultResponse,
            plan::ErrorNotice
        )
    ),
    tags(
        (name = "plan", description = "Travel plan generation"),
        (name = "config", description = "Effective configuration"),
        (name = "providers", description = "LLM provider discovery")
    )
)]
struct ApiDoc;

/// Get the effective configuration
#[utoipa::path(
    get,
    path = "/api/v1/config",
    tag = "config",
    responses(
        (status = 200, description = "Configuration loaded at startup", body = ConfigResponse)
    )
)]
async fn get_config(State(state): State<SharedState>) -> Json<ConfigResponse> {
    let config = &state.config;
    let execution = match config.execution {
        ExecutionMode::Sequential => "sequential",
        ExecutionMode::PerCategory => "per_category",
    };
    Json(ConfigResponse {
        config_path: state.config_path.display().to_string(),
        provider: config.model.provider.id().to_string(),
        model: config.model.model.clone(),
        base_url: config.model.base_url.clone(),
        search_endpoint: config.search.endpoint.clone(),
        search_api_key_configured: config.search.api_key.is_some(),
        currency: config.search.currency.clone(),
        language: config.search.language.clone(),
        country: config.search.country.clone(),
        execution: execution.to_string(),
        agent_max_iterations: config.agent_max_iterations,
        draft_dir: config.storage.draft_dir.display().to_string(),
        final_dir: config.storage.final_dir.display().to_string(),
        read_retry_attempts: config.storage.read_retry.attempts,
        read_retry_delay_ms: config.storage.read_retry.delay_ms,
    })
}

/// Get available LLM providers
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    tag = "providers",
    responses(
        (status = 200, description = "Supported providers", body = ProvidersResponse)
    )
)]
async fn get_providers() -> Json<ProvidersResponse> {
    let providers = LlmProvider::all()
        .into_iter()
        .map(|provider| ProviderInfo {
            id: provider.id().to_string(),
            name: provider.display_name().to_string(),
            default_model: provider.default_model().to_string(),
            api_key_env: provider.key_env_var().to_string(),
            supports_base_url: provider.supports_base_url(),
        })
        .collect();
    Json(ProvidersResponse { providers })
}

async fn serve_openapi() -> impl IntoResponse {
    let doc = ApiDoc::openapi().to_json().unwrap_or_default();
    ([(header::CONTENT_TYPE, "application/json")], doc)
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .nest("/api/v1/plan", plan::plan_routes())
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/providers", get(get_providers))
        .route("/api/v1/openapi.json", get(serve_openapi))
        .with_state(state)
}

pub async fn run_server(config: PlannerConfig, config_path: PathBuf, port: u16) -> anyhow::Result<()> {
    let (event_tx, _) = broadcast::channel::<PipelineEvent>(100);

    let state: SharedState = Arc::new(AppState {
        config,
        config_path,
        run: RwLock::new(RunSlot::default()),
        event_tx,
    });

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Wayfarer server running at http://{}", addr);
    tracing::info!("Plan:   POST /api/v1/plan, GET /api/v1/plan/status, /result, /archive, /events");
    tracing::info!("Config: GET /api/v1/config, /api/v1/providers, /api/v1/openapi.json");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
