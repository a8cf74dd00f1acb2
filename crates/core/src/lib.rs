//! # Wayfarer Core
//!
//! Travel planning pipeline: four role-specialised agents draft a destination
//! guide, flight options, hotel recommendations and an itinerary, a
//! verification agent checks each draft for accuracy and category purity,
//! and the bundler guarantees four documents plus a downloadable archive.
//!
//! ## Architecture
//!
//! - `trip` - Validated trip parameters
//! - `search` - SerpApi flight, hotel and web search client
//! - `tools` - Capability interface and fixed tool registry
//! - `agents` - Agent profiles, the language-model seam and the reasoning loop
//! - `pipeline` - Stage plan, run state machine, purity gate and orchestrator
//! - `state` - Draft/final artifact storage
//! - `bundler` - Placeholder guarantee and zip packaging
//!
//! ## Usage
//!
//! ```rust,ignore
//! use wayfarer_core::{Orchestrator, PlannerConfig, TripRequest};
//!
//! let config = PlannerConfig::load(".wayfarer/config.json").await?.with_env_overrides();
//! let trip = TripRequest::default().validate()?;
//! let report = Orchestrator::new(&config)?.run(&trip).await?;
//! ```

pub mod agents;
pub mod bundler;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
pub mod tools;
pub mod trip;

pub use bundler::{placeholder_text, ResultBundler, RunResult};
pub use config::{ExecutionMode, PlannerConfig};
pub use error::{PlannerError, PlannerResult, TripValidationError};
pub use pipeline::{Category, Orchestrator, PipelineEvent, RunReport};
pub use state::ArtifactStore;
pub use trip::{BudgetTier, TripParameters, TripRequest};
