//! # Errors
//!
//! Typed failures for intake validation and orchestration.
//!
//! Component failures (search provider, language model) never show up here:
//! they are converted to content at their call site. Only defects that stop
//! the planner from producing its four documents become a [`PlannerError`].

use thiserror::Error;

/// Rejections raised while validating a [`crate::trip::TripRequest`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TripValidationError {
    #[error("destination must not be empty")]
    EmptyDestination,

    #[error("hotel city must not be empty")]
    EmptyHotelCity,

    #[error("{field} must be a 3-letter IATA airport code, got '{value}'")]
    InvalidAirportCode { field: &'static str, value: String },

    #[error("{field} must be a YYYY-MM-DD date, got '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("return date {return_date} must be after outbound date {outbound}")]
    ReturnNotAfterOutbound { outbound: String, return_date: String },

    #[error("at least one adult is required")]
    NoAdults,

    #[error("at least one room is required")]
    NoRooms,

    #[error("hotel class must be between 1 and 5 stars, got {0}")]
    HotelClassOutOfRange(u8),

    #[error("unknown budget tier '{0}' (expected Budget, Mid-range or Luxury)")]
    UnknownBudgetTier(String),
}

/// Orchestration-level failures surfaced to the caller.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("invalid trip parameters: {0}")]
    InvalidInput(#[from] TripValidationError),

    #[error("storage failure at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive packaging failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl PlannerError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Stable classification shown to users in the top-level error notice.
    pub fn kind(&self) -> &'static str {
        match self {
            PlannerError::InvalidInput(_) => "InvalidInput",
            PlannerError::Io { .. } => "StorageError",
            PlannerError::Archive(_) => "ArchiveError",
            PlannerError::Serialization(_) => "SerializationError",
            PlannerError::Config(_) => "ConfigError",
        }
    }

    /// Technical detail payload, including the source chain.
    pub fn detail(&self) -> String {
        let mut detail = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            detail.push_str(&format!("\n  caused by: {}", err));
            source = err.source();
        }
        detail
    }

    /// Whether the failure was caused by the caller's input rather than the run.
    pub fn is_input_error(&self) -> bool {
        matches!(self, PlannerError::InvalidInput(_))
    }
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;
