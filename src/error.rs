use thiserror::Error;

/// Main error type for the stats engine
#[derive(Error, Debug)]
pub enum StatsEngineError {
    /// Missing or malformed request parameters
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Player name could not be resolved
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    /// Upstream returned no rows for the query
    #[error("No stats found for {0}")]
    NoData(String),

    /// Upstream provider errors (non-2xx, malformed payload, network)
    #[error("Upstream '{source_name}' error: {message}")]
    Upstream { source_name: String, message: String },

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Cache errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

impl StatsEngineError {
    /// Shorthand for an upstream failure
    pub fn upstream(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        StatsEngineError::Upstream {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// True for caller mistakes (HTTP 400)
    pub fn is_validation(&self) -> bool {
        matches!(self, StatsEngineError::Validation(_))
    }

    /// True when the player or their data does not exist (HTTP 404)
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StatsEngineError::PlayerNotFound(_) | StatsEngineError::NoData(_)
        )
    }

    /// Owned copy with the same classification and message.
    ///
    /// Transport and decode errors are not `Clone`; they come back as
    /// `Upstream` failures carrying the original text.
    pub fn replicate(&self) -> Self {
        match self {
            StatsEngineError::Validation(m) => StatsEngineError::Validation(m.clone()),
            StatsEngineError::PlayerNotFound(m) => StatsEngineError::PlayerNotFound(m.clone()),
            StatsEngineError::NoData(m) => StatsEngineError::NoData(m.clone()),
            StatsEngineError::Upstream { source_name, message } => {
                StatsEngineError::upstream(source_name.clone(), message.clone())
            }
            StatsEngineError::HttpRequest(e) => StatsEngineError::upstream("http", e.to_string()),
            StatsEngineError::Json(e) => StatsEngineError::upstream("json", e.to_string()),
            StatsEngineError::Cache(m) => StatsEngineError::Cache(m.clone()),
            StatsEngineError::Config(m) => StatsEngineError::Config(m.clone()),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StatsEngineError>;
