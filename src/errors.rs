use thiserror::Error;

/// Failures of a single call to the completion endpoint.
/// The `Display` text is what the user sees inside the conversation.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Request blocked for safety reasons: {reason}")]
    SafetyBlocked { reason: String },

    #[error("Received an invalid or empty response from the API.")]
    EmptyReply,

    #[error("Malformed response from the API: {0}")]
    MalformedResponse(#[source] serde_json::Error),
}

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Please set your Gemini API key in the settings.")]
    ConfigurationMissing,

    // ── Conversation errors ──────────────────────────────────────────────────
    #[error("Conversation index {index} is out of range (len {len})")]
    OutOfRange { index: usize, len: usize },

    // ── Storage errors ───────────────────────────────────────────────────────
    #[error("Database connection failed: {0}")]
    DatabaseConnectionFailed(#[source] sqlx::Error),

    #[error("Database query failed: {message}")]
    DatabaseQueryFailed {
        message: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to serialize '{key}': {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Completion errors ────────────────────────────────────────────────────
    #[error(transparent)]
    Api(#[from] ApiError),

    // ── System errors ────────────────────────────────────────────────────────
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn db_query(message: impl Into<String>, source: sqlx::Error) -> Self {
        AppError::DatabaseQueryFailed { message: message.into(), source }
    }

    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        AppError::Serialization { key: key.into(), source }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::OutOfRange { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::ConfigurationMissing)
    }
}
