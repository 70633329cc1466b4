use thiserror::Error;

/// The five error kinds of the external error taxonomy. Every variant maps
/// to exactly one machine code via [`AtlasError::kind`].
#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Upstream degraded: {provider} — {reason}")]
    UpstreamDegraded { provider: String, reason: String },

    #[error("Timeout: asset {asset_id} exceeded deadline of {deadline_ms}ms")]
    Timeout { asset_id: String, deadline_ms: u64 },

    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AtlasError {
    /// Machine-readable error code matching the external error taxonomy.
    pub fn kind(&self) -> &'static str {
        match self {
            AtlasError::InvalidInput { .. } => "INVALID_INPUT",
            AtlasError::ModelNotAvailable { .. } => "MODEL_NOT_AVAILABLE",
            AtlasError::UpstreamDegraded { .. } => "UPSTREAM_DEGRADED",
            AtlasError::Timeout { .. } => "TIMEOUT",
            AtlasError::Internal { .. } => "INTERNAL",
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AtlasError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(e: serde_json::Error) -> Self {
        AtlasError::Internal {
            detail: format!("serialization error: {e}"),
        }
    }
}

pub type AtlasResult<T> = Result<T, AtlasError>;
