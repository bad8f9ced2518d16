use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillflowError {
    /// A mandatory field is absent from caller-supplied input.
    #[error("required parameter is missing: {key}")]
    RequiredParameter { key: String },

    /// A field is present but malformed.
    #[error("invalid parameter {key}: {reason}")]
    InvalidParameter { key: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("warehouse error: {0}")]
    Warehouse(String),

    #[error("orchestrator error: {0}")]
    Orchestrator(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl BillflowError {
    pub fn required(key: impl Into<String>) -> Self {
        Self::RequiredParameter { key: key.into() }
    }

    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, mirrored in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::RequiredParameter { .. } => "ERROR_REQUIRED_PARAMETER",
            Self::InvalidParameter { .. } => "ERROR_INVALID_PARAMETER",
            Self::Config(_) => "ERROR_CONFIGURATION",
            Self::NotFound(_) => "ERROR_NOT_FOUND",
            Self::Warehouse(_) => "ERROR_WAREHOUSE",
            Self::Orchestrator(_) => "ERROR_ORCHESTRATOR",
            Self::Upstream(_) => "ERROR_UPSTREAM",
            Self::Internal(_) => "ERROR_INTERNAL",
        }
    }
}

pub type BillflowResult<T> = Result<T, BillflowError>;
