/// The main error type for EduDash entitlement operations
#[derive(Debug, thiserror::Error)]
pub enum EduDashError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl EduDashError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    /// Whether the caller supplied bad input (as opposed to a server fault).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

/// Result type alias for EduDash operations
pub type Result<T> = std::result::Result<T, EduDashError>;

impl From<serde_json::Error> for EduDashError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            EduDashError::BadRequest(format!("JSON error: {}", err))
        } else {
            EduDashError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}
