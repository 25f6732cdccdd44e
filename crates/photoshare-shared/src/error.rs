use thiserror::Error;

/// Failure of a call against the backend (identity, data or object store).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// A required field is missing or empty, or an input is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The caller lacks the grant for the operation (ownership or principal class).
    #[error("Not authorized: {0}")]
    Authorization(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Sign-in or confirmation attempted on an account that is not confirmed.
    #[error("Account not confirmed: {0}")]
    Unconfirmed(String),

    /// Anything else that went wrong talking to the backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Coarse classification used by controllers to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Unconfirmed,
    Backend,
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn authorization(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Self::Backend(msg.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Authorization(_) => ErrorKind::Authorization,
            ApiError::NotFound { .. } => ErrorKind::NotFound,
            ApiError::Unconfirmed(_) => ErrorKind::Unconfirmed,
            ApiError::Backend(_) => ErrorKind::Backend,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// Convenience alias used by every backend trait.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
