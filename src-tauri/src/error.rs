use thiserror::Error;

/// Errors raised by the audit services.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit not found: {0}")]
    NotFound(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Completed audits are archived and cannot be edited or re-tagged.
    #[error("Audit {0} is completed and cannot be edited.")]
    NotEditable(String),

    #[error("{0}")]
    Validation(String),

    #[error("Not signed in.")]
    NotSignedIn,

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Login and registration failures. These are shown inline, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Failed to log in. Please check your credentials.")]
    InvalidCredentials,

    #[error("Failed to register. Email might already be in use.")]
    EmailTaken,

    #[error("Name is required")]
    NameRequired,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<AuditError> for AuthError {
    fn from(err: AuditError) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type Result<T, E = AuditError> = std::result::Result<T, E>;
