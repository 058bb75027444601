use thiserror::Error;

/// Error taxonomy for provisioning operations.
///
/// `Validation` failures happen before any provider call and never require
/// rollback. `Api` failures wrap the underlying provider error with human
/// context and trigger a compensation drain in the coordinator. `Duplicate`
/// is surfaced separately so callers can choose to adopt an existing
/// resource instead of failing outright.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Wrapped provider failure plus human-readable context.
    #[error("{context}: {message}")]
    Api { context: String, message: String },

    /// A resource with the requested identity already exists.
    #[error("{what} already exists")]
    Duplicate { what: String },

    /// A bounded wait was exhausted before the resource became ready.
    #[error("{what} was not ready after {attempts} attempts")]
    NotReady { what: String, attempts: u32 },

    /// The underlying provider client was never initialized.
    #[error("no {0} session found")]
    SessionMissing(&'static str),

    /// Caller error caught before any provider mutation.
    #[error("{0}")]
    Validation(String),

    /// A continuation token could not be opened or decoded.
    #[error("continuation token could not be decoded: {0}")]
    Token(String),
}

impl ProvisionError {
    pub fn api(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        ProvisionError::Api {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error happened before any provider mutation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ProvisionError::Validation(_) | ProvisionError::Token(_)
        )
    }
}
