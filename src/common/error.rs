use thiserror::Error;

/// Result type for tier, responder and orchestrator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while serving a cache request.
///
/// The first four variants are application errors: they describe the outcome
/// of a well-formed request and are answered with a protocol-level reply. The
/// remaining variants are failures of a tier or of the client connection.
#[derive(Debug, Error)]
pub enum Error {
    #[error("key not found")]
    KeyNotFound,

    #[error("key exists")]
    KeyExists,

    #[error("value too large")]
    ValueTooBig,

    #[error("unknown command")]
    UnknownCommand,

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error is an expected protocol outcome rather than a failure.
    pub fn is_app_error(&self) -> bool {
        matches!(
            self,
            Error::KeyNotFound | Error::KeyExists | Error::ValueTooBig | Error::UnknownCommand
        )
    }
}
