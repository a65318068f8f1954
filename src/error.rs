//! Error types for the autohost client
//!
//! Fallible functions return `anyhow::Result`; the variants of [`BotError`]
//! classify the failures that end the receive loop so callers can downcast
//! and decide how to report them.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Failure categories raised by the protocol engine and the lobby layer
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("Failed to connect to {address}: {message}")]
    ConnectionError { address: String, message: String },

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Malformed message ({reason}): {line:?}")]
    Parse { line: String, reason: String },

    #[error("Unsupported directive: {directive}")]
    UnsupportedDirective { directive: String },

    #[error("Event handler for '{event}' failed")]
    HandlerFailure { event: String },

    #[error("Host queue inconsistency: {reason}")]
    QueueConsistency { reason: String },

    #[error("Invalid client state: expected {expected}, found {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("Refusing to send a line containing CR or LF: {line:?}")]
    InvalidOutbound { line: String },

    #[error("Interrupted by {signal}")]
    Interrupted { signal: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl BotError {
    /// Find the innermost `BotError` in an error chain.
    ///
    /// Handler failures are wrapped in [`BotError::HandlerFailure`] context,
    /// so the outermost match is not always the one that caused the failure.
    pub fn root_of(error: &anyhow::Error) -> Option<&BotError> {
        error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<BotError>())
            .last()
    }
}
