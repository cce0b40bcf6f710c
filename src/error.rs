use crate::transport::OperationKind;
use thiserror::Error;

/// Result type for stream-restore operations
pub type Result<T> = std::result::Result<T, StreamRestoreError>;

/// Errors that can occur while talking to the stream-restore database
#[derive(Error, Debug)]
pub enum StreamRestoreError {
    /// WebSocket connection error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection was closed before the session completed
    #[error("Connection closed")]
    ConnectionClosed,

    /// The server connection entered the failed state
    #[error("failed to connect: {0}")]
    ConnectionFailed(String),

    /// Request timed out waiting for response
    #[error("Request timeout")]
    Timeout,

    /// An operation could not be dispatched or was rejected by the server
    #[error("{operation} failed: {detail}")]
    Operation {
        /// Which operation failed
        operation: OperationKind,
        /// Error detail from the transport or server
        detail: String,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unexpected response from the server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested mutation could not be parsed or is out of range
    #[error("{0}")]
    InvalidMutation(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl StreamRestoreError {
    pub(crate) fn operation(operation: OperationKind, detail: impl Into<String>) -> Self {
        Self::Operation {
            operation,
            detail: detail.into(),
        }
    }
}
