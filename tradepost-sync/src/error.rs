//! Error types for the sync layer.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
///
/// On the client every variant means the same thing: the message was logged
/// and discarded, and the state machine did not move.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Message not valid in the current state.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A wire message failed to decode.
    #[error("decode error: {0}")]
    Decode(serde_json::Error),

    /// Category payload exceeds the byte ceiling.
    #[error("payload of {len} bytes exceeds the {ceiling} byte ceiling")]
    PayloadTooLarge { len: usize, ceiling: usize },

    /// Category payload is empty.
    #[error("empty payload")]
    EmptyPayload,

    /// A request reached a process that is not the server.
    #[error("sync requests are only served in the server role")]
    NotServerRole,

    /// A request did not say who is asking.
    #[error("sync request has no requester")]
    MissingRequester,

    /// No progress within the sync timeout.
    #[error("operation timed out")]
    Timeout,

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// The transport has no route to this client.
    #[error("unknown client: {0}")]
    UnknownClient(String),
}
