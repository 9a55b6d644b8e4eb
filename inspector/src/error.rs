//! Error types for remote inspection
//!
//! Every cache fetch can fail in one of a few ways: the endpoint could not be
//! reached, it answered with something that is not the expected JSON-RPC
//! shape, or it answered correctly but reported a failure for one item.

use thiserror::Error;

use crate::remote::EntityId;

/// JSON-RPC error code the remote uses for an unknown entity handle
pub const ENTITY_NOT_FOUND_CODE: i64 = -23401;

/// Errors that can occur while talking to a remote endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    /// Connection refused, timeout, non-JSON body
    #[error("transport error: {0}")]
    Transport(String),

    /// Envelope without `result`, or a `result` of the wrong shape
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The remote answered with a JSON-RPC `error` object
    #[error("remote error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// Error message from the remote
        message: String,
    },

    /// The entity handle is unknown to the remote process
    #[error("entity {0} not found on remote")]
    EntityNotFound(EntityId),

    /// A single component could not be introspected
    #[error("component {path} cannot be reflected ({code}): {message}")]
    RemoteItem {
        /// Full component path
        path: String,
        /// Per-item error code
        code: i64,
        /// Per-item error message
        message: String,
    },
}

impl RemoteError {
    /// Map a generic RPC error to `EntityNotFound` when the code says so
    pub fn for_entity(self, entity: EntityId) -> Self {
        match self {
            RemoteError::Rpc { code, .. } if code == ENTITY_NOT_FOUND_CODE => {
                RemoteError::EntityNotFound(entity)
            }
            other => other,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// Result type alias for remote operations
pub type RemoteResult<T> = Result<T, RemoteError>;
