//! Client error types.

use bloocoin_protocol::ProtocolError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Transport step that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOp {
    Send,
    Receive,
    /// Waiting for the whole reply across all reads.
    Reply,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportOp::Send => write!(f, "send"),
            TransportOp::Receive => write!(f, "receive"),
            TransportOp::Reply => write!(f, "reply"),
        }
    }
}

/// Why a connection attempt failed.
#[derive(Debug, Error)]
pub enum ConnectFailure {
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    #[error("{0}")]
    Refused(std::io::Error),
}

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid argument: {0}")]
    InvalidArgument(ProtocolError),

    #[error("{op} timed out after {timeout:?}")]
    ConnectionTimeout { op: TransportOp, timeout: Duration },

    #[error("server {endpoint} unreachable: {reason}")]
    Unreachable {
        endpoint: String,
        reason: ConnectFailure,
    },

    #[error("connection closed before a complete reply")]
    ConnectionClosed,

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("server rejected request: {message}")]
    Rejected { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        if err.is_invalid_argument() {
            ClientError::InvalidArgument(err)
        } else {
            ClientError::Protocol(err)
        }
    }
}

impl ClientError {
    /// Returns whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::ConnectionTimeout { .. }
                | ClientError::Unreachable { .. }
                | ClientError::ConnectionClosed
        )
    }

    /// Returns whether the server could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, ClientError::Unreachable { .. })
    }

    /// Returns whether this is a send/receive/reply timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::ConnectionTimeout { .. })
    }
}
