//! Protocol error types.

use thiserror::Error;

/// Errors raised while building requests or decoding replies.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("command {command} requires argument {argument:?}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("command {command} requires credentials for {argument:?}")]
    MissingCredentials {
        command: &'static str,
        argument: &'static str,
    },

    #[error("command arguments must be a JSON object")]
    ArgumentsNotObject,

    #[error("malformed reply: {0}")]
    MalformedReply(String),

    #[error("reply too large: {size} bytes (max {max})")]
    ReplyTooLarge { size: usize, max: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProtocolError {
    /// Returns whether the caller supplied a bad command or bad arguments.
    ///
    /// These are raised before any network I/O and are never worth retrying.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ProtocolError::UnknownCommand(_)
                | ProtocolError::MissingArgument { .. }
                | ProtocolError::MissingCredentials { .. }
                | ProtocolError::ArgumentsNotObject
        )
    }
}
