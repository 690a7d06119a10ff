//! # bloocoin-protocol
//!
//! Wire protocol for the Bloocoin ledger server.
//!
//! This crate provides:
//! - The command catalog and request validation
//! - Request/reply message types
//! - ASCII JSON request encoding
//! - Incremental reassembly of unframed JSON replies

pub mod catalog;
pub mod codec;
pub mod error;
pub mod message;

pub use catalog::{commands, describe, CommandDescriptor};
pub use codec::{Encoder, ReplyAssembler};
pub use error::ProtocolError;
pub use message::{AddressBalance, CommandRequest, Credentials, ReplyEnvelope, Transaction};

/// Default server host.
pub const DEFAULT_HOST: &str = "server.bloocoin.org";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3122;

/// Maximum accepted reply size (1 MiB).
pub const MAX_REPLY_SIZE: usize = 1024 * 1024;
