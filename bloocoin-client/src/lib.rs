//! # bloocoin-client
//!
//! Client library for the Bloocoin ledger server.
//!
//! This crate provides:
//! - One TCP connection per request, with connect/write/read timeouts
//! - Command execution with incremental reply decoding
//! - Typed helpers for every catalog command
//! - Bloostamp credential storage and random hash generation

pub mod client;
pub mod connection;
pub mod error;
pub mod hash;
pub mod stamp;

pub use client::Client;
pub use connection::{Channel, ClientConfig, Connector, Endpoint, TcpChannel, TcpConnector};
pub use error::{ClientError, ConnectFailure, TransportOp};
pub use stamp::{Bloostamp, StampError, StampStore};
