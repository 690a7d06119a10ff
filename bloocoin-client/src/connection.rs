//! Connection management.
//!
//! Every request gets its own TCP connection. A [`Connector`] opens a
//! [`Channel`], the client sends one request and reads one reply, and the
//! channel is dropped on the way out, which closes the socket.

use crate::error::{ClientError, ConnectFailure, TransportOp};
use bloocoin_protocol::{DEFAULT_HOST, DEFAULT_PORT, MAX_REPLY_SIZE};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default read chunk size (1 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Minimum read chunk size.
pub const MIN_CHUNK_SIZE: usize = 256;

/// Maximum read chunk size (64 KiB).
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Default timeout for connect, each write, and each read.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// Default bound on the whole reply.
pub const DEFAULT_REPLY_TIMEOUT: Duration = Duration::from_secs(30);

/// Server host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error parsing an endpoint string.
#[derive(Debug, thiserror::Error)]
#[error("invalid endpoint {0:?}: expected host:port")]
pub struct EndpointParseError(String);

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    /// Parses `host:port`, or a bare host with the default port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => {
                let port = port
                    .parse()
                    .map_err(|_| EndpointParseError(s.to_string()))?;
                Ok(Self::new(host, port))
            }
            Some(_) => Err(EndpointParseError(s.to_string())),
            None if !s.is_empty() => Ok(Self::new(s, DEFAULT_PORT)),
            None => Err(EndpointParseError(s.to_string())),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server address.
    pub endpoint: Endpoint,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for writing the request.
    pub write_timeout: Duration,
    /// Timeout for each read.
    pub read_timeout: Duration,
    /// Bound on the whole reply; `None` waits as long as reads keep arriving.
    pub reply_timeout: Option<Duration>,
    /// Bytes requested per read.
    pub chunk_size: usize,
    /// Largest reply accepted before giving up.
    pub max_reply_size: usize,
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            connect_timeout: DEFAULT_IO_TIMEOUT,
            write_timeout: DEFAULT_IO_TIMEOUT,
            read_timeout: DEFAULT_IO_TIMEOUT,
            reply_timeout: Some(DEFAULT_REPLY_TIMEOUT),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_reply_size: MAX_REPLY_SIZE,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_reply_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.reply_timeout = timeout;
        self
    }

    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(MIN_CHUNK_SIZE, MAX_CHUNK_SIZE);
        self
    }

    pub fn with_max_reply_size(mut self, size: usize) -> Self {
        self.max_reply_size = size;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Endpoint::default())
    }
}

/// Opens one channel per request.
pub trait Connector: Send + Sync {
    type Channel: Channel;

    fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Channel, ClientError>> + Send;
}

/// A connected byte stream scoped to a single request/reply exchange.
///
/// Dropping the channel releases the underlying socket.
pub trait Channel: Send {
    /// Writes the whole buffer.
    fn send(
        &mut self,
        data: &[u8],
        timeout: Duration,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Reads the next chunk, with line terminators removed.
    fn receive(&mut self, timeout: Duration)
        -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

/// Connects over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    chunk_size: usize,
}

impl TcpConnector {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl Connector for TcpConnector {
    type Channel = TcpChannel;

    async fn connect(&self, endpoint: &Endpoint, timeout: Duration) -> Result<TcpChannel, ClientError> {
        tracing::debug!("Connecting to {}...", endpoint);

        let stream = tokio::time::timeout(
            timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|_| {
            tracing::debug!("Connection to {} timed out", endpoint);
            ClientError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: ConnectFailure::TimedOut(timeout),
            }
        })?
        .map_err(|e| {
            tracing::debug!("Connection to {} failed: {}", endpoint, e);
            ClientError::Unreachable {
                endpoint: endpoint.to_string(),
                reason: ConnectFailure::Refused(e),
            }
        })?;

        stream.set_nodelay(true).ok();
        tracing::debug!("TCP connected to {}", endpoint);

        Ok(TcpChannel {
            stream,
            buf: vec![0u8; self.chunk_size],
            peer: endpoint.to_string(),
        })
    }
}

/// One TCP connection.
pub struct TcpChannel {
    stream: TcpStream,
    buf: Vec<u8>,
    peer: String,
}

impl Channel for TcpChannel {
    async fn send(&mut self, data: &[u8], timeout: Duration) -> Result<(), ClientError> {
        tokio::time::timeout(timeout, async {
            self.stream.write_all(data).await?;
            self.stream.flush().await?;
            Ok::<_, std::io::Error>(())
        })
        .await
        .map_err(|_| {
            tracing::debug!("Write to {} timed out", self.peer);
            ClientError::ConnectionTimeout {
                op: TransportOp::Send,
                timeout,
            }
        })??;

        tracing::debug!("Sent {} bytes to {}", data.len(), self.peer);
        Ok(())
    }

    async fn receive(&mut self, timeout: Duration) -> Result<Vec<u8>, ClientError> {
        let n = tokio::time::timeout(timeout, self.stream.read(&mut self.buf))
            .await
            .map_err(|_| {
                tracing::debug!("Read from {} timed out", self.peer);
                ClientError::ConnectionTimeout {
                    op: TransportOp::Receive,
                    timeout,
                }
            })??;

        tracing::debug!("Read {} bytes from {}", n, self.peer);

        if n == 0 {
            return Err(ClientError::ConnectionClosed);
        }

        Ok(strip_line_terminators(&self.buf[..n]))
    }
}

impl Drop for TcpChannel {
    fn drop(&mut self) {
        tracing::trace!("Releasing connection to {}", self.peer);
    }
}

/// Removes CR and LF bytes, which never appear unescaped inside JSON strings.
pub fn strip_line_terminators(data: &[u8]) -> Vec<u8> {
    data.iter()
        .copied()
        .filter(|&b| b != b'\r' && b != b'\n')
        .collect()
}
