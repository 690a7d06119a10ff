//! High-level client API.

use crate::connection::{Channel, ClientConfig, Connector, Endpoint, TcpConnector};
use crate::error::{ClientError, TransportOp};
use bloocoin_protocol::message::{AddressBalance, Transaction};
use bloocoin_protocol::{describe, CommandRequest, Credentials, Encoder, ProtocolError};
use bloocoin_protocol::{ReplyAssembler, ReplyEnvelope};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Client for a Bloocoin server.
///
/// Holds no connection between calls: every [`Client::execute`] opens its own
/// channel and drops it before returning.
pub struct Client<C = TcpConnector> {
    config: ClientConfig,
    connector: C,
    credentials: Option<Credentials>,
}

impl Client<TcpConnector> {
    /// Creates a new client with the given configuration.
    pub fn new(config: ClientConfig) -> Self {
        let connector = TcpConnector::new(config.chunk_size);
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> Client<C> {
    /// Creates a client that opens channels through `connector`.
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        Self {
            config,
            connector,
            credentials: None,
        }
    }

    /// Sets the credentials used when a call does not supply its own.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn clear_credentials(&mut self) {
        self.credentials = None;
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.config.endpoint
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends one command and waits for its reply.
    ///
    /// `args` is a JSON object (or null) holding the command's non-credential
    /// arguments. The command and arguments are checked before any socket is
    /// opened.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
        credentials: Option<&Credentials>,
    ) -> Result<ReplyEnvelope<T>, ClientError> {
        let descriptor = describe(command)?;
        let request =
            CommandRequest::build(descriptor, &args, credentials, self.credentials.as_ref())?;
        let encoded = Encoder::encode_request(&request)?;

        let mut channel = self
            .connector
            .connect(&self.config.endpoint, self.config.connect_timeout)
            .await?;

        tracing::debug!(
            "Sending {} ({} bytes) to {}",
            command,
            encoded.len(),
            self.config.endpoint
        );
        channel.send(&encoded, self.config.write_timeout).await?;

        let reply = self.read_reply(&mut channel);
        let envelope = match self.config.reply_timeout {
            Some(limit) => tokio::time::timeout(limit, reply).await.map_err(|_| {
                tracing::debug!("{} reply timed out", command);
                ClientError::ConnectionTimeout {
                    op: TransportOp::Reply,
                    timeout: limit,
                }
            })??,
            None => reply.await?,
        };

        tracing::debug!("{} reply received: success={}", command, envelope.success);
        Ok(envelope)
    }

    /// Reads chunks until they decode into one envelope.
    async fn read_reply<T: DeserializeOwned>(
        &self,
        channel: &mut C::Channel,
    ) -> Result<ReplyEnvelope<T>, ClientError> {
        let mut assembler = ReplyAssembler::with_max_size(self.config.max_reply_size);

        loop {
            let chunk = channel.receive(self.config.read_timeout).await?;
            if let Some(envelope) = assembler.push(&chunk)? {
                return Ok(envelope);
            }
            tracing::debug!(
                "No complete reply yet ({} bytes buffered), continuing to read...",
                assembler.buffered()
            );
        }
    }

    /// Sends a command and fails unless the server reports success.
    async fn request(
        &self,
        command: &str,
        args: Value,
        credentials: Option<&Credentials>,
    ) -> Result<ReplyEnvelope<Value>, ClientError> {
        let envelope = self.execute(command, args, credentials).await?;
        if !envelope.success {
            return Err(ClientError::Rejected {
                message: envelope.message,
            });
        }
        Ok(envelope)
    }

    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Returns whether a connection to the server can be opened.
    pub async fn is_online(&self) -> bool {
        match self
            .connector
            .connect(&self.config.endpoint, self.config.connect_timeout)
            .await
        {
            Ok(_channel) => true,
            Err(e) => {
                tracing::debug!("{} is offline: {}", self.config.endpoint, e);
                false
            }
        }
    }

    // =========================================================================
    // Account operations
    // =========================================================================

    /// Registers a new address. Returns whether the server accepted it.
    pub async fn register(&self, addr: &str, pwd: &str) -> Result<bool, ClientError> {
        let credentials = Credentials::new(addr, pwd);
        let envelope: ReplyEnvelope<Value> =
            self.execute("register", json!({}), Some(&credentials)).await?;
        Ok(envelope.success)
    }

    /// Gets the balance of the configured address.
    pub async fn my_coins(&self) -> Result<i64, ClientError> {
        let envelope = self.request("my_coins", json!({}), None).await?;
        payload_field(envelope, "amount")
    }

    /// Sends coins from the configured address.
    pub async fn send_coin(&self, to: &str, amount: i64) -> Result<Transaction, ClientError> {
        let params = json!({
            "to": to,
            "amount": amount,
        });

        let envelope = self.request("send_coin", params, None).await?;
        Ok(serde_json::from_value(Value::Object(
            envelope.into_payload().into_iter().collect(),
        ))?)
    }

    /// Lists the transactions of the configured address.
    pub async fn transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let mut envelope = self.request("transactions", json!({}), None).await?;
        match envelope.payload.remove("transactions") {
            Some(list) => Ok(serde_json::from_value(list)?),
            None => Ok(Vec::new()),
        }
    }

    // =========================================================================
    // Ledger queries
    // =========================================================================

    /// Gets the current mining difficulty.
    pub async fn difficulty(&self) -> Result<u32, ClientError> {
        let envelope = self.request("get_coin", json!({}), None).await?;
        payload_field(envelope, "difficulty")
    }

    /// Submits a mined string and its hash for the configured address.
    /// Returns the hash the server recorded.
    pub async fn check(
        &self,
        winning_string: &str,
        winning_hash: &str,
    ) -> Result<String, ClientError> {
        let params = json!({
            "winning_string": winning_string,
            "winning_hash": winning_hash,
        });

        let envelope = self.request("check", params, None).await?;
        payload_field(envelope, "hash")
    }

    /// Gets the number of coins in circulation.
    pub async fn total_coins(&self) -> Result<i64, ClientError> {
        let envelope = self.request("total_coins", json!({}), None).await?;
        payload_field(envelope, "amount")
    }

    /// Gets the balance of any address.
    pub async fn check_addr(&self, addr: &str) -> Result<AddressBalance, ClientError> {
        let envelope = self
            .request("check_addr", json!({ "addr": addr }), None)
            .await?;
        let amount = payload_field(envelope.clone(), "amount")?;
        let addr = match envelope.get("addr").and_then(Value::as_str) {
            Some(a) => a.to_string(),
            None => addr.to_string(),
        };
        Ok(AddressBalance { addr, amount })
    }
}

fn payload_field<T: DeserializeOwned>(
    mut envelope: ReplyEnvelope<Value>,
    key: &str,
) -> Result<T, ClientError> {
    let value = envelope.payload.remove(key).ok_or_else(|| {
        ProtocolError::MalformedReply(format!("reply payload has no {:?}", key))
    })?;
    Ok(serde_json::from_value(value)?)
}
