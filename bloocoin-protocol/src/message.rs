//! JSON request and reply types.

use crate::catalog::{is_credential, CommandDescriptor, ARG_ADDR};
use crate::error::ProtocolError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// Key carrying the command name in every request.
pub const CMD_KEY: &str = "cmd";

/// Account address and password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub addr: String,
    pub pwd: String,
}

impl Credentials {
    pub fn new(addr: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            pwd: pwd.into(),
        }
    }

    fn field(&self, arg: &str) -> &str {
        if arg == ARG_ADDR {
            &self.addr
        } else {
            &self.pwd
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("addr", &self.addr)
            .field("pwd", &"<redacted>")
            .finish()
    }
}

/// A validated request: `cmd` plus exactly the arguments its descriptor names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CommandRequest {
    fields: Map<String, Value>,
}

impl CommandRequest {
    /// Builds a request for `descriptor` from caller arguments.
    ///
    /// `addr` and `pwd` resolve from `explicit` credentials first, then from a
    /// caller argument of the same name, then from `defaults`. Every other
    /// required argument must appear in `args`. Arguments the descriptor does
    /// not name are left out.
    pub fn build(
        descriptor: &'static CommandDescriptor,
        args: &Value,
        explicit: Option<&Credentials>,
        defaults: Option<&Credentials>,
    ) -> Result<Self, ProtocolError> {
        let empty = Map::new();
        let args = match args {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ProtocolError::ArgumentsNotObject),
        };

        let mut fields = Map::new();
        fields.insert(CMD_KEY.to_string(), Value::from(descriptor.name));

        for &arg in descriptor.args {
            let value = if is_credential(arg) {
                explicit
                    .map(|c| Value::from(c.field(arg)))
                    .or_else(|| args.get(arg).cloned())
                    .or_else(|| defaults.map(|c| Value::from(c.field(arg))))
                    .ok_or(ProtocolError::MissingCredentials {
                        command: descriptor.name,
                        argument: arg,
                    })?
            } else {
                args.get(arg)
                    .cloned()
                    .ok_or(ProtocolError::MissingArgument {
                        command: descriptor.name,
                        argument: arg,
                    })?
            };
            fields.insert(arg.to_string(), value);
        }

        for key in args.keys() {
            if !descriptor.requires(key) {
                tracing::debug!("dropping argument {:?} not used by {}", key, descriptor.name);
            }
        }

        Ok(Self { fields })
    }

    /// Returns the command name.
    pub fn command(&self) -> &str {
        self.fields
            .get(CMD_KEY)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Decoded server reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ReplyEnvelope<T> {
    pub success: bool,

    /// Human-readable status text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,

    /// Command-specific result data.
    #[serde(default, deserialize_with = "null_as_default")]
    pub payload: HashMap<String, T>,
}

fn null_as_default<'de, D, V>(deserializer: D) -> Result<V, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de> + Default,
{
    Ok(Option::<V>::deserialize(deserializer)?.unwrap_or_default())
}

impl<T> ReplyEnvelope<T> {
    pub fn get(&self, key: &str) -> Option<&T> {
        self.payload.get(key)
    }

    pub fn into_payload(self) -> HashMap<String, T> {
        self.payload
    }
}

/// Balance of one address, from `check_addr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressBalance {
    pub addr: String,
    pub amount: i64,
}

/// One ledger transfer, as listed by the `transactions` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub amount: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{commands, describe};
    use serde_json::json;

    fn creds() -> Credentials {
        Credentials::new("ADDR1", "secret")
    }

    #[test]
    fn test_every_command_builds_exact_keys() {
        let args = json!({
            "to": "DEST",
            "amount": 5,
            "winning_string": "abc",
            "winning_hash": "00ff",
        });

        for descriptor in commands() {
            let request = CommandRequest::build(descriptor, &args, Some(&creds()), None).unwrap();

            let mut expected: Vec<&str> = descriptor.args.to_vec();
            expected.push(CMD_KEY);
            expected.sort_unstable();
            let mut keys: Vec<&str> = request.keys().collect();
            keys.sort_unstable();

            assert_eq!(keys, expected, "command {}", descriptor.name);
            assert_eq!(request.command(), descriptor.name);

            if descriptor.requires(ARG_ADDR) {
                assert_eq!(request.get("addr"), Some(&json!("ADDR1")));
            }
            if descriptor.requires("pwd") {
                assert_eq!(request.get("pwd"), Some(&json!("secret")));
            }
        }
    }

    #[test]
    fn test_explicit_credentials_override_defaults() {
        let d = describe("my_coins").unwrap();
        let defaults = Credentials::new("DEFAULT", "dpwd");
        let explicit = Credentials::new("EXPLICIT", "epwd");

        let request =
            CommandRequest::build(d, &json!({}), Some(&explicit), Some(&defaults)).unwrap();
        assert_eq!(request.get("addr"), Some(&json!("EXPLICIT")));
        assert_eq!(request.get("pwd"), Some(&json!("epwd")));

        let request = CommandRequest::build(d, &json!({}), None, Some(&defaults)).unwrap();
        assert_eq!(request.get("addr"), Some(&json!("DEFAULT")));
    }

    #[test]
    fn test_addr_argument_beats_defaults() {
        let d = describe("check_addr").unwrap();
        let defaults = creds();

        let request =
            CommandRequest::build(d, &json!({"addr": "ABC123"}), None, Some(&defaults)).unwrap();
        assert_eq!(request.get("addr"), Some(&json!("ABC123")));
    }

    #[test]
    fn test_missing_argument() {
        let d = describe("send_coin").unwrap();
        let err = CommandRequest::build(d, &json!({"to": "X"}), Some(&creds()), None).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::MissingArgument {
                command: "send_coin",
                argument: "amount"
            }
        ));
    }

    #[test]
    fn test_missing_credentials() {
        let d = describe("my_coins").unwrap();
        let err = CommandRequest::build(d, &json!({}), None, None).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_extra_arguments_dropped() {
        let d = describe("total_coins").unwrap();
        let request = CommandRequest::build(d, &json!({"junk": 1}), None, None).unwrap();
        assert_eq!(request.len(), 1);
        assert!(request.get("junk").is_none());
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let d = describe("get_coin").unwrap();
        assert!(matches!(
            CommandRequest::build(d, &json!([1, 2]), None, None),
            Err(ProtocolError::ArgumentsNotObject)
        ));
        assert!(CommandRequest::build(d, &Value::Null, None, None).is_ok());
    }

    #[test]
    fn test_envelope_lenient_fields() {
        let env: ReplyEnvelope<Value> =
            serde_json::from_str(r#"{"success":false,"message":null,"payload":null}"#).unwrap();
        assert!(!env.success);
        assert!(env.message.is_empty());
        assert!(env.payload.is_empty());

        let env: ReplyEnvelope<i64> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(env.success);
        assert!(env.payload.is_empty());
    }

    #[test]
    fn test_envelope_requires_success() {
        let result: Result<ReplyEnvelope<Value>, _> =
            serde_json::from_str(r#"{"message":"hi","payload":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let text = format!("{:?}", creds());
        assert!(text.contains("ADDR1"));
        assert!(!text.contains("secret"));
    }

    #[test]
    fn test_transaction_decode() {
        let tx: Transaction =
            serde_json::from_value(json!({"to": "A", "from": "B", "amount": 3})).unwrap();
        assert_eq!(tx.amount, 3);
        assert_eq!(tx.from, "B");
    }
}
