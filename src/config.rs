//! CLI configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BLOOCOIN_CONFIG or --config)
//! 3. Environment variables
//! 4. Command-line flags (applied by the caller)

use bloocoin_client::connection::{DEFAULT_CHUNK_SIZE, DEFAULT_IO_TIMEOUT, DEFAULT_REPLY_TIMEOUT};
use bloocoin_client::{ClientConfig, Endpoint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Client-side settings for the `bloo` binary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server as `host:port`.
    pub server: String,
    pub connect_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Bound on a whole reply; 0 disables it.
    pub reply_timeout_ms: u64,
    pub chunk_size: usize,
    /// Directory holding the bloostamp file (defaults to `~/.bloocoin`).
    pub stamp_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: Endpoint::default().to_string(),
            connect_timeout_ms: DEFAULT_IO_TIMEOUT.as_millis() as u64,
            write_timeout_ms: DEFAULT_IO_TIMEOUT.as_millis() as u64,
            read_timeout_ms: DEFAULT_IO_TIMEOUT.as_millis() as u64,
            reply_timeout_ms: DEFAULT_REPLY_TIMEOUT.as_millis() as u64,
            chunk_size: DEFAULT_CHUNK_SIZE,
            stamp_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from `path` (or BLOOCOIN_CONFIG), then applies
    /// environment variable overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os("BLOOCOIN_CONFIG").map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies overrides looked up by variable name. Unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(server) = lookup("BLOOCOIN_SERVER") {
            self.server = server;
        }

        let millis = |key: &str| lookup(key).and_then(|v| v.parse::<u64>().ok());
        if let Some(ms) = millis("BLOOCOIN_CONNECT_TIMEOUT_MS") {
            self.connect_timeout_ms = ms;
        }
        if let Some(ms) = millis("BLOOCOIN_WRITE_TIMEOUT_MS") {
            self.write_timeout_ms = ms;
        }
        if let Some(ms) = millis("BLOOCOIN_READ_TIMEOUT_MS") {
            self.read_timeout_ms = ms;
        }
        if let Some(ms) = millis("BLOOCOIN_REPLY_TIMEOUT_MS") {
            self.reply_timeout_ms = ms;
        }

        if let Some(dir) = lookup("BLOOCOIN_STAMP_DIR") {
            self.stamp_dir = Some(PathBuf::from(dir));
        }
    }

    /// Builds the client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let endpoint: Endpoint = self
            .server
            .parse()
            .map_err(|_| ConfigError::InvalidServer(self.server.clone()))?;

        let reply_timeout = match self.reply_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        Ok(ClientConfig::new(endpoint)
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms))
            .with_write_timeout(Duration::from_millis(self.write_timeout_ms))
            .with_read_timeout(Duration::from_millis(self.read_timeout_ms))
            .with_reply_timeout(reply_timeout)
            .with_chunk_size(self.chunk_size))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    IoError(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("invalid server address {0:?}: expected host:port")]
    InvalidServer(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server, "server.bloocoin.org:3122");
        assert_eq!(config.connect_timeout_ms, 1000);

        let client = config.client_config().unwrap();
        assert_eq!(client.endpoint, Endpoint::default());
        assert_eq!(client.read_timeout, Duration::from_secs(1));
        assert_eq!(client.reply_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bloo.yaml");
        std::fs::write(
            &path,
            "server: 127.0.0.1:4000\nread_timeout_ms: 250\nreply_timeout_ms: 0\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server, "127.0.0.1:4000");
        assert_eq!(config.read_timeout_ms, 250);
        // Unset fields keep their defaults.
        assert_eq!(config.write_timeout_ms, 1000);

        let client = config.client_config().unwrap();
        assert_eq!(client.endpoint, Endpoint::new("127.0.0.1", 4000));
        assert_eq!(client.reply_timeout, None);
    }

    #[test]
    fn test_bad_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bloo.yaml");
        std::fs::write(&path, "read_timeout_ms: [oops").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(..))
        ));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BLOOCOIN_SERVER", "localhost:9000"),
            ("BLOOCOIN_CONNECT_TIMEOUT_MS", "5000"),
            ("BLOOCOIN_READ_TIMEOUT_MS", "not-a-number"),
            ("BLOOCOIN_STAMP_DIR", "/tmp/stamps"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.server, "localhost:9000");
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.read_timeout_ms, 1000);
        assert_eq!(config.stamp_dir, Some(PathBuf::from("/tmp/stamps")));
    }

    #[test]
    fn test_invalid_server() {
        let config = Config {
            server: "nope:port".into(),
            ..Config::default()
        };
        assert!(matches!(
            config.client_config(),
            Err(ConfigError::InvalidServer(_))
        ));
    }
}
