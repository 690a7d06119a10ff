//! Bloostamp credentials and their on-disk store.
//!
//! A bloostamp is an `addr:pwd` pair kept in a single file named `bloostamp`
//! under the user's `~/.bloocoin` directory.

use crate::hash::HashedString;
use bloocoin_protocol::Credentials;
use rand::Rng;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// File name of the stored stamp.
pub const STAMP_FILE: &str = "bloostamp";

/// Directory name under the home directory.
pub const STAMP_DIR: &str = ".bloocoin";

/// Length of generated addresses and passwords, in hex characters.
const STAMP_PART_LEN: usize = 40;

/// Errors reading or writing stamps.
#[derive(Debug, Error)]
pub enum StampError {
    #[error("malformed bloostamp: expected addr:pwd")]
    Malformed,

    #[error("no home directory to keep the bloostamp in")]
    NoHomeDir,

    #[error("failed to access {0}: {1}")]
    Io(PathBuf, std::io::Error),
}

/// An address and password pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Bloostamp {
    pub addr: String,
    pub pwd: String,
}

impl Bloostamp {
    pub fn new(addr: impl Into<String>, pwd: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            pwd: pwd.into(),
        }
    }

    /// Generates a fresh stamp from two independent random hashes.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let addr = stamp_part(rng);
        let pwd = stamp_part(rng);
        Self { addr, pwd }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(&self.addr, &self.pwd)
    }
}

fn stamp_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut hash = HashedString::sha256(rng).hash;
    hash.truncate(STAMP_PART_LEN);
    hash
}

impl fmt::Display for Bloostamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.addr, self.pwd)
    }
}

impl fmt::Debug for Bloostamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bloostamp")
            .field("addr", &self.addr)
            .field("pwd", &"<redacted>")
            .finish()
    }
}

impl FromStr for Bloostamp {
    type Err = StampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, pwd) = s.trim().split_once(':').ok_or(StampError::Malformed)?;
        if addr.is_empty() || pwd.is_empty() {
            return Err(StampError::Malformed);
        }
        Ok(Self::new(addr, pwd))
    }
}

impl From<Bloostamp> for Credentials {
    fn from(stamp: Bloostamp) -> Self {
        Credentials::new(stamp.addr, stamp.pwd)
    }
}

/// Reads and writes the stamp file in one directory.
#[derive(Debug, Clone)]
pub struct StampStore {
    dir: PathBuf,
}

impl StampStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at `~/.bloocoin`.
    pub fn default_location() -> Result<Self, StampError> {
        let home = home::home_dir().ok_or(StampError::NoHomeDir)?;
        Ok(Self::new(home.join(STAMP_DIR)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STAMP_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    pub fn read(&self) -> Result<Bloostamp, StampError> {
        let path = self.path();
        let content = std::fs::read_to_string(&path).map_err(|e| StampError::Io(path, e))?;
        content.parse()
    }

    /// Writes `stamp`, creating the directory if needed.
    pub fn write(&self, stamp: &Bloostamp) -> Result<(), StampError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| StampError::Io(self.dir.clone(), e))?;
        let path = self.path();
        std::fs::write(&path, stamp.to_string()).map_err(|e| StampError::Io(path.clone(), e))?;
        tracing::debug!("Wrote bloostamp to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_parse_and_display() {
        let stamp: Bloostamp = "ADDR:PWD\n".parse().unwrap();
        assert_eq!(stamp, Bloostamp::new("ADDR", "PWD"));
        assert_eq!(stamp.to_string(), "ADDR:PWD");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            "nocolon".parse::<Bloostamp>(),
            Err(StampError::Malformed)
        ));
        assert!(":pwd".parse::<Bloostamp>().is_err());
        assert!("addr:".parse::<Bloostamp>().is_err());
    }

    #[test]
    fn test_generate() {
        let mut rng = StdRng::seed_from_u64(9);
        let stamp = Bloostamp::generate(&mut rng);
        assert_eq!(stamp.addr.len(), STAMP_PART_LEN);
        assert_eq!(stamp.pwd.len(), STAMP_PART_LEN);
        assert_ne!(stamp.addr, stamp.pwd);
        assert!(stamp.addr.chars().all(|c| c.is_ascii_hexdigit()));

        let again = Bloostamp::generate(&mut StdRng::seed_from_u64(9));
        assert_eq!(stamp, again);
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = StampStore::new(dir.path().join("nested"));
        assert!(!store.exists());
        assert!(matches!(store.read(), Err(StampError::Io(..))));

        let stamp = Bloostamp::new("A1", "P1");
        store.write(&stamp).unwrap();
        assert!(store.exists());
        assert_eq!(store.read().unwrap(), stamp);

        let creds: Credentials = store.read().unwrap().into();
        assert_eq!(creds, Credentials::new("A1", "P1"));
    }
}
