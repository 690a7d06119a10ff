//! Random strings and their digests.
//!
//! Every function takes the random source explicitly, so callers decide
//! between an OS-seeded generator and a fixed seed.

use rand::Rng;
use sha2::{Digest, Sha256, Sha512};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of the random input behind each [`HashedString`].
pub const RANDOM_INPUT_LEN: usize = 20;

/// Returns `len` characters drawn from `[a-zA-Z0-9]`.
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// A random string and the upper-case hex digest of its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedString {
    pub input: String,
    pub hash: String,
}

impl HashedString {
    /// Hashes `input` with SHA-512.
    pub fn sha512_of(input: impl Into<String>) -> Self {
        let input = input.into();
        let hash = hex::encode_upper(Sha512::digest(input.as_bytes()));
        Self { input, hash }
    }

    /// Hashes `input` with SHA-256.
    pub fn sha256_of(input: impl Into<String>) -> Self {
        let input = input.into();
        let hash = hex::encode_upper(Sha256::digest(input.as_bytes()));
        Self { input, hash }
    }

    /// SHA-512 of a fresh random string.
    pub fn sha512<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::sha512_of(random_string(rng, RANDOM_INPUT_LEN))
    }

    /// SHA-256 of a fresh random string.
    pub fn sha256<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::sha256_of(random_string(rng, RANDOM_INPUT_LEN))
    }
}
