//! Trusted primitives: the random source and the v3/v5 name hashes.

use std::fmt;

use md5::Md5;
use rand::RngCore;
use sha1::{Digest, Sha1};
use uuid::Uuid;

/// Failure reported by a primitive (random source or hash), carrying the
/// primitive's own code and message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{primitive} failed with code {code}: {message}")]
pub struct PrimitiveError {
    pub primitive: &'static str,
    pub code: u32,
    pub message: String,
}

/// Source of random bytes for v4 values, clock sequences and node ids.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` completely or report why it could not be filled.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError`] when the underlying source is unavailable.
    fn fill(&self, dest: &mut [u8]) -> Result<(), PrimitiveError>;

    fn name(&self) -> &'static str;
}

/// Operating-system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), PrimitiveError> {
        let mut rng = rand::rngs::OsRng;
        rng.try_fill_bytes(dest).map_err(|err| PrimitiveError {
            primitive: self.name(),
            code: err.code().map_or(0, std::num::NonZeroU32::get),
            message: err.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "os-random"
    }
}

/// Thread-local wyrand generator. Never fails; not suitable where identifiers
/// must be unguessable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FastRandom;

impl RandomSource for FastRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), PrimitiveError> {
        fastrand::fill(dest);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fast-random"
    }
}

/// Hash used to derive name-based values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameHash {
    Md5,
    Sha1,
}

impl NameHash {
    /// Digest `namespace || name` and keep the first 128 bits.
    #[must_use]
    pub fn digest(self, namespace: &Uuid, name: &[u8]) -> [u8; 16] {
        let mut out = [0u8; 16];
        match self {
            NameHash::Md5 => {
                let mut hasher = Md5::new();
                hasher.update(namespace.as_bytes());
                hasher.update(name);
                out.copy_from_slice(&hasher.finalize()[..16]);
            }
            NameHash::Sha1 => {
                let mut hasher = Sha1::new();
                hasher.update(namespace.as_bytes());
                hasher.update(name);
                out.copy_from_slice(&hasher.finalize()[..16]);
            }
        }
        out
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameHash::Md5 => write!(f, "md5"),
            NameHash::Sha1 => write!(f, "sha1"),
        }
    }
}
