//! Unguessable license key generation.
//!
//! Keys look like `CLU-3F9A0C1B-77D2E4A0-9B1C55E2-0A4F6D13`: a fixed prefix
//! followed by OS entropy rendered as uppercase hex in groups of eight.

use crate::BindwardenError;
use rand::rngs::OsRng;
use rand::RngCore;

/// Hex characters per displayed group.
const GROUP_WIDTH: usize = 8;

/// Source of random bytes for key suffixes.
pub trait EntropySource: Send + Sync {
    /// Fill `buf` entirely with random bytes.
    fn fill(&self, buf: &mut [u8]) -> Result<(), BindwardenError>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), BindwardenError> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| BindwardenError::InternalFault(format!("Entropy source failed: {}", e)))
    }
}

/// Scripted entropy for deterministic collision and failure tests.
///
/// Each call consumes one step: `Some(b)` fills the buffer with `b`,
/// `None` fails. An exhausted script fails too.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug)]
pub struct ScriptedEntropy {
    steps: std::sync::Mutex<std::collections::VecDeque<Option<u8>>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl ScriptedEntropy {
    /// Create a source that replays `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = Option<u8>>) -> Self {
        Self {
            steps: std::sync::Mutex::new(steps.into_iter().collect()),
        }
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl EntropySource for ScriptedEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<(), BindwardenError> {
        let step = self
            .steps
            .lock()
            .map_err(|_| BindwardenError::InternalFault("Scripted entropy poisoned".to_string()))?
            .pop_front()
            .flatten();
        match step {
            Some(byte) => {
                buf.fill(byte);
                Ok(())
            }
            None => Err(BindwardenError::InternalFault(
                "Scripted entropy failure".to_string(),
            )),
        }
    }
}

/// Generate a new license key.
///
/// # Arguments
/// * `prefix` - Fixed human-readable prefix (e.g. "CLU-")
/// * `entropy_bytes` - Random bytes in the suffix
/// * `source` - Where the random bytes come from
///
/// # Errors
/// * `InternalFault` - The entropy source failed
pub fn new_key(
    prefix: &str,
    entropy_bytes: usize,
    source: &dyn EntropySource,
) -> Result<String, BindwardenError> {
    let mut raw = vec![0u8; entropy_bytes];
    source.fill(&mut raw)?;

    let hex = hex::encode_upper(&raw);
    let groups: Vec<&str> = hex
        .as_bytes()
        .chunks(GROUP_WIDTH)
        // hex output is ASCII, chunk boundaries are char boundaries
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect();

    Ok(format!("{}{}", prefix, groups.join("-")))
}

/// Cheap shape check that rejects garbage before a registry lookup.
///
/// Accepts `prefix` followed by dash-separated groups of uppercase hex
/// carrying at least 128 bits.
pub fn is_well_formed_key(prefix: &str, key: &str) -> bool {
    let Some(suffix) = key.strip_prefix(prefix) else {
        return false;
    };

    let mut hex_chars = 0usize;
    for group in suffix.split('-') {
        if group.is_empty() || group.len() > GROUP_WIDTH {
            return false;
        }
        if !group
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
        {
            return false;
        }
        hex_chars += group.len();
    }

    hex_chars % 2 == 0 && hex_chars >= 32
}

/// Short SHA-256 fingerprint of a key, safe to write to logs.
pub fn fingerprint(key: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(key.as_bytes());
    hex::encode(&hash[..6])
}
