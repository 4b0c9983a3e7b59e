//! Bindwarden configuration.

use crate::policy::activation::ActivationPolicy;
use std::time::Duration;

/// Default human-readable key prefix.
pub const DEFAULT_KEY_PREFIX: &str = "CLU-";

/// Minimum random bytes per key (128 bits).
pub const MIN_KEY_ENTROPY_BYTES: usize = 16;

/// Longest accepted tier lifetime (100 years).
pub const MAX_TIER_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Configuration for a [`LicenseRegistry`](crate::LicenseRegistry).
///
/// Holds no secrets. Credentials for collaborators of the request layer
/// (answer-generation service keys and the like) are supplied to that layer
/// directly and never pass through here.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Fixed prefix of every issued key (e.g. "CLU-").
    pub key_prefix: String,

    /// Random bytes drawn per key. Rendered as two uppercase hex chars each.
    pub key_entropy_bytes: usize,

    /// Key generations attempted before a collision becomes an internal fault.
    pub max_key_attempts: u32,

    /// Whether an expired, never-bound license may still be activated.
    pub activation_policy: ActivationPolicy,

    /// Lifetime of a basic license, counted from issuance.
    pub basic_lifetime: Duration,

    /// Lifetime of a standard license, counted from issuance.
    pub standard_lifetime: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            key_entropy_bytes: MIN_KEY_ENTROPY_BYTES,
            max_key_attempts: 8,
            activation_policy: ActivationPolicy::default(),
            basic_lifetime: Duration::from_secs(24 * 60 * 60),
            standard_lifetime: Duration::from_secs(7 * 24 * 60 * 60),
        }
    }
}

impl RegistryConfig {
    /// Validate configuration for obvious errors.
    pub fn validate(&self) -> Result<(), crate::BindwardenError> {
        if self.key_prefix.is_empty() {
            return Err(crate::BindwardenError::ConfigError(
                "key_prefix cannot be empty".to_string(),
            ));
        }
        if !self
            .key_prefix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(crate::BindwardenError::ConfigError(format!(
                "key_prefix must be uppercase alphanumeric or '-', got {:?}",
                self.key_prefix
            )));
        }
        if self.key_entropy_bytes < MIN_KEY_ENTROPY_BYTES {
            return Err(crate::BindwardenError::ConfigError(format!(
                "key_entropy_bytes must be at least {}, got {}",
                MIN_KEY_ENTROPY_BYTES, self.key_entropy_bytes
            )));
        }
        if self.max_key_attempts == 0 {
            return Err(crate::BindwardenError::ConfigError(
                "max_key_attempts must be at least 1".to_string(),
            ));
        }
        if self.basic_lifetime.is_zero() || self.standard_lifetime.is_zero() {
            return Err(crate::BindwardenError::ConfigError(
                "tier lifetimes must be non-zero".to_string(),
            ));
        }
        // Lifetimes feed chrono arithmetic on every issue.
        if self.basic_lifetime > MAX_TIER_LIFETIME || self.standard_lifetime > MAX_TIER_LIFETIME {
            return Err(crate::BindwardenError::ConfigError(format!(
                "tier lifetimes must not exceed {} days",
                MAX_TIER_LIFETIME.as_secs() / 86_400
            )));
        }
        Ok(())
    }
}
