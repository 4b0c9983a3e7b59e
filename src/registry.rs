//! License Registry - the single owner of all license records.
//!
//! The `LicenseRegistry` is the only mutation path for licenses:
//! - Issuing new licenses with unique, unguessable keys
//! - Binding a license to exactly one device
//! - Read-only status and access checks for the request layer

use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::keygen::key::{fingerprint, is_well_formed_key, new_key, EntropySource, OsEntropy};
use crate::keygen::tier::{tier_for_amount, TierSchedule};
use crate::policy::access::{check_access, AccessGrant};
use crate::policy::activation::{decide, BindDecision};
use crate::protocol::models::{ActivationReceipt, IssueReceipt, License, LicenseStatus};
use crate::BindwardenError;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info, warn};

type LicenseMap = HashMap<String, License>;

/// In-memory license registry.
///
/// Create one instance per process and share it (e.g. behind an `Arc`)
/// between request handlers. All state is lost when the process exits.
pub struct LicenseRegistry {
    config: RegistryConfig,
    schedule: TierSchedule,
    clock: Arc<dyn Clock>,
    entropy: Arc<dyn EntropySource>,
    licenses: RwLock<LicenseMap>,
}

impl LicenseRegistry {
    /// Create a new registry with the given configuration.
    ///
    /// Uses the system clock and OS entropy.
    ///
    /// # Errors
    /// Returns `ConfigError` if configuration validation fails.
    pub fn new(config: RegistryConfig) -> Result<Self, BindwardenError> {
        Self::with_seams(config, Arc::new(SystemClock), Arc::new(OsEntropy))
    }

    /// Create a registry with a custom clock and entropy source (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub fn new_with_seams(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, BindwardenError> {
        Self::with_seams(config, clock, entropy)
    }

    fn with_seams(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        entropy: Arc<dyn EntropySource>,
    ) -> Result<Self, BindwardenError> {
        config.validate()?;
        let schedule = TierSchedule::from_std(config.basic_lifetime, config.standard_lifetime)?;

        Ok(Self {
            config,
            schedule,
            clock,
            entropy,
            licenses: RwLock::new(HashMap::new()),
        })
    }

    /// Issue a new license for a purchase.
    ///
    /// Key generation happens outside the lock; only the uniqueness check
    /// and insert run under it. A colliding key is regenerated, never
    /// overwritten.
    ///
    /// # Errors
    /// - `InvalidRequest` - Empty contact or non-positive amount
    /// - `InternalFault` - Entropy failure, collisions beyond `max_key_attempts`,
    ///   or an expiry past the representable date range
    pub fn issue(&self, owner_contact: &str, amount: i64) -> Result<IssueReceipt, BindwardenError> {
        if owner_contact.trim().is_empty() {
            return Err(BindwardenError::InvalidRequest(
                "owner contact is required".to_string(),
            ));
        }
        let tier = tier_for_amount(amount)?;

        let now = self.clock.now_utc();
        let expires_at = self.schedule.expires_at(tier, now).map_err(|e| {
            error!(error = %e, %tier, "license expiry out of range");
            e
        })?;

        for attempt in 1..=self.config.max_key_attempts {
            let key = new_key(
                &self.config.key_prefix,
                self.config.key_entropy_bytes,
                self.entropy.as_ref(),
            )
            .map_err(|e| {
                error!(error = %e, "license key generation failed");
                e
            })?;

            let mut licenses = self.write_licenses()?;
            if licenses.contains_key(&key) {
                drop(licenses);
                warn!(attempt, key = %fingerprint(&key), "license key collision, regenerating");
                continue;
            }

            let license = License::issued(
                key.clone(),
                tier,
                owner_contact.to_string(),
                now,
                expires_at,
            );
            licenses.insert(key.clone(), license);
            drop(licenses);

            info!(key = %fingerprint(&key), %tier, "license issued");
            return Ok(IssueReceipt { key, tier });
        }

        error!(
            attempts = self.config.max_key_attempts,
            "license key collisions exhausted retry budget"
        );
        Err(BindwardenError::InternalFault(format!(
            "Key collision persisted after {} attempts",
            self.config.max_key_attempts
        )))
    }

    /// Activate a license on a device.
    ///
    /// Binds the device on first activation. Repeating the call from the
    /// bound device succeeds without changing anything. The binding check
    /// runs under the write lock, so concurrent first activations serialize
    /// and exactly one device wins.
    ///
    /// # Errors
    /// - `InvalidRequest` - Empty key or device
    /// - `UnknownKey` - No such license
    /// - `DeviceConflict` - Bound to another device
    /// - `ActivationExpired` - Expired before binding under `RejectExpired`
    pub fn activate(
        &self,
        key: &str,
        device_id: &str,
    ) -> Result<ActivationReceipt, BindwardenError> {
        require_present("license key", key)?;
        require_present("device id", device_id)?;

        if !is_well_formed_key(&self.config.key_prefix, key) {
            debug!(key = %fingerprint(key), "activation with malformed key");
            return Err(BindwardenError::UnknownKey);
        }

        let now = self.clock.now_utc();
        let outcome = {
            let mut licenses = self.write_licenses()?;
            let license = licenses.get_mut(key).ok_or(BindwardenError::UnknownKey)?;
            decide(license, device_id, self.config.activation_policy, now).map(|decision| {
                if decision == BindDecision::Bind {
                    license.bound_device = Some(device_id.to_string());
                    license.activated_at = Some(now);
                }
                // Bound records always carry activated_at.
                let activated_at = license.activated_at.unwrap_or(now);
                (decision, license.tier, license.expires_at, activated_at)
            })
        };

        // Guard dropped above; events are emitted only from here on.
        let (decision, tier, expires_at, activated_at) = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(key = %fingerprint(key), error = %e, "activation refused");
                return Err(e);
            }
        };

        let newly_bound = decision == BindDecision::Bind;
        if newly_bound {
            info!(key = %fingerprint(key), %tier, "license bound to device");
        } else {
            debug!(key = %fingerprint(key), "idempotent re-activation");
        }

        Ok(ActivationReceipt {
            tier,
            expires_at,
            activated_at,
            newly_bound,
        })
    }

    /// Status of a license at the current time.
    ///
    /// # Errors
    /// - `UnknownKey` - No such license
    pub fn status(&self, key: &str) -> Result<LicenseStatus, BindwardenError> {
        self.status_at(key, self.clock.now_utc())
    }

    /// Status of a license at an explicit time.
    ///
    /// # Errors
    /// - `UnknownKey` - No such license
    pub fn status_at(
        &self,
        key: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<LicenseStatus, BindwardenError> {
        let licenses = self.read_licenses()?;
        let license = licenses.get(key).ok_or(BindwardenError::UnknownKey)?;
        Ok(license.status_at(now))
    }

    /// Check whether `device_id` may use the gated capability now.
    ///
    /// Read-only: never binds a device.
    ///
    /// # Errors
    /// - `InvalidRequest` - Empty key or device
    /// - `UnknownKey` - No such license
    /// - `NotActivated` / `DeviceMismatch` / `LicenseExpired` - Access denied
    pub fn authorize(&self, key: &str, device_id: &str) -> Result<AccessGrant, BindwardenError> {
        require_present("license key", key)?;
        require_present("device id", device_id)?;

        let now = self.clock.now_utc();
        let licenses = self.read_licenses()?;
        let license = licenses.get(key).ok_or(BindwardenError::UnknownKey)?;
        check_access(license, device_id, now)
    }

    /// Snapshot of a single license.
    ///
    /// # Errors
    /// - `UnknownKey` - No such license
    pub fn get(&self, key: &str) -> Result<License, BindwardenError> {
        self.read_licenses()?
            .get(key)
            .cloned()
            .ok_or(BindwardenError::UnknownKey)
    }

    /// Snapshot of every license, oldest first.
    pub fn snapshot(&self) -> Result<Vec<License>, BindwardenError> {
        let mut all: Vec<License> = self.read_licenses()?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.key.cmp(&b.key)));
        Ok(all)
    }

    /// License snapshot and its status at the current time, from one read.
    ///
    /// # Errors
    /// - `UnknownKey` - No such license
    pub fn describe(&self, key: &str) -> Result<(License, LicenseStatus), BindwardenError> {
        let now = self.clock.now_utc();
        let licenses = self.read_licenses()?;
        let license = licenses.get(key).ok_or(BindwardenError::UnknownKey)?;
        Ok((license.clone(), license.status_at(now)))
    }

    /// Number of licenses ever issued.
    pub fn count(&self) -> Result<usize, BindwardenError> {
        Ok(self.read_licenses()?.len())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    fn read_licenses(&self) -> Result<RwLockReadGuard<'_, LicenseMap>, BindwardenError> {
        self.licenses.read().map_err(|_| {
            error!("license registry lock poisoned");
            BindwardenError::InternalFault("Registry lock poisoned".to_string())
        })
    }

    fn write_licenses(&self) -> Result<RwLockWriteGuard<'_, LicenseMap>, BindwardenError> {
        self.licenses.write().map_err(|_| {
            error!("license registry lock poisoned");
            BindwardenError::InternalFault("Registry lock poisoned".to_string())
        })
    }
}

fn require_present(what: &str, value: &str) -> Result<(), BindwardenError> {
    if value.trim().is_empty() {
        return Err(BindwardenError::InvalidRequest(format!("{} is required", what)));
    }
    Ok(())
}
