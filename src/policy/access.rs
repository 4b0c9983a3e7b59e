//! Solve-access gating.
//!
//! The request layer calls this before forwarding a question to the
//! answer-generation service. Access requires:
//! - A bound device (license activated)
//! - The caller's device matching the bound device
//! - The license not being expired

use crate::keygen::tier::Tier;
use crate::protocol::models::License;
use crate::BindwardenError;
use chrono::{DateTime, Utc};

/// Proof that a device may use the gated capability right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    /// Tier of the license.
    pub tier: Tier,
    /// When access lapses (`None` = never).
    pub expires_at: Option<DateTime<Utc>>,
}

/// Check that `device_id` may use the license at `now`.
///
/// # Returns
/// * `Ok(AccessGrant)` - Access granted
/// * `Err(NotActivated)` - License was never bound
/// * `Err(DeviceMismatch)` - Bound to another device
/// * `Err(LicenseExpired)` - Past expiry
pub fn check_access(
    license: &License,
    device_id: &str,
    now: DateTime<Utc>,
) -> Result<AccessGrant, BindwardenError> {
    // 1. Must be bound
    let Some(bound) = license.bound_device.as_deref() else {
        return Err(BindwardenError::NotActivated);
    };

    // 2. Must be this device
    if bound != device_id {
        return Err(BindwardenError::DeviceMismatch);
    }

    // 3. Must not be expired
    if license.is_expired_at(now) {
        return Err(BindwardenError::LicenseExpired);
    }

    Ok(AccessGrant {
        tier: license.tier,
        expires_at: license.expires_at,
    })
}
