//! Device-binding decision for an activation attempt.

use crate::protocol::models::License;
use crate::BindwardenError;
use chrono::{DateTime, Utc};

/// How activation treats a license that expired before it was bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPolicy {
    /// Bind anyway. Status checks will still report `Expired`.
    #[default]
    GraceActivation,
    /// Refuse to bind an expired license with `ActivationExpired`.
    RejectExpired,
}

/// What an activation attempt should do to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindDecision {
    /// Unbound: bind the device and stamp the activation time.
    Bind,
    /// Already bound to this device: succeed without change.
    AlreadyBound,
}

/// Decide an activation attempt against the current record.
///
/// Must be evaluated while holding the registry write lock so the decision
/// and the bind are one step.
///
/// # Errors
/// * `DeviceConflict` - Bound to a different device
/// * `ActivationExpired` - Unbound, expired, and policy is `RejectExpired`
pub fn decide(
    license: &License,
    device_id: &str,
    policy: ActivationPolicy,
    now: DateTime<Utc>,
) -> Result<BindDecision, BindwardenError> {
    match license.bound_device.as_deref() {
        Some(bound) if bound == device_id => Ok(BindDecision::AlreadyBound),
        Some(_) => Err(BindwardenError::DeviceConflict),
        None => {
            if policy == ActivationPolicy::RejectExpired && license.is_expired_at(now) {
                return Err(BindwardenError::ActivationExpired);
            }
            Ok(BindDecision::Bind)
        }
    }
}
