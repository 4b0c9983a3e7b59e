//! License record and derived status.

use crate::keygen::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single issued license.
///
/// The registry owns every `License`. Values handed out by the registry
/// are snapshots; changing them does not change the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
    /// Unique key, immutable after creation.
    pub key: String,

    /// Tier fixed at issuance.
    pub tier: Tier,

    /// Purchaser contact (e.g. phone number). Record-keeping only.
    pub owner_contact: String,

    /// Device the license is bound to, once activated.
    pub bound_device: Option<String>,

    /// When the first successful activation happened.
    pub activated_at: Option<DateTime<Utc>>,

    /// Absolute expiry computed at issuance. `None` never expires.
    pub expires_at: Option<DateTime<Utc>>,

    /// When the license was issued.
    pub created_at: DateTime<Utc>,
}

impl License {
    /// Create a freshly issued, unbound license.
    pub(crate) fn issued(
        key: String,
        tier: Tier,
        owner_contact: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            key,
            tier,
            owner_contact,
            bound_device: None,
            activated_at: None,
            expires_at,
            created_at,
        }
    }

    /// Whether a device has been bound.
    pub fn is_activated(&self) -> bool {
        self.bound_device.is_some()
    }

    /// Whether the license is expired at `now`, regardless of binding.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires| now >= expires)
    }

    /// Whether the license is bound to `device_id`.
    pub fn is_bound_to(&self, device_id: &str) -> bool {
        self.bound_device.as_deref() == Some(device_id)
    }

    /// Derive the status at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> LicenseStatus {
        if self.is_expired_at(now) {
            return LicenseStatus::Expired;
        }
        if !self.is_activated() {
            return LicenseStatus::NotActivated;
        }
        match self.expires_at {
            Some(expires) => LicenseStatus::ActiveUntil(expires),
            None => LicenseStatus::ActiveNoExpiry,
        }
    }
}

/// Status derived from a license and the current time. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "expires_at", rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Issued, not yet bound, not expired.
    NotActivated,
    /// Bound and valid until the given time.
    ActiveUntil(DateTime<Utc>),
    /// Bound and never expires.
    ActiveNoExpiry,
    /// Past its expiry, bound or not.
    Expired,
}

impl LicenseStatus {
    /// Wire name of the state.
    pub fn state_name(&self) -> &'static str {
        match self {
            LicenseStatus::NotActivated => "not_activated",
            LicenseStatus::ActiveUntil(_) => "active_until",
            LicenseStatus::ActiveNoExpiry => "active_no_expiry",
            LicenseStatus::Expired => "expired",
        }
    }

    /// Whether the license currently grants access.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            LicenseStatus::ActiveUntil(_) | LicenseStatus::ActiveNoExpiry
        )
    }
}

/// Result of a successful issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueReceipt {
    /// The new license key.
    pub key: String,
    /// Tier derived from the amount.
    pub tier: Tier,
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationReceipt {
    /// Tier of the license.
    pub tier: Tier,
    /// Expiry of the license, if any.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the device was bound. Unchanged by re-activation.
    pub activated_at: DateTime<Utc>,
    /// `false` when this was an idempotent re-activation.
    #[serde(skip)]
    pub newly_bound: bool,
}
