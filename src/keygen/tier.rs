//! Tier and expiry derivation from purchase amounts.

use crate::BindwardenError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount at or above which a purchase is premium.
pub const PREMIUM_THRESHOLD: i64 = 10_000;

/// Amount at or above which a purchase is standard.
pub const STANDARD_THRESHOLD: i64 = 5_000;

/// Entitlement level, fixed at issuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Expires one day after issuance.
    Basic,
    /// Expires seven days after issuance.
    Standard,
    /// Never expires.
    Premium,
}

impl Tier {
    /// Wire name of the tier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Basic => "basic",
            Tier::Standard => "standard",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a purchase amount to a tier.
///
/// # Errors
/// * `InvalidRequest` - `amount` is zero or negative
pub fn tier_for_amount(amount: i64) -> Result<Tier, BindwardenError> {
    match amount {
        a if a >= PREMIUM_THRESHOLD => Ok(Tier::Premium),
        a if a >= STANDARD_THRESHOLD => Ok(Tier::Standard),
        a if a > 0 => Ok(Tier::Basic),
        a => Err(BindwardenError::InvalidRequest(format!(
            "amount must be positive, got {}",
            a
        ))),
    }
}

/// Lifetimes of the expiring tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSchedule {
    /// Lifetime of a basic license.
    pub basic: Duration,
    /// Lifetime of a standard license.
    pub standard: Duration,
}

impl Default for TierSchedule {
    fn default() -> Self {
        Self {
            basic: Duration::days(1),
            standard: Duration::days(7),
        }
    }
}

impl TierSchedule {
    /// Build a schedule from std durations.
    ///
    /// # Errors
    /// * `ConfigError` - A lifetime does not fit chrono's range
    pub fn from_std(
        basic: std::time::Duration,
        standard: std::time::Duration,
    ) -> Result<Self, BindwardenError> {
        let convert = |d: std::time::Duration| {
            Duration::from_std(d)
                .map_err(|e| BindwardenError::ConfigError(format!("Invalid tier lifetime: {}", e)))
        };
        Ok(Self {
            basic: convert(basic)?,
            standard: convert(standard)?,
        })
    }

    /// Absolute expiry for a license of `tier` issued at `now`.
    ///
    /// # Errors
    /// * `InternalFault` - `now` plus the lifetime is past chrono's date range
    pub fn expires_at(
        &self,
        tier: Tier,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, BindwardenError> {
        let lifetime = match tier {
            Tier::Basic => self.basic,
            Tier::Standard => self.standard,
            Tier::Premium => return Ok(None),
        };
        now.checked_add_signed(lifetime).map(Some).ok_or_else(|| {
            BindwardenError::InternalFault(format!("{} expiry out of range from {}", tier, now))
        })
    }
}

/// Expiry for `tier` issued at `now`, using the default schedule.
///
/// # Errors
/// * `InternalFault` - `now` is within a week of chrono's maximum date
pub fn expiry_for_tier(
    tier: Tier,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, BindwardenError> {
    TierSchedule::default().expires_at(tier, now)
}
