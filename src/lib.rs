//! # Bindwarden
//!
//! **License issuance and one-time device binding for a license-gated client.**
//!
//! A purchase yields a license key whose tier (and therefore expiry) is
//! derived from the amount paid. The key is later bound, exactly once, to a
//! single device. Everything lives in an in-memory [`LicenseRegistry`] that
//! request handlers share.
//!
//! ## Features
//!
//! - **Unguessable keys** - 128 bits of OS entropy, uppercase hex, fixed prefix
//! - **Single-bind invariant** - a key is never rebound to a second device
//! - **Idempotent activation** - the bound device may activate again and again
//! - **Derived status** - expiry is computed at read time, never stored as a flag
//! - **Solve gating** - read-only access check for the bound device
//!
//! ## Quickstart
//!
//! ```no_run
//! use bindwarden::{LicenseRegistry, LicenseStatus, RegistryConfig};
//!
//! fn main() -> Result<(), bindwarden::BindwardenError> {
//!     let registry = LicenseRegistry::new(RegistryConfig::default())?;
//!
//!     let receipt = registry.issue("0700000000", 5000)?;
//!     println!("Issued {} ({})", receipt.key, receipt.tier);
//!
//!     let activation = registry.activate(&receipt.key, "device-1234")?;
//!     println!("Expires: {:?}", activation.expires_at);
//!
//!     if let LicenseStatus::ActiveUntil(until) = registry.status(&receipt.key)? {
//!         println!("Active until {}", until);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Tiers
//!
//! | amount | tier | lifetime |
//! |---|---|---|
//! | ≥ 10000 | premium | never expires |
//! | 5000 to 9999 | standard | 7 days |
//! | 1 to 4999 | basic | 1 day |
//!
//! Lifetimes count from issuance, not activation.
//!
//! ## Persistence
//!
//! None. A process restart loses all license state.

#![deny(warnings)]
#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Key generation layer
pub mod keygen;

// Record and wire layer
pub mod protocol;

// Policy layer
pub mod policy;

// Registry (main public API)
pub mod registry;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::RegistryConfig;
pub use errors::BindwardenError;
pub use keygen::key::{EntropySource, OsEntropy};
pub use keygen::tier::{expiry_for_tier, tier_for_amount, Tier};
pub use policy::access::AccessGrant;
pub use policy::activation::ActivationPolicy;
pub use protocol::models::{ActivationReceipt, IssueReceipt, License, LicenseStatus};
pub use registry::LicenseRegistry;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
#[cfg(any(test, feature = "test-seams"))]
pub use keygen::key::ScriptedEntropy;
