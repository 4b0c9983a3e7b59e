//! License key generation and tier derivation.

pub mod key;
pub mod tier;
