//! Activation and access policies.

pub mod access;
pub mod activation;
