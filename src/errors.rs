//! Bindwarden error types.

use thiserror::Error;

/// Errors that can occur while issuing, activating, or checking licenses.
#[derive(Debug, Error)]
pub enum BindwardenError {
    /// Malformed or missing input. The caller can always fix this.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The license key is not known to the registry.
    #[error("Unknown license key")]
    UnknownKey,

    /// The license is already bound to a different device.
    #[error("License is already bound to another device")]
    DeviceConflict,

    /// Entropy failure, exhausted key retries, or a poisoned lock.
    #[error("Internal fault: {0}")]
    InternalFault(String),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Activation refused because the license expired before it was ever bound.
    #[error("License expired before activation")]
    ActivationExpired,

    /// Access check on a license that has never been activated.
    #[error("License has not been activated")]
    NotActivated,

    /// Access check from a device the license is not bound to.
    #[error("License is bound to a different device")]
    DeviceMismatch,

    /// Access check on an expired license.
    #[error("License has expired")]
    LicenseExpired,
}

impl BindwardenError {
    /// HTTP status a request layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::UnknownKey => 401,
            Self::DeviceConflict
            | Self::ActivationExpired
            | Self::NotActivated
            | Self::DeviceMismatch
            | Self::LicenseExpired => 403,
            Self::InternalFault(_) | Self::ConfigError(_) => 500,
        }
    }

    /// Whether this is a server-side fault rather than a caller error.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::InternalFault(_) | Self::ConfigError(_))
    }

    /// Stable machine-readable code for wire responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::UnknownKey => "UNKNOWN_KEY",
            Self::DeviceConflict => "DEVICE_CONFLICT",
            Self::InternalFault(_) | Self::ConfigError(_) => "INTERNAL_FAULT",
            Self::ActivationExpired => "ACTIVATION_EXPIRED",
            Self::NotActivated => "NOT_ACTIVATED",
            Self::DeviceMismatch => "DEVICE_MISMATCH",
            Self::LicenseExpired => "LICENSE_EXPIRED",
        }
    }
}
