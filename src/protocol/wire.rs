//! Transport-agnostic request/response bodies for the request layer.
//!
//! Maps the registry operations onto JSON bodies and HTTP status codes:
//! - `POST /buy` `{phone, amount}` → `{license_key, tier}`
//! - `POST /activate` `{license_key, device_id}` → `{tier, expires_at, message}`
//! - status `{license_key}` → `{license_key, state, expires_at}`
//!
//! Handlers take raw body bytes and never panic on malformed input.

use crate::keygen::tier::Tier;
use crate::registry::LicenseRegistry;
use crate::BindwardenError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Purchase request body.
#[derive(Debug, Clone, Deserialize)]
pub struct BuyRequest {
    /// Purchaser phone number.
    pub phone: String,
    /// Amount paid, in the smallest currency unit.
    pub amount: i64,
}

/// Purchase response body.
#[derive(Debug, Clone, Serialize)]
pub struct BuyResponse {
    /// The issued key.
    pub license_key: String,
    /// Tier derived from the amount.
    pub tier: Tier,
}

/// Activation request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ActivateRequest {
    /// Key to activate.
    pub license_key: String,
    /// Device claiming the key.
    pub device_id: String,
}

/// Activation response body.
#[derive(Debug, Clone, Serialize)]
pub struct ActivateResponse {
    /// Tier of the license.
    pub tier: Tier,
    /// Expiry, `null` for premium.
    pub expires_at: Option<DateTime<Utc>>,
    /// Human-readable outcome.
    pub message: String,
}

/// Status request body.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    /// Key to look up.
    pub license_key: String,
}

/// Status response body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// The key that was looked up.
    pub license_key: String,
    /// One of `not_activated`, `active_until`, `active_no_expiry`, `expired`.
    pub state: String,
    /// Expiry, if the license has one.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Error response body. Never carries internal fault detail.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable error code.
    pub error: &'static str,
    /// Caller-facing message.
    pub message: String,
}

impl From<&BindwardenError> for ErrorBody {
    fn from(err: &BindwardenError) -> Self {
        let message = if err.is_internal() {
            "Internal error. Try again later.".to_string()
        } else {
            err.to_string()
        };
        Self {
            error: err.code(),
            message,
        }
    }
}

/// Status code plus JSON body, ready for any transport.
#[derive(Debug, Clone)]
pub struct WireResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: serde_json::Value,
}

impl WireResponse {
    fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(&BindwardenError::InternalFault(format!(
                "Response serialization failed: {}",
                e
            ))),
        }
    }

    fn error(err: &BindwardenError) -> Self {
        let body = serde_json::to_value(ErrorBody::from(err)).unwrap_or(serde_json::Value::Null);
        Self {
            status: err.http_status(),
            body,
        }
    }

    fn from_result<T: Serialize>(result: Result<T, BindwardenError>) -> Self {
        match result {
            Ok(body) => Self::ok(&body),
            Err(e) => Self::error(&e),
        }
    }

    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, BindwardenError> {
    serde_json::from_slice(body)
        .map_err(|e| BindwardenError::InvalidRequest(format!("Malformed request body: {}", e)))
}

/// Handle a purchase.
pub fn handle_buy(registry: &LicenseRegistry, body: &[u8]) -> WireResponse {
    WireResponse::from_result(parse_body::<BuyRequest>(body).and_then(|req| {
        let receipt = registry.issue(&req.phone, req.amount)?;
        Ok(BuyResponse {
            license_key: receipt.key,
            tier: receipt.tier,
        })
    }))
}

/// Handle an activation.
pub fn handle_activate(registry: &LicenseRegistry, body: &[u8]) -> WireResponse {
    WireResponse::from_result(parse_body::<ActivateRequest>(body).and_then(|req| {
        let receipt = registry.activate(&req.license_key, &req.device_id)?;
        let message = if receipt.newly_bound {
            "License activated on this device"
        } else {
            "License already active on this device"
        };
        Ok(ActivateResponse {
            tier: receipt.tier,
            expires_at: receipt.expires_at,
            message: message.to_string(),
        })
    }))
}

/// Handle a status lookup.
pub fn handle_status(registry: &LicenseRegistry, body: &[u8]) -> WireResponse {
    WireResponse::from_result(parse_body::<StatusRequest>(body).and_then(|req| {
        let (license, status) = registry.describe(&req.license_key)?;
        Ok(StatusResponse {
            license_key: req.license_key,
            state: status.state_name().to_string(),
            expires_at: license.expires_at,
        })
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;

    fn registry() -> LicenseRegistry {
        LicenseRegistry::new(RegistryConfig::default()).unwrap()
    }

    fn buy(registry: &LicenseRegistry, phone: &str, amount: i64) -> String {
        let body = serde_json::json!({ "phone": phone, "amount": amount }).to_string();
        let response = handle_buy(registry, body.as_bytes());
        assert_eq!(response.status, 200);
        response.body["license_key"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_buy_returns_key_and_tier() {
        let registry = registry();
        let response = handle_buy(&registry, br#"{"phone":"0700000000","amount":5000}"#);
        assert!(response.is_success());
        assert_eq!(response.body["tier"], "standard");
        assert!(response.body["license_key"]
            .as_str()
            .unwrap()
            .starts_with("CLU-"));
    }

    #[test]
    fn test_buy_invalid_is_400() {
        let registry = registry();
        let response = handle_buy(&registry, br#"{"phone":"","amount":100}"#);
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "INVALID_REQUEST");

        let response = handle_buy(&registry, br#"{"phone":"0700000000","amount":0}"#);
        assert_eq!(response.status, 400);
    }

    #[test]
    fn test_malformed_body_is_400() {
        let registry = registry();
        assert_eq!(handle_buy(&registry, b"not json").status, 400);
        assert_eq!(handle_buy(&registry, br#"{"phone":"0700000000"}"#).status, 400);
        assert_eq!(handle_activate(&registry, b"{}").status, 400);
        assert_eq!(handle_status(&registry, b"").status, 400);
    }

    #[test]
    fn test_activate_flow_status_codes() {
        let registry = registry();
        let key = buy(&registry, "0700000000", 100);

        let body = serde_json::json!({ "license_key": key, "device_id": "deviceA" }).to_string();
        let response = handle_activate(&registry, body.as_bytes());
        assert_eq!(response.status, 200);
        assert_eq!(response.body["tier"], "basic");
        assert!(response.body["expires_at"].is_string());
        assert_eq!(response.body["message"], "License activated on this device");

        let response = handle_activate(&registry, body.as_bytes());
        assert_eq!(response.status, 200);
        assert_eq!(response.body["message"], "License already active on this device");

        let other = serde_json::json!({ "license_key": key, "device_id": "deviceB" }).to_string();
        let response = handle_activate(&registry, other.as_bytes());
        assert_eq!(response.status, 403);
        assert_eq!(response.body["error"], "DEVICE_CONFLICT");
    }

    #[test]
    fn test_activate_unknown_key_is_401() {
        let registry = registry();
        let response = handle_activate(
            &registry,
            br#"{"license_key":"CLU-DOESNOTEXIST","device_id":"deviceA"}"#,
        );
        assert_eq!(response.status, 401);
        assert_eq!(response.body["error"], "UNKNOWN_KEY");
    }

    #[test]
    fn test_premium_activation_has_null_expiry() {
        let registry = registry();
        let key = buy(&registry, "0700000000", 20_000);
        let body = serde_json::json!({ "license_key": key, "device_id": "deviceA" }).to_string();
        let response = handle_activate(&registry, body.as_bytes());
        assert_eq!(response.body["tier"], "premium");
        assert!(response.body["expires_at"].is_null());
    }

    #[test]
    fn test_status_reports_state() {
        let registry = registry();
        let key = buy(&registry, "0700000000", 10_000);
        let body = serde_json::json!({ "license_key": key }).to_string();

        let response = handle_status(&registry, body.as_bytes());
        assert_eq!(response.status, 200);
        assert_eq!(response.body["state"], "not_activated");
        assert!(response.body["expires_at"].is_null());

        registry.activate(&key, "deviceA").unwrap();
        let response = handle_status(&registry, body.as_bytes());
        assert_eq!(response.body["state"], "active_no_expiry");

        let response = handle_status(&registry, br#"{"license_key":"CLU-DOESNOTEXIST"}"#);
        assert_eq!(response.status, 401);
    }

    #[test]
    fn test_status_expiry_matches_reported_state() {
        use crate::clock::MockClock;
        use crate::keygen::key::OsEntropy;
        use chrono::{Duration, TimeZone, Utc};
        use std::sync::Arc;

        let clock = Arc::new(MockClock::new(Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()));
        let registry =
            LicenseRegistry::new_with_seams(RegistryConfig::default(), clock.clone(), Arc::new(OsEntropy))
                .unwrap();
        let key = buy(&registry, "0700000000", 100);
        registry.activate(&key, "deviceA").unwrap();
        let body = serde_json::json!({ "license_key": key }).to_string();
        let expected = serde_json::to_value(Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()).unwrap();

        let response = handle_status(&registry, body.as_bytes());
        assert_eq!(response.body["state"], "active_until");
        assert_eq!(response.body["expires_at"], expected);

        clock.advance(Duration::days(1));
        let response = handle_status(&registry, body.as_bytes());
        assert_eq!(response.status, 200);
        assert_eq!(response.body["state"], "expired");
        assert_eq!(response.body["expires_at"], expected);
    }

    #[test]
    fn test_internal_fault_hides_detail() {
        let body = ErrorBody::from(&BindwardenError::InternalFault("entropy: EIO".to_string()));
        assert_eq!(body.error, "INTERNAL_FAULT");
        assert!(!body.message.contains("EIO"));
    }
}
