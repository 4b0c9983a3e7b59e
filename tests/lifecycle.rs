//! License lifecycle through the public API: issue, activate, status.

use bindwarden::{
    tier_for_amount, BindwardenError, LicenseRegistry, LicenseStatus, RegistryConfig, Tier,
};
use chrono::Duration;
use std::collections::HashSet;

fn registry() -> LicenseRegistry {
    LicenseRegistry::new(RegistryConfig::default()).unwrap()
}

#[test]
fn issued_keys_are_unique() {
    let registry = registry();
    let keys: HashSet<String> = (0..500)
        .map(|i| registry.issue(&format!("07{:08}", i), 100 + i).unwrap().key)
        .collect();
    assert_eq!(keys.len(), 500);
    assert_eq!(registry.count().unwrap(), 500);
}

#[test]
fn tier_follows_amount() {
    let registry = registry();
    for (amount, tier) in [
        (4999, Tier::Basic),
        (5000, Tier::Standard),
        (9999, Tier::Standard),
        (10000, Tier::Premium),
    ] {
        assert_eq!(tier_for_amount(amount).unwrap(), tier);
        assert_eq!(registry.issue("0700000000", amount).unwrap().tier, tier);
    }
}

#[test]
fn basic_expires_one_day_after_issue() {
    let registry = registry();
    let key = registry.issue("0700000000", 100).unwrap().key;
    let license = registry.get(&key).unwrap();
    let expires = license.expires_at.unwrap();
    assert_eq!((expires - license.created_at).num_seconds(), 86_400);
}

#[test]
fn premium_has_no_expiry() {
    let registry = registry();
    let key = registry.issue("0700000000", 15_000).unwrap().key;
    assert!(registry.get(&key).unwrap().expires_at.is_none());

    registry.activate(&key, "deviceA").unwrap();
    assert_eq!(registry.status(&key).unwrap(), LicenseStatus::ActiveNoExpiry);
}

#[test]
fn reactivation_from_same_device_is_idempotent() {
    let registry = registry();
    let key = registry.issue("0700000000", 6000).unwrap().key;

    let first = registry.activate(&key, "deviceA").unwrap();
    let before = registry.get(&key).unwrap();
    let second = registry.activate(&key, "deviceA").unwrap();
    let after = registry.get(&key).unwrap();

    assert_eq!(first.tier, second.tier);
    assert_eq!(first.expires_at, second.expires_at);
    assert_eq!(before, after);
    assert_eq!(after.bound_device.as_deref(), Some("deviceA"));
}

#[test]
fn second_device_is_rejected() {
    let registry = registry();
    let key = registry.issue("0700000000", 100).unwrap().key;

    registry.activate(&key, "deviceA").unwrap();
    let err = registry.activate(&key, "deviceB").unwrap_err();

    assert!(matches!(err, BindwardenError::DeviceConflict));
    assert_eq!(err.http_status(), 403);
}

#[test]
fn unknown_key_is_rejected() {
    let registry = registry();
    let err = registry.activate("CLU-DOESNOTEXIST", "deviceA").unwrap_err();
    assert!(matches!(err, BindwardenError::UnknownKey));
    assert_eq!(err.http_status(), 401);
}

#[test]
fn invalid_purchases_are_rejected() {
    let registry = registry();
    assert!(matches!(
        registry.issue("", 100),
        Err(BindwardenError::InvalidRequest(_))
    ));
    assert!(matches!(
        registry.issue("0700000000", 0),
        Err(BindwardenError::InvalidRequest(_))
    ));
    assert_eq!(registry.count().unwrap(), 0);
}

#[test]
fn status_reflects_expiry_independent_of_activation() {
    let registry = registry();
    let unbound = registry.issue("0700000000", 100).unwrap().key;
    let bound = registry.issue("0700000001", 100).unwrap().key;
    registry.activate(&bound, "deviceA").unwrap();

    for key in [&unbound, &bound] {
        let expires = registry.get(key).unwrap().expires_at.unwrap();

        let before = registry.status_at(key, expires - Duration::seconds(1)).unwrap();
        assert_ne!(before, LicenseStatus::Expired);

        assert_eq!(registry.status_at(key, expires).unwrap(), LicenseStatus::Expired);
        assert_eq!(
            registry.status_at(key, expires + Duration::days(30)).unwrap(),
            LicenseStatus::Expired
        );
    }

    let expires = registry.get(&bound).unwrap().expires_at.unwrap();
    assert_eq!(
        registry.status_at(&bound, expires - Duration::seconds(1)).unwrap(),
        LicenseStatus::ActiveUntil(expires)
    );
    assert_eq!(
        registry.status_at(&unbound, expires - Duration::seconds(1)).unwrap(),
        LicenseStatus::NotActivated
    );
}

#[test]
fn snapshot_retains_every_license() {
    let registry = registry();
    let a = registry.issue("0700000000", 100).unwrap().key;
    let b = registry.issue("0700000001", 20_000).unwrap().key;
    registry.activate(&a, "deviceA").unwrap();

    let snapshot = registry.snapshot().unwrap();
    let keys: HashSet<&str> = snapshot.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(keys, HashSet::from([a.as_str(), b.as_str()]));
}
