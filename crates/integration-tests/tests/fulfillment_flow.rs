//! Provider status mapping and admin lockout.

use chrono::{Duration, Utc};

use inkdrop_core::FulfillmentStatus;
use inkdrop_core::fulfillment::{map_provider_status, status_for_event};
use inkdrop_core::lockout::{LockoutPolicy, LoginAttempts};

#[test]
fn test_provider_statuses_map_onto_local_statuses() {
    assert_eq!(map_provider_status("inprocess"), FulfillmentStatus::InProduction);
    assert_eq!(map_provider_status("fulfilled"), FulfillmentStatus::Shipped);
    assert_eq!(map_provider_status("archived").as_str(), "archived");
}

#[test]
fn test_webhook_events_drive_status() {
    assert_eq!(
        status_for_event("package_shipped", None),
        Some(FulfillmentStatus::Shipped)
    );
    assert_eq!(
        status_for_event("order_updated", Some("onhold")),
        Some(FulfillmentStatus::OnHold)
    );
    assert_eq!(status_for_event("stock_updated", None), None);
}

#[test]
fn test_lockout_after_max_failures_and_reset_on_success() {
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    let mut attempts = LoginAttempts::default();
    for _ in 0..policy.max_attempts {
        assert!(!policy.is_locked(&attempts, now));
        attempts = policy.record_failure(&attempts, now);
    }
    assert!(policy.is_locked(&attempts, now));
    assert!(!policy.is_locked(&attempts, now + policy.lock_duration + Duration::seconds(1)));

    let reset = policy.record_success();
    assert_eq!(reset.failed_attempts, 0);
    assert!(!policy.is_locked(&reset, now));
}
