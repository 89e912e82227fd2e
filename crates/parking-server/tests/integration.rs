//! Integration Tests for the parking engines
//!
//! These tests drive the engines end to end over the in-memory store:
//! - Day permit windows and boundary-inclusive validity
//! - Overlap rejection, including under concurrent issuance
//! - Ownership confirmation before any write
//! - The ticket dispute workflow and its terminal states
//! - Best-effort notifications

mod common;

use chrono::Duration;
use common::*;
use parking_core::ticket::MAX_TICKET_CENTS;
use parking_core::{Clock, Role, TicketAction, TicketStatus};
use parking_server::engine::{EngineError, IssuePermitRequest, IssueTicketRequest, NewAccount};
use parking_server::Notification;
use std::sync::Arc;

fn permit_request(plate: &str, permit_type_id: uuid::Uuid, active_from: &str) -> IssuePermitRequest {
    IssuePermitRequest {
        plate: plate.into(),
        state: "WA".into(),
        permit_type_id,
        active_from: Some(at(active_from)),
    }
}

// =============================================================================
// Permit Issuance
// =============================================================================

#[tokio::test]
async fn test_day_permit_window_and_validity() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let permit = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T00:00:00Z"))
        .await
        .unwrap();

    assert_eq!(permit.active_from, at("2026-05-22T00:00:00Z"));
    assert_eq!(permit.expires_at, at("2026-05-22T23:59:00Z"));
    assert_eq!(permit.holder_id, alice.subject_id);

    h.clock.set(at("2026-05-22T14:28:30Z"));
    let report = h.state.validity.check(&enforcer, "ABC123", "WA").await.unwrap();
    assert!(report.valid);
    assert_eq!(report.vehicle_id, permit.vehicle_id);

    h.clock.set(at("2026-05-22T23:59:00Z"));
    assert!(h.state.validity.check(&enforcer, "abc-123", "wa").await.unwrap().valid);

    h.clock.set(at("2026-05-23T00:00:01Z"));
    assert!(!h.state.validity.check(&enforcer, "ABC123", "WA").await.unwrap().valid);
}

#[tokio::test]
async fn test_overlapping_permit_rejected_and_nothing_written() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let vehicle = h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    h.state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T00:00:00Z"))
        .await
        .unwrap();

    let second = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T14:28:30Z"))
        .await;
    assert!(matches!(second, Err(EngineError::OverlappingPermit)));

    let permits = h.state.permits.list_for_vehicle(&alice, vehicle.id).await.unwrap();
    assert_eq!(permits.len(), 1);
}

#[tokio::test]
async fn test_revoked_permit_frees_its_window() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let admin = h.admin().await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let first = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T08:00:00Z"))
        .await
        .unwrap();
    h.state.permits.revoke(&admin, first.id).await.unwrap();

    let again = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T09:00:00Z"))
        .await;
    assert!(again.is_ok());

    assert!(matches!(
        h.state.permits.revoke(&admin, first.id).await,
        Err(EngineError::PermitNotFound)
    ));
}

#[tokio::test]
async fn test_next_day_permit_does_not_overlap() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    for start in ["2026-05-22T00:00:00Z", "2026-05-23T00:00:00Z", "2026-05-24T12:00:00Z"] {
        let result = h.state.permits.issue(&alice, permit_request("ABC123", day.id, start)).await;
        assert!(result.is_ok(), "permit starting {} should be accepted", start);
    }

    assert_eq!(h.state.permits.list_own(&alice).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_permit_for_someone_elses_vehicle_not_confirmed() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let bob = h.driver("Bob").await;
    let bobs_car = h.vehicle(&bob, "XYZ789").await;
    let day = h.day_pass().await;

    let result = h
        .state
        .permits
        .issue(&alice, permit_request("XYZ789", day.id, "2026-05-22T10:00:00Z"))
        .await;
    assert!(matches!(result, Err(EngineError::VehicleNotConfirmed)));

    let unknown = h
        .state
        .permits
        .issue(&alice, permit_request("NOPE1", day.id, "2026-05-22T10:00:00Z"))
        .await;
    assert!(matches!(unknown, Err(EngineError::VehicleNotConfirmed)));

    let written = h.state.store.list_permits_for_vehicle(bobs_car.id).await.unwrap();
    assert!(written.is_empty());
}

#[tokio::test]
async fn test_registry_outage_fails_issuance_without_write() {
    let h = Harness::with(|b| b.with_confirmer(Arc::new(UnreachableRegistry)));
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let result = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T10:00:00Z"))
        .await;
    assert!(matches!(result, Err(EngineError::VehicleNotConfirmed)));
    assert!(h.state.permits.list_own(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_day_class_is_unsupported() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let semester = h.permit_type("semester").await;

    let result = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", semester.id, "2026-05-22T10:00:00Z"))
        .await;
    assert!(matches!(result, Err(EngineError::UnsupportedDurationClass(class)) if class == "semester"));
    assert!(h.state.permits.list_own(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_start_after_end_of_day_is_invalid() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let result = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T23:59:01Z"))
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn test_deleted_permit_type_cannot_be_purchased() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let admin = h.admin().await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    h.state.catalog.delete(&admin, day.id).await.unwrap();
    assert!(h.state.catalog.list().await.unwrap().is_empty());

    let result = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T10:00:00Z"))
        .await;
    assert!(matches!(result, Err(EngineError::PermitTypeNotFound)));
}

#[tokio::test]
async fn test_active_from_defaults_to_now() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;
    h.clock.set(at("2026-05-22T17:45:00Z"));

    let permit = h
        .state
        .permits
        .issue(
            &alice,
            IssuePermitRequest {
                plate: "ABC123".into(),
                state: "WA".into(),
                permit_type_id: day.id,
                active_from: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(permit.active_from, at("2026-05-22T17:45:00Z"));
    assert_eq!(permit.expires_at, at("2026-05-22T23:59:00Z"));
}

/// Many drivers' devices racing to buy the same window: the store admits one.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuance_admits_exactly_one() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let mut handles = Vec::new();
    for hour in 0..8 {
        let state = h.state.clone();
        let driver = alice.clone();
        let request = permit_request("ABC123", day.id, &format!("2026-05-22T{:02}:00:00Z", hour + 8));
        handles.push(tokio::spawn(async move { state.permits.issue(&driver, request).await }));
    }

    let mut issued = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => issued += 1,
            Err(EngineError::OverlappingPermit) => conflicts += 1,
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    assert_eq!(issued, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(h.state.permits.list_own(&alice).await.unwrap().len(), 1);
}

// =============================================================================
// Enforcement
// =============================================================================

#[tokio::test]
async fn test_validity_for_unknown_plate() {
    let h = Harness::new();
    let enforcer = h.enforcer("Officer").await;

    let result = h.state.validity.check(&enforcer, "GHOST1", "WA").await;
    assert!(matches!(result, Err(EngineError::VehicleNotFound)));
}

#[tokio::test]
async fn test_vehicle_without_permit_is_invalid() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let found = h.state.registry.lookup(&enforcer, "ABC123", "WA").await.unwrap();
    assert_eq!(found.id, vehicle.id);

    let report = h.state.validity.check(&enforcer, "ABC123", "WA").await.unwrap();
    assert!(!report.valid);
    assert_eq!(report.checked_at, h.clock.now());
}

// =============================================================================
// Tickets
// =============================================================================

#[tokio::test]
async fn test_ticket_dispute_rejected_then_paid() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let ticket = h
        .state
        .tickets
        .issue(
            &enforcer,
            IssueTicketRequest {
                vehicle_id: vehicle.id,
                cost_cents: 5000,
            },
        )
        .await
        .unwrap();
    assert_eq!(ticket.status, TicketStatus::Unpaid);
    assert_eq!(ticket.deadline, ticket.issued_at + Duration::days(21));

    let challenged = h
        .state
        .tickets
        .challenge(&alice, ticket.id, "The meter was broken")
        .await
        .unwrap();
    assert_eq!(challenged.status, TicketStatus::Challenged);
    assert_eq!(challenged.dispute_description.as_deref(), Some("The meter was broken"));

    let rejected = h.state.tickets.reject_challenge(&admin, ticket.id).await.unwrap();
    assert_eq!(rejected.status, TicketStatus::Rejected);

    let paid = h.state.tickets.pay(&alice, ticket.id).await.unwrap();
    assert_eq!(paid.status, TicketStatus::Paid);

    assert!(matches!(
        h.state.tickets.pay(&alice, ticket.id).await,
        Err(EngineError::InvalidTransition {
            action: TicketAction::Pay,
            from: TicketStatus::Paid
        })
    ));
    assert!(matches!(
        h.state.tickets.challenge(&alice, ticket.id, "again").await,
        Err(EngineError::InvalidTransition {
            action: TicketAction::Challenge,
            from: TicketStatus::Paid
        })
    ));
}

#[tokio::test]
async fn test_accepted_ticket_is_terminal() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let ticket = h
        .state
        .tickets
        .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 2500 })
        .await
        .unwrap();
    h.state.tickets.challenge(&alice, ticket.id, "I had a permit").await.unwrap();
    let accepted = h.state.tickets.accept_challenge(&admin, ticket.id).await.unwrap();
    assert_eq!(accepted.status, TicketStatus::Accepted);

    assert!(h.state.tickets.pay(&alice, ticket.id).await.is_err());
    assert!(h.state.tickets.challenge(&alice, ticket.id, "x").await.is_err());
    assert!(h.state.tickets.reject_challenge(&admin, ticket.id).await.is_err());
    assert!(h.state.tickets.accept_challenge(&admin, ticket.id).await.is_err());

    let stored = h.state.store.get_ticket(ticket.id).await.unwrap().unwrap();
    assert_eq!(stored.status, TicketStatus::Accepted);
}

#[tokio::test]
async fn test_rejected_ticket_cannot_be_rechallenged() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let ticket = h
        .state
        .tickets
        .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 2500 })
        .await
        .unwrap();
    h.state.tickets.challenge(&alice, ticket.id, "first try").await.unwrap();
    h.state.tickets.reject_challenge(&admin, ticket.id).await.unwrap();

    assert!(matches!(
        h.state.tickets.challenge(&alice, ticket.id, "second try").await,
        Err(EngineError::InvalidTransition {
            action: TicketAction::Challenge,
            from: TicketStatus::Rejected
        })
    ));
}

#[tokio::test]
async fn test_unpaid_ticket_cannot_be_reviewed() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let ticket = h
        .state
        .tickets
        .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 2500 })
        .await
        .unwrap();

    assert!(matches!(
        h.state.tickets.accept_challenge(&admin, ticket.id).await,
        Err(EngineError::InvalidTransition { from: TicketStatus::Unpaid, .. })
    ));
}

#[tokio::test]
async fn test_unknown_ticket_not_found() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let admin = h.admin().await;
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(h.state.tickets.pay(&alice, missing).await, Err(EngineError::TicketNotFound)));
    assert!(matches!(
        h.state.tickets.challenge(&alice, missing, "why").await,
        Err(EngineError::TicketNotFound)
    ));
    assert!(matches!(
        h.state.tickets.accept_challenge(&admin, missing).await,
        Err(EngineError::TicketNotFound)
    ));
    assert!(matches!(
        h.state.tickets.reject_challenge(&admin, missing).await,
        Err(EngineError::TicketNotFound)
    ));
}

#[tokio::test]
async fn test_ticket_on_missing_vehicle_rejected() {
    let h = Harness::new();
    let enforcer = h.enforcer("Officer").await;

    let result = h
        .state
        .tickets
        .issue(
            &enforcer,
            IssueTicketRequest {
                vehicle_id: uuid::Uuid::new_v4(),
                cost_cents: 2500,
            },
        )
        .await;
    assert!(matches!(result, Err(EngineError::VehicleNotFound)));
}

#[tokio::test]
async fn test_challenges_listed_newest_first() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    assert!(h.state.tickets.list_challenges(&admin).await.unwrap().is_empty());

    let mut ids = Vec::new();
    for _ in 0..3 {
        let ticket = h
            .state
            .tickets
            .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 1000 })
            .await
            .unwrap();
        h.state.tickets.challenge(&alice, ticket.id, "not mine").await.unwrap();
        ids.push(ticket.id);
        h.clock.advance(Duration::hours(1));
    }

    let listed: Vec<_> = h
        .state
        .tickets
        .list_challenges(&admin)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);
}

#[tokio::test]
async fn test_unpaid_summary_counts_outstanding_tickets() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let admin = h.admin().await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let clean = h.state.tickets.unpaid_summary(alice.subject_id).await.unwrap();
    assert!(!clean.has_unpaid);

    let issue = |cost| IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: cost };
    let unpaid = h.state.tickets.issue(&enforcer, issue(5000)).await.unwrap();
    let rejected = h.state.tickets.issue(&enforcer, issue(2500)).await.unwrap();
    let paid = h.state.tickets.issue(&enforcer, issue(1000)).await.unwrap();

    h.state.tickets.challenge(&alice, rejected.id, "no").await.unwrap();
    h.state.tickets.reject_challenge(&admin, rejected.id).await.unwrap();
    h.state.tickets.pay(&alice, paid.id).await.unwrap();

    let summary = h.state.tickets.unpaid_summary(alice.subject_id).await.unwrap();
    assert!(summary.has_unpaid);
    assert_eq!(summary.unpaid_count, 2);
    assert_eq!(summary.outstanding_cents, 7500);

    h.state.tickets.pay(&alice, unpaid.id).await.unwrap();
    h.state.tickets.pay(&alice, rejected.id).await.unwrap();
    assert!(!h.state.tickets.unpaid_summary(alice.subject_id).await.unwrap().has_unpaid);

    assert!(matches!(
        h.state.tickets.unpaid_summary(uuid::Uuid::new_v4()).await,
        Err(EngineError::PrincipalNotFound(_))
    ));
}

#[tokio::test]
async fn test_oversized_fines_rejected_and_summary_stays_exact() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let vehicle = h.vehicle(&alice, "ABC123").await;

    let issue = |cost| IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: cost };
    for cost in [i64::MAX, MAX_TICKET_CENTS + 1] {
        assert!(matches!(
            h.state.tickets.issue(&enforcer, issue(cost)).await,
            Err(EngineError::Validation(_))
        ));
    }
    assert!(h.state.tickets.list_own(&alice).await.unwrap().is_empty());

    h.state.tickets.issue(&enforcer, issue(MAX_TICKET_CENTS)).await.unwrap();
    h.state.tickets.issue(&enforcer, issue(MAX_TICKET_CENTS)).await.unwrap();

    let summary = h.state.tickets.unpaid_summary(alice.subject_id).await.unwrap();
    assert_eq!(summary.unpaid_count, 2);
    assert_eq!(summary.outstanding_cents, 2 * MAX_TICKET_CENTS);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notifications_reach_the_driver() {
    let (notifier, mut rx) = RecordingNotifier::channel();
    let h = Harness::with(|b| b.with_notifier(notifier));
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let vehicle = h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    let permit = h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T08:00:00Z"))
        .await
        .unwrap();
    match next_notification(&mut rx).await {
        Notification::PermitIssued { recipient, permit: sent } => {
            assert_eq!(recipient.principal_id, alice.subject_id);
            assert_eq!(sent.id, permit.id);
        }
        other => panic!("unexpected notification: {:?}", other),
    }

    let ticket = h
        .state
        .tickets
        .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 5000 })
        .await
        .unwrap();
    match next_notification(&mut rx).await {
        Notification::TicketIssued { recipient, ticket: sent } => {
            assert_eq!(recipient.email, email("Alice"));
            assert_eq!(sent.id, ticket.id);
        }
        other => panic!("unexpected notification: {:?}", other),
    }

    h.state.tickets.pay(&alice, ticket.id).await.unwrap();
    let paid = next_notification(&mut rx).await;
    assert_eq!(paid.kind(), "ticket_paid");
}

#[tokio::test]
async fn test_notification_failures_do_not_fail_the_write() {
    let h = Harness::with(|b| {
        b.with_notifier(Arc::new(FailingNotifier))
            .with_owner_lookup(Arc::new(UnreachableRegistry))
    });
    let alice = h.driver("Alice").await;
    let enforcer = h.enforcer("Officer").await;
    let vehicle = h.vehicle(&alice, "ABC123").await;
    let day = h.day_pass().await;

    assert!(h
        .state
        .permits
        .issue(&alice, permit_request("ABC123", day.id, "2026-05-22T08:00:00Z"))
        .await
        .is_ok());

    let ticket = h
        .state
        .tickets
        .issue(&enforcer, IssueTicketRequest { vehicle_id: vehicle.id, cost_cents: 5000 })
        .await
        .unwrap();
    assert_eq!(h.state.tickets.list_own(&alice).await.unwrap()[0].id, ticket.id);
}

// =============================================================================
// Accounts and Vehicles
// =============================================================================

#[tokio::test]
async fn test_duplicate_signup_rejected() {
    let h = Harness::new();
    h.driver("Alice").await;

    let again = h
        .state
        .accounts
        .signup_driver(NewAccount {
            display_name: "Alice Again".into(),
            email: "ALICE@campus.example".into(),
            password: PASSWORD.into(),
        })
        .await;
    assert!(matches!(again, Err(EngineError::DuplicateAccount)));
}

#[tokio::test]
async fn test_drivers_cannot_be_provisioned() {
    let h = Harness::new();
    let admin = h.admin().await;

    let result = h
        .state
        .accounts
        .provision(
            &admin,
            Role::Driver,
            NewAccount {
                display_name: "Sneaky".into(),
                email: email("sneaky"),
                password: PASSWORD.into(),
            },
        )
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn test_vehicle_natural_key_reusable_after_removal() {
    let h = Harness::new();
    let alice = h.driver("Alice").await;
    let bob = h.driver("Bob").await;
    let car = h.vehicle(&alice, "ABC123").await;

    let duplicate = h
        .state
        .registry
        .register(
            &bob,
            parking_core::NewVehicle {
                plate: "abc 123".into(),
                state: "wa".into(),
                make: "Ford".into(),
                model: "Focus".into(),
                year: 2015,
                color: "red".into(),
            },
        )
        .await;
    assert!(matches!(duplicate, Err(EngineError::DuplicateVehicle)));

    assert!(matches!(
        h.state.registry.remove(&bob, car.id).await,
        Err(EngineError::VehicleNotFound)
    ));
    h.state.registry.remove(&alice, car.id).await.unwrap();
    assert!(h.state.registry.list_own(&alice).await.unwrap().is_empty());

    let bobs = h.vehicle(&bob, "ABC123").await;
    assert_eq!(bobs.owner_id, bob.subject_id);
}
