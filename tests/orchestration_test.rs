//! Integration tests for the assignment and session managers against the
//! in-memory store.

mod common;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use common::{harness, seed_parcel, seed_shipper};
use dispatch_core::config::DispatchConfig;
use dispatch_core::orchestration::{AutoCloseScheduler, OrchestrationError};
use dispatch_core::state_machine::{AssignmentStatus, ParcelStatus, SessionStatus};
use dispatch_core::storage::StorageError;

#[tokio::test]
async fn manual_assignment_happy_path() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &["d1"]).await;
    let address = Uuid::new_v4();
    let a = seed_parcel(&h.store, "d1", address, 1).await;
    let b = seed_parcel(&h.store, "d1", address, 1).await;

    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[a.parcel_id, b.parcel_id], Some("d1"))
        .await
        .unwrap();

    assert_eq!(assignment.status, AssignmentStatus::Pending);
    assert_eq!(assignment.parcel_ids, vec![a.parcel_id, b.parcel_id]);

    // Parcels are bound but their status is untouched until session start
    let stored = h.store.get_parcel(a.parcel_id).await.unwrap();
    assert_eq!(stored.assignment_id, Some(assignment.assignment_id));
    assert_eq!(stored.status, ParcelStatus::InWarehouse);
}

#[tokio::test]
async fn manual_assignment_rejects_mixed_addresses_without_partial_state() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let a = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let b = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let err = h
        .assignments
        .create_manual(shipper.shipper_id, &[a.parcel_id, b.parcel_id], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));

    // No binding row was created for either parcel
    for parcel_id in [a.parcel_id, b.parcel_id] {
        let stored = h.store.get_parcel(parcel_id).await.unwrap();
        assert_eq!(stored.assignment_id, None);
        assert_eq!(stored.version, 1);
    }
}

#[tokio::test]
async fn manual_assignment_rejects_empty_list_and_live_binding() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let address = Uuid::new_v4();
    let parcel = seed_parcel(&h.store, "d1", address, 1).await;

    let err = h
        .assignments
        .create_manual(shipper.shipper_id, &[], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));

    h.assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();

    // The parcel now has a live (Pending) assignment
    let err = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));
}

#[tokio::test]
async fn manual_assignment_enforces_zone_membership() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &["north"]).await;
    let parcel = seed_parcel(&h.store, "south", Uuid::new_v4(), 1).await;

    let err = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], Some("south"))
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));

    // Without an explicit zone the same request passes
    h.assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();
}

#[tokio::test]
async fn accept_from_in_progress_fails_and_leaves_state_unchanged() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();

    h.sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    let err = h
        .assignments
        .accept_task(assignment.assignment_id, shipper.shipper_id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::InvalidState { entity: "assignment", .. }));

    let stored = h.store.get_assignment(assignment.assignment_id).await.unwrap();
    assert_eq!(stored.status, AssignmentStatus::InProgress);
}

#[tokio::test]
async fn session_creation_starts_assignments_and_parcels() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();

    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    assert_eq!(session.total_tasks, 1);
    let stored_assignment = h.store.get_assignment(assignment.assignment_id).await.unwrap();
    assert_eq!(stored_assignment.status, AssignmentStatus::InProgress);
    assert_eq!(stored_assignment.session_id, Some(session.session_id));
    let stored_parcel = h.store.get_parcel(parcel.parcel_id).await.unwrap();
    assert_eq!(stored_parcel.status, ParcelStatus::OnRoute);
}

#[tokio::test]
async fn accepted_assignment_can_start_into_a_running_session() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let first_parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let late_parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let first = h
        .assignments
        .create_manual(shipper.shipper_id, &[first_parcel.parcel_id], None)
        .await
        .unwrap();
    let late = h
        .assignments
        .create_manual(shipper.shipper_id, &[late_parcel.parcel_id], None)
        .await
        .unwrap();

    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[first.assignment_id])
        .await
        .unwrap();

    h.assignments
        .accept_task(late.assignment_id, shipper.shipper_id)
        .await
        .unwrap();
    let started = h
        .assignments
        .start_task(late.assignment_id, shipper.shipper_id, session.session_id)
        .await
        .unwrap();

    assert_eq!(started.status, AssignmentStatus::InProgress);
    assert_eq!(started.session_id, Some(session.session_id));

    let stored_session = h.store.get_session(session.session_id).await.unwrap();
    assert_eq!(stored_session.total_tasks, 2);
    assert_eq!(stored_session.status, SessionStatus::InProgress);

    let stored_parcel = h.store.get_parcel(late_parcel.parcel_id).await.unwrap();
    assert_eq!(stored_parcel.status, ParcelStatus::OnRoute);
}

#[tokio::test]
async fn second_active_session_for_shipper_is_rejected() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let first_parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let second_parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let first = h
        .assignments
        .create_manual(shipper.shipper_id, &[first_parcel.parcel_id], None)
        .await
        .unwrap();
    let second = h
        .assignments
        .create_manual(shipper.shipper_id, &[second_parcel.parcel_id], None)
        .await
        .unwrap();

    h.sessions
        .create_session(shipper.shipper_id, &[first.assignment_id])
        .await
        .unwrap();
    let err = h
        .sessions
        .create_session(shipper.shipper_id, &[second.assignment_id])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::Storage(StorageError::ActiveSessionExists { .. })
    ));

    // Exactly one session exists for the shipper
    let active = h
        .store
        .find_active_session(shipper.shipper_id)
        .await
        .unwrap();
    assert!(active.is_some());
}

#[tokio::test]
async fn complete_task_updates_counters_and_publishes_event() {
    let h = harness();
    let mut rx = h.publisher.subscribe();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();
    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    let completed = h
        .assignments
        .complete_task(assignment.assignment_id, shipper.shipper_id)
        .await
        .unwrap();
    assert_eq!(completed.status, AssignmentStatus::Completed);

    let stored_parcel = h.store.get_parcel(parcel.parcel_id).await.unwrap();
    assert_eq!(stored_parcel.status, ParcelStatus::Delivered);

    let stored_session = h.store.get_session(session.session_id).await.unwrap();
    assert_eq!(stored_session.completed_tasks, 1);
    assert_eq!(stored_session.status, SessionStatus::InProgress);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.payload.name(), "assignment-completed");
}

#[tokio::test]
async fn postpone_returns_parcel_to_warehouse_and_publishes_event() {
    let h = harness();
    let mut rx = h.publisher.subscribe();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();
    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    let requested = Utc::now() + chrono::Duration::hours(4);
    let postponed = h
        .assignments
        .postpone_task(
            assignment.assignment_id,
            shipper.shipper_id,
            requested,
            "receiver not home",
        )
        .await
        .unwrap();
    assert_eq!(postponed.status, AssignmentStatus::Failed);

    // Parcel is back in the warehouse and free for re-assignment
    let stored_parcel = h.store.get_parcel(parcel.parcel_id).await.unwrap();
    assert_eq!(stored_parcel.status, ParcelStatus::InWarehouse);
    assert_eq!(stored_parcel.assignment_id, None);

    let stored_session = h.store.get_session(session.session_id).await.unwrap();
    assert_eq!(stored_session.delayed_tasks, 1);

    let event = rx.recv().await.unwrap();
    assert_eq!(event.payload.name(), "parcel-postponed");
}

#[tokio::test]
async fn complete_session_fails_unfinished_assignments() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let done = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let open = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let done_assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[done.parcel_id], None)
        .await
        .unwrap();
    let open_assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[open.parcel_id], None)
        .await
        .unwrap();
    let session = h
        .sessions
        .create_session(
            shipper.shipper_id,
            &[done_assignment.assignment_id, open_assignment.assignment_id],
        )
        .await
        .unwrap();

    h.assignments
        .complete_task(done_assignment.assignment_id, shipper.shipper_id)
        .await
        .unwrap();

    let closed = h.sessions.complete_session(session.session_id).await.unwrap();
    assert_eq!(closed.status, SessionStatus::Completed);
    assert_eq!(closed.completed_tasks, 1);
    assert_eq!(closed.failed_tasks, 1);

    // The unfinished assignment was failed and its on-route parcel with it
    let stored = h
        .store
        .get_assignment(open_assignment.assignment_id)
        .await
        .unwrap();
    assert_eq!(stored.status, AssignmentStatus::Failed);
    let stored_parcel = h.store.get_parcel(open.parcel_id).await.unwrap();
    assert_eq!(stored_parcel.status, ParcelStatus::Failed);
}

#[tokio::test]
async fn complete_session_is_idempotent_and_publishes_once() {
    let h = harness();
    let mut rx = h.publisher.subscribe();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();
    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    let first = h.sessions.complete_session(session.session_id).await.unwrap();
    let second = h.sessions.complete_session(session.session_id).await.unwrap();

    assert_eq!(first.status, SessionStatus::Completed);
    assert_eq!(second.status, SessionStatus::Completed);
    assert_eq!(first.completed_tasks, second.completed_tasks);
    assert_eq!(first.failed_tasks, second.failed_tasks);

    // Exactly one session-completed event
    let event = rx.recv().await.unwrap();
    assert_eq!(event.payload.name(), "session-completed");
    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Empty)
    ));
}

#[tokio::test]
async fn fail_session_records_reason() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let assignment = h
        .assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();
    let session = h
        .sessions
        .create_session(shipper.shipper_id, &[assignment.assignment_id])
        .await
        .unwrap();

    let failed = h
        .sessions
        .fail_session(session.session_id, "vehicle breakdown")
        .await
        .unwrap();
    assert_eq!(failed.status, SessionStatus::Failed);
    assert_eq!(failed.fail_reason.as_deref(), Some("vehicle breakdown"));
}

#[tokio::test]
async fn auto_close_sweep_only_touches_open_sessions_inside_the_window() {
    let h = harness();
    let config = DispatchConfig::default();
    let sweep_now = Utc.with_ymd_and_hms(2024, 3, 11, 20, 0, 0).unwrap();

    // One session per shipper; started_at is rewritten to position each
    // session relative to the 08:00-18:00 window of the sweep day.
    let mut positioned = Vec::new();
    for hour in [10u32, 19u32] {
        let shipper = seed_shipper(&h.store, 10, &[]).await;
        let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
        let assignment = h
            .assignments
            .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
            .await
            .unwrap();
        let session = h
            .sessions
            .create_session(shipper.shipper_id, &[assignment.assignment_id])
            .await
            .unwrap();

        let mut stored = h.store.get_session(session.session_id).await.unwrap();
        stored.started_at = Utc.with_ymd_and_hms(2024, 3, 11, hour, 0, 0).unwrap();
        h.store
            .commit_cascade(Some(&stored), &[], &[])
            .await
            .unwrap();
        positioned.push(session.session_id);
    }

    // A session already closed before the sweep
    let closed_shipper = seed_shipper(&h.store, 10, &[]).await;
    let closed_parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let closed_assignment = h
        .assignments
        .create_manual(closed_shipper.shipper_id, &[closed_parcel.parcel_id], None)
        .await
        .unwrap();
    let closed_session = h
        .sessions
        .create_session(closed_shipper.shipper_id, &[closed_assignment.assignment_id])
        .await
        .unwrap();
    let mut stored = h.store.get_session(closed_session.session_id).await.unwrap();
    stored.started_at = Utc.with_ymd_and_hms(2024, 3, 11, 9, 0, 0).unwrap();
    h.store.commit_cascade(Some(&stored), &[], &[]).await.unwrap();
    let before = h
        .sessions
        .complete_session(closed_session.session_id)
        .await
        .unwrap();

    let scheduler = AutoCloseScheduler::new(h.store.clone(), h.sessions.clone(), config.shift);
    let report = scheduler.sweep(sweep_now).await;

    assert_eq!(report.swept, 1);
    assert_eq!(report.closed, 1);
    assert_eq!(report.failed, 0);

    // In-window session was force-completed
    let in_window = h.store.get_session(positioned[0]).await.unwrap();
    assert_eq!(in_window.status, SessionStatus::Completed);

    // Out-of-window session is untouched
    let out_of_window = h.store.get_session(positioned[1]).await.unwrap();
    assert_eq!(out_of_window.status, SessionStatus::Created);

    // Terminal session is untouched (same version as before the sweep)
    let terminal = h.store.get_session(closed_session.session_id).await.unwrap();
    assert_eq!(terminal.version, before.version);
}
