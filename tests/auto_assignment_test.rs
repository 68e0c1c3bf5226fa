//! Integration tests for the auto-assignment path: solving, assignment
//! materialization and failure handling.

mod common;

use uuid::Uuid;

use common::{harness, seed_parcel, seed_shipper, unavailable_harness};
use dispatch_core::orchestration::OrchestrationError;
use dispatch_core::routing::{SolverMode, VehicleProfile};
use dispatch_core::solver::SolverError;
use dispatch_core::state_machine::AssignmentStatus;

#[tokio::test]
async fn auto_assignment_materializes_one_assignment_per_address_group() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &["d1"]).await;
    let shared_address = Uuid::new_v4();
    let a = seed_parcel(&h.store, "d1", shared_address, 1).await;
    let b = seed_parcel(&h.store, "d1", shared_address, 1).await;
    let c = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let outcome = h
        .assignments
        .create_auto(None, None, VehicleProfile::Motorbike, SolverMode::Fastest)
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), 2);
    assert!(outcome.unassigned_orders.is_empty());
    assert_eq!(outcome.stats.assigned_orders, 3);

    // Co-addressed parcels landed in one assignment, on one shipper
    let shared = outcome
        .assignments
        .iter()
        .find(|x| x.delivery_address_id == shared_address)
        .unwrap();
    assert_eq!(shared.parcel_count(), 2);
    assert!(shared.parcel_ids.contains(&a.parcel_id));
    assert!(shared.parcel_ids.contains(&b.parcel_id));
    assert_eq!(shared.shipper_id, shipper.shipper_id);
    assert_eq!(shared.status, AssignmentStatus::Pending);

    // Sequence follows route order and parcels are bound
    let sequences: Vec<i32> = outcome.assignments.iter().map(|x| x.sequence).collect();
    assert_eq!(sequences, vec![1, 2]);
    let stored = h.store.get_parcel(c.parcel_id).await.unwrap();
    assert!(stored.assignment_id.is_some());
}

#[tokio::test]
async fn auto_assignment_reports_infeasible_orders_without_failing() {
    let h = harness();
    seed_shipper(&h.store, 1, &["d1"]).await;
    let placed = seed_parcel(&h.store, "d1", Uuid::new_v4(), 0).await;
    let out_of_zone = seed_parcel(&h.store, "d9", Uuid::new_v4(), 0).await;
    let over_capacity = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let outcome = h
        .assignments
        .create_auto(None, None, VehicleProfile::Motorbike, SolverMode::Fastest)
        .await
        .unwrap();

    assert_eq!(outcome.assignments.len(), 1);
    assert_eq!(outcome.assignments[0].parcel_ids, vec![placed.parcel_id]);

    let mut unassigned = outcome.unassigned_orders.clone();
    unassigned.sort();
    let mut expected = vec![out_of_zone.parcel_id, over_capacity.parcel_id];
    expected.sort();
    assert_eq!(unassigned, expected);

    // Unplaced parcels keep no binding and stay eligible
    let stored = h.store.get_parcel(out_of_zone.parcel_id).await.unwrap();
    assert!(stored.assignment_id.is_none());
}

#[tokio::test]
async fn auto_assignment_prefers_priority_zero_for_the_last_slot() {
    let h = harness();
    seed_shipper(&h.store, 2, &["d1"]).await;
    let urgent = seed_parcel(&h.store, "d1", Uuid::new_v4(), 0).await;
    let filler = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    let loser = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let outcome = h
        .assignments
        .create_auto(
            None,
            Some(&[loser.parcel_id, filler.parcel_id, urgent.parcel_id]),
            VehicleProfile::Motorbike,
            SolverMode::Fastest,
        )
        .await
        .unwrap();

    let placed: Vec<Uuid> = outcome
        .assignments
        .iter()
        .flat_map(|x| x.parcel_ids.clone())
        .collect();
    assert_eq!(placed.len(), 2);
    assert!(placed.contains(&urgent.parcel_id), "P0 wins a contested slot");
    assert_eq!(outcome.unassigned_orders.len(), 1);

    // P0 also comes first in the route
    assert_eq!(outcome.assignments[0].parcel_ids[0], urgent.parcel_id);
}

#[tokio::test]
async fn auto_assignment_rejects_explicitly_listed_bound_parcel() {
    let h = harness();
    let shipper = seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;
    h.assignments
        .create_manual(shipper.shipper_id, &[parcel.parcel_id], None)
        .await
        .unwrap();

    let err = h
        .assignments
        .create_auto(
            None,
            Some(&[parcel.parcel_id]),
            VehicleProfile::Motorbike,
            SolverMode::Fastest,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::Validation(_)));
}

#[tokio::test]
async fn solver_unavailability_applies_nothing() {
    let h = unavailable_harness();
    seed_shipper(&h.store, 10, &[]).await;
    let parcel = seed_parcel(&h.store, "d1", Uuid::new_v4(), 1).await;

    let err = h
        .assignments
        .create_auto(None, None, VehicleProfile::Motorbike, SolverMode::Fastest)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrchestrationError::Solver(SolverError::Unavailable(_))
    ));

    // No partial solution was applied
    let stored = h.store.get_parcel(parcel.parcel_id).await.unwrap();
    assert!(stored.assignment_id.is_none());
    assert_eq!(stored.version, 1);
}
