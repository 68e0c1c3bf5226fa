//! Shared test harness: in-memory store, scripted route matrix clients and
//! entity builders.
#![allow(dead_code)] // not every test binary uses every helper

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use dispatch_core::events::EventPublisher;
use dispatch_core::models::{NewParcel, Parcel, ShipperProfile};
use dispatch_core::orchestration::{AssignmentManager, SessionLifecycleManager};
use dispatch_core::routing::{
    Coordinate, RouteMatrix, RouteMatrixClient, RoutingError, RoutingResult, SolverMode,
    VehicleProfile,
};
use dispatch_core::solver::AutoAssignmentEngine;
use dispatch_core::storage::{DispatchStore, InMemoryStore};

/// Uniform travel time between any two distinct waypoints.
pub struct UniformMatrixClient {
    pub travel_secs: f64,
}

#[async_trait]
impl RouteMatrixClient for UniformMatrixClient {
    async fn matrix(
        &self,
        coordinates: &[Coordinate],
        _vehicle: VehicleProfile,
        _mode: SolverMode,
    ) -> RoutingResult<RouteMatrix> {
        let n = coordinates.len();
        let durations: Vec<Vec<f64>> = (0..n)
            .map(|i| {
                (0..n)
                    .map(|j| if i == j { 0.0 } else { self.travel_secs })
                    .collect()
            })
            .collect();
        Ok(RouteMatrix {
            distances: durations.clone(),
            durations,
            waypoints: coordinates.to_vec(),
        })
    }
}

/// Client standing in for an unreachable routing service.
pub struct UnavailableMatrixClient;

#[async_trait]
impl RouteMatrixClient for UnavailableMatrixClient {
    async fn matrix(
        &self,
        _coordinates: &[Coordinate],
        _vehicle: VehicleProfile,
        _mode: SolverMode,
    ) -> RoutingResult<RouteMatrix> {
        Err(RoutingError::Timeout { timeout_ms: 10 })
    }
}

pub struct Harness {
    pub store: Arc<dyn DispatchStore>,
    pub assignments: AssignmentManager,
    pub sessions: Arc<SessionLifecycleManager>,
    pub publisher: EventPublisher,
}

/// Harness with a well-behaved routing service.
pub fn harness() -> Harness {
    harness_with_client(Arc::new(UniformMatrixClient { travel_secs: 60.0 }))
}

/// Harness whose routing service always times out.
pub fn unavailable_harness() -> Harness {
    harness_with_client(Arc::new(UnavailableMatrixClient))
}

pub fn harness_with_client(client: Arc<dyn RouteMatrixClient>) -> Harness {
    let store: Arc<dyn DispatchStore> = Arc::new(InMemoryStore::new());
    let publisher = EventPublisher::new(64);
    let engine = AutoAssignmentEngine::new(client);
    let assignments = AssignmentManager::new(store.clone(), engine, publisher.clone());
    let sessions = Arc::new(SessionLifecycleManager::new(
        store.clone(),
        publisher.clone(),
    ));
    Harness {
        store,
        assignments,
        sessions,
        publisher,
    }
}

pub async fn seed_shipper(
    store: &Arc<dyn DispatchStore>,
    capacity: i32,
    zones: &[&str],
) -> ShipperProfile {
    let profile = ShipperProfile {
        shipper_id: Uuid::new_v4(),
        name: "Minh Nguyen".to_string(),
        lat: 10.762,
        lon: 106.660,
        shift_start: Utc::now(),
        max_session_minutes: 480,
        capacity,
        working_zones: zones.iter().map(|z| z.to_string()).collect(),
        available: true,
    };
    store.upsert_shipper(&profile).await.unwrap();
    profile
}

pub async fn seed_parcel(
    store: &Arc<dyn DispatchStore>,
    zone: &str,
    delivery_address_id: Uuid,
    priority: i32,
) -> Parcel {
    let parcel = Parcel::from_intake(NewParcel {
        code: format!("PK-{}", &Uuid::new_v4().to_string()[..8]),
        delivery_address_id,
        zone_id: zone.to_string(),
        receiver_id: Uuid::new_v4(),
        receiver_name: "Thu Pham".to_string(),
        receiver_phone: "+84 91 234 5678".to_string(),
        lat: 10.780,
        lon: 106.700,
        priority,
        service_time_secs: 120,
    });
    store.insert_parcel(&parcel).await.unwrap();
    parcel
}
