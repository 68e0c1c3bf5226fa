//! VRP input and output types for the auto-assignment engine.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Parcel, ShipperProfile};
use crate::routing::Coordinate;

/// Transient VRP view of an available shipper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipper {
    pub shipper_id: Uuid,
    /// Route origin
    pub start: Coordinate,
    pub shift_start: DateTime<Utc>,
    pub max_session_minutes: i64,
    /// Maximum parcel count over the whole shift
    pub capacity: i32,
    /// Working zones in priority order; empty means unconstrained
    pub working_zones: Vec<String>,
}

impl Shipper {
    pub fn from_profile(profile: &ShipperProfile) -> Self {
        Self {
            shipper_id: profile.shipper_id,
            start: Coordinate::new(profile.lat, profile.lon),
            shift_start: profile.shift_start,
            max_session_minutes: profile.max_session_minutes,
            capacity: profile.capacity,
            working_zones: profile.working_zones.clone(),
        }
    }

    /// Latest instant any stop may still be scheduled.
    pub fn shift_end(&self) -> DateTime<Utc> {
        self.shift_start + Duration::minutes(self.max_session_minutes)
    }

    /// Whether the shipper may be offered orders from the given zone.
    pub fn serves_zone(&self, zone_id: &str) -> bool {
        self.working_zones.is_empty() || self.working_zones.iter().any(|z| z == zone_id)
    }
}

/// Transient VRP view of an unassigned parcel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub parcel_id: Uuid,
    pub location: Coordinate,
    /// Handling time at the door, in seconds
    pub service_time_secs: i64,
    /// 0 is the most urgent tier
    pub priority: i32,
    pub zone_id: String,
    pub delivery_address_id: Uuid,
}

impl Order {
    pub fn from_parcel(parcel: &Parcel) -> Self {
        Self {
            parcel_id: parcel.parcel_id,
            location: Coordinate::new(parcel.lat, parcel.lon),
            service_time_secs: parcel.service_time_secs,
            priority: parcel.priority,
            zone_id: parcel.zone_id.clone(),
            delivery_address_id: parcel.delivery_address_id,
        }
    }
}

/// One scheduled stop in a shipper's solved route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStop {
    pub parcel_id: Uuid,
    pub delivery_address_id: Uuid,
    /// 1-based position within the route
    pub sequence: i32,
    pub estimated_arrival: DateTime<Utc>,
    /// Travel seconds from the previous stop; 0 for co-addressed followers
    pub travel_secs: i64,
}

/// The ordered stop list solved for one shipper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipperRoute {
    pub shipper_id: Uuid,
    pub stops: Vec<TaskStop>,
}

impl ShipperRoute {
    pub fn parcel_count(&self) -> usize {
        self.stops.len()
    }
}

/// Aggregate statistics for a solve, used for balancing diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveStats {
    pub assigned_orders: usize,
    pub unassigned_orders: usize,
    /// Population variance of per-shipper parcel counts
    pub workload_variance: f64,
}

/// Full output of one auto-assignment solve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub routes: Vec<ShipperRoute>,
    /// Orders with no feasible placement; the caller decides what happens
    pub unassigned: Vec<Uuid>,
    pub stats: SolveStats,
}
