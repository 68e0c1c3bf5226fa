//! # Delivery Session Model
//!
//! One shipper's bounded working window. The session lifecycle manager is
//! the only writer of the task counters; at most one non-terminal session
//! exists per shipper at a time, enforced at creation inside the store
//! commit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::SessionStatus;

/// A shipper's active working window over a set of assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySession {
    pub session_id: Uuid,
    pub shipper_id: Uuid,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub total_tasks: i32,
    pub completed_tasks: i32,
    pub failed_tasks: i32,
    pub delayed_tasks: i32,
    pub fail_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliverySession {
    /// Open a session for a shipper covering `total_tasks` assignments.
    pub fn open(shipper_id: Uuid, total_tasks: i32) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4(),
            shipper_id,
            status: SessionStatus::Created,
            started_at: now,
            ended_at: None,
            total_tasks,
            completed_tasks: 0,
            failed_tasks: 0,
            delayed_tasks: 0,
            fail_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Tasks neither completed nor failed nor delayed yet.
    pub fn open_tasks(&self) -> i32 {
        self.total_tasks - self.completed_tasks - self.failed_tasks - self.delayed_tasks
    }
}

/// Shipper master data consumed by assignment and session flows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShipperProfile {
    pub shipper_id: Uuid,
    pub name: String,
    /// Current position, the route origin for auto-assignment
    pub lat: f64,
    pub lon: f64,
    pub shift_start: DateTime<Utc>,
    /// Longest a session may run, in minutes
    pub max_session_minutes: i64,
    /// Maximum parcel count across the shipper's open assignments
    pub capacity: i32,
    /// Working zones in priority order; empty means unconstrained
    pub working_zones: Vec<String>,
    pub available: bool,
}

impl ShipperProfile {
    /// Whether the shipper may be offered orders from the given zone.
    pub fn serves_zone(&self, zone_id: &str) -> bool {
        self.working_zones.is_empty() || self.working_zones.iter().any(|z| z == zone_id)
    }
}
