//! # Delivery Assignment Model
//!
//! One unit of work for one shipper: an ordered bundle of parcels that all
//! share a single delivery address. Assignments are never deleted, only
//! terminated (Completed/Failed).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::AssignmentStatus;

/// A bundle of co-addressed parcels routed to one shipper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAssignment {
    pub assignment_id: Uuid,
    pub shipper_id: Uuid,
    /// Shared address of every parcel in the bundle (creation invariant)
    pub delivery_address_id: Uuid,
    pub parcel_ids: Vec<Uuid>,
    pub status: AssignmentStatus,
    /// Owning session once the shipper starts working
    pub session_id: Option<Uuid>,
    /// Position within the shipper's solved route; manual assignments get 0
    pub sequence: i32,
    pub accepted_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub terminated_at: Option<DateTime<Utc>>,
    pub fail_reason: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryAssignment {
    /// Create a Pending assignment for a shipper over the given parcels.
    pub fn new(
        shipper_id: Uuid,
        delivery_address_id: Uuid,
        parcel_ids: Vec<Uuid>,
        sequence: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            assignment_id: Uuid::new_v4(),
            shipper_id,
            delivery_address_id,
            parcel_ids,
            status: AssignmentStatus::Pending,
            session_id: None,
            sequence,
            accepted_at: None,
            started_at: None,
            terminated_at: None,
            fail_reason: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn parcel_count(&self) -> usize {
        self.parcel_ids.len()
    }
}
