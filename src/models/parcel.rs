//! # Parcel Model
//!
//! A parcel is a physical shipment item tracked through delivery states.
//! Status is mutated exclusively through the parcel state machine; the
//! model itself carries no transition logic.
//!
//! ## Database Schema
//!
//! Maps to `dispatch_parcels`:
//! - `parcel_id`: Primary key (UUID)
//! - `status`: Current lifecycle state (TEXT)
//! - `delivery_address_id`: Address grouping key for assignments
//! - `assignment_id`: Back-reference to the owning assignment, if bound
//! - `version`: Optimistic-lock counter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::ParcelStatus;

/// A tracked shipment item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub parcel_id: Uuid,
    /// Human-facing tracking code printed on the label
    pub code: String,
    pub status: ParcelStatus,
    pub delivery_address_id: Uuid,
    pub zone_id: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub receiver_phone: String,
    /// Delivery location
    pub lat: f64,
    pub lon: f64,
    /// Urgency tier; 0 is the most urgent
    pub priority: i32,
    /// Estimated handling time at the door, in seconds
    pub service_time_secs: i64,
    /// Owning assignment while bound to one
    pub assignment_id: Option<Uuid>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input payload for parcel intake.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewParcel {
    pub code: String,
    pub delivery_address_id: Uuid,
    pub zone_id: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub lat: f64,
    pub lon: f64,
    pub priority: i32,
    pub service_time_secs: i64,
}

impl Parcel {
    /// Materialize an intake payload as a warehouse parcel.
    pub fn from_intake(new: NewParcel) -> Self {
        let now = Utc::now();
        Self {
            parcel_id: Uuid::new_v4(),
            code: new.code,
            status: ParcelStatus::InWarehouse,
            delivery_address_id: new.delivery_address_id,
            zone_id: new.zone_id,
            receiver_id: new.receiver_id,
            receiver_name: new.receiver_name,
            receiver_phone: new.receiver_phone,
            lat: new.lat,
            lon: new.lon,
            priority: new.priority,
            service_time_secs: new.service_time_secs,
            assignment_id: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the parcel is free to be picked up by a new assignment.
    pub fn is_unassigned(&self) -> bool {
        self.assignment_id.is_none() && self.status.is_assignable()
    }
}
