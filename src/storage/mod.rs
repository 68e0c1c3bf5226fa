//! # Storage Layer
//!
//! Persistence behind a trait so the orchestration managers stay testable
//! against the in-memory store while production runs on Postgres.
//!
//! ## Consistency model
//!
//! Every entity row carries a `version` counter. Single-entity updates are
//! optimistic read-modify-write: the store compares the caller's version
//! with the stored one and fails with [`StorageError::Conflict`] on a lost
//! race, never silently overwriting. Multi-entity cascades (assignment
//! creation with parcel bindings, session create/close) go through grouped
//! commit methods that are one transaction in Postgres and one lock
//! acquisition in memory, so either every child update lands or none do.
//! The one-active-session-per-shipper uniqueness check runs inside the
//! session creation commit.

pub mod errors;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{DeliveryAssignment, DeliverySession, Parcel, ShipperProfile};

pub use errors::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Persistence contract for the dispatch core.
#[async_trait]
pub trait DispatchStore: Send + Sync {
    // --- parcels ---

    async fn get_parcel(&self, parcel_id: Uuid) -> StorageResult<Parcel>;

    async fn insert_parcel(&self, parcel: &Parcel) -> StorageResult<()>;

    /// List parcels eligible for auto-assignment: in the warehouse with no
    /// live assignment binding.
    async fn list_unassigned_parcels(&self) -> StorageResult<Vec<Parcel>>;

    // --- assignments ---

    async fn get_assignment(&self, assignment_id: Uuid) -> StorageResult<DeliveryAssignment>;

    /// Resolve the assignment currently bound to a parcel, if any.
    async fn find_assignment_by_parcel(
        &self,
        parcel_id: Uuid,
    ) -> StorageResult<Option<DeliveryAssignment>>;

    async fn list_assignments_by_session(
        &self,
        session_id: Uuid,
    ) -> StorageResult<Vec<DeliveryAssignment>>;

    // --- sessions ---

    async fn get_session(&self, session_id: Uuid) -> StorageResult<DeliverySession>;

    /// The shipper's non-terminal session, if one exists.
    async fn find_active_session(&self, shipper_id: Uuid)
        -> StorageResult<Option<DeliverySession>>;

    /// Non-terminal sessions whose start time falls inside the window.
    async fn list_open_sessions_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<Vec<DeliverySession>>;

    // --- shippers ---

    async fn get_shipper(&self, shipper_id: Uuid) -> StorageResult<ShipperProfile>;

    async fn list_available_shippers(&self) -> StorageResult<Vec<ShipperProfile>>;

    async fn upsert_shipper(&self, profile: &ShipperProfile) -> StorageResult<()>;

    // --- grouped commits ---

    /// Insert new assignments and bind their parcels in one unit, so a
    /// solved auto-assignment plan is applied fully or not at all. Parcel
    /// updates are version-checked; any conflict rolls the whole unit back.
    async fn create_assignments_with_parcels(
        &self,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()>;

    /// Insert a new session and persist the started assignments and their
    /// parcels in one unit. Fails with
    /// [`StorageError::ActiveSessionExists`] when the shipper already has a
    /// non-terminal session; the check runs inside the same unit to close
    /// the race between two concurrent creations.
    async fn create_session_with_bindings(
        &self,
        session: &DeliverySession,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()>;

    /// Version-checked update of a session (optional), assignments and
    /// parcels as one unit. Used for task transitions and session close
    /// cascades.
    async fn commit_cascade(
        &self,
        session: Option<&DeliverySession>,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()>;
}
