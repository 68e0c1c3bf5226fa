//! # In-Memory Store
//!
//! HashMap-backed implementation of [`DispatchStore`] used by the test
//! suites and local development. A single `parking_lot` lock over the whole
//! dataset makes every grouped commit atomic; version checks mirror the
//! Postgres store so concurrency bugs show up in tests too.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};
use super::DispatchStore;
use crate::models::{DeliveryAssignment, DeliverySession, Parcel, ShipperProfile};

#[derive(Default)]
struct Dataset {
    parcels: HashMap<Uuid, Parcel>,
    assignments: HashMap<Uuid, DeliveryAssignment>,
    sessions: HashMap<Uuid, DeliverySession>,
    shippers: HashMap<Uuid, ShipperProfile>,
}

impl Dataset {
    /// Version-check a parcel write without applying it.
    fn check_parcel(&self, parcel: &Parcel) -> StorageResult<()> {
        match self.parcels.get(&parcel.parcel_id) {
            Some(stored) if stored.version == parcel.version => Ok(()),
            Some(_) => Err(StorageError::conflict("parcel", parcel.parcel_id)),
            None => Err(StorageError::not_found("parcel", parcel.parcel_id)),
        }
    }

    fn check_assignment(&self, assignment: &DeliveryAssignment) -> StorageResult<()> {
        match self.assignments.get(&assignment.assignment_id) {
            Some(stored) if stored.version == assignment.version => Ok(()),
            Some(_) => Err(StorageError::conflict(
                "assignment",
                assignment.assignment_id,
            )),
            None => Err(StorageError::not_found(
                "assignment",
                assignment.assignment_id,
            )),
        }
    }

    fn check_session(&self, session: &DeliverySession) -> StorageResult<()> {
        match self.sessions.get(&session.session_id) {
            Some(stored) if stored.version == session.version => Ok(()),
            Some(_) => Err(StorageError::conflict("session", session.session_id)),
            None => Err(StorageError::not_found("session", session.session_id)),
        }
    }

    fn apply_parcel(&mut self, parcel: &Parcel) {
        let mut next = parcel.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        self.parcels.insert(next.parcel_id, next);
    }

    fn apply_assignment(&mut self, assignment: &DeliveryAssignment) {
        let mut next = assignment.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        self.assignments.insert(next.assignment_id, next);
    }

    fn apply_session(&mut self, session: &DeliverySession) {
        let mut next = session.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        self.sessions.insert(next.session_id, next);
    }
}

/// In-memory [`DispatchStore`] implementation.
#[derive(Default)]
pub struct InMemoryStore {
    data: RwLock<Dataset>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DispatchStore for InMemoryStore {
    async fn get_parcel(&self, parcel_id: Uuid) -> StorageResult<Parcel> {
        self.data
            .read()
            .parcels
            .get(&parcel_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("parcel", parcel_id))
    }

    async fn insert_parcel(&self, parcel: &Parcel) -> StorageResult<()> {
        self.data
            .write()
            .parcels
            .insert(parcel.parcel_id, parcel.clone());
        Ok(())
    }

    async fn list_unassigned_parcels(&self) -> StorageResult<Vec<Parcel>> {
        let mut parcels: Vec<Parcel> = self
            .data
            .read()
            .parcels
            .values()
            .filter(|p| p.is_unassigned())
            .cloned()
            .collect();
        parcels.sort_by_key(|p| p.created_at);
        Ok(parcels)
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> StorageResult<DeliveryAssignment> {
        self.data
            .read()
            .assignments
            .get(&assignment_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("assignment", assignment_id))
    }

    async fn find_assignment_by_parcel(
        &self,
        parcel_id: Uuid,
    ) -> StorageResult<Option<DeliveryAssignment>> {
        let data = self.data.read();
        let assignment_id = match data.parcels.get(&parcel_id) {
            Some(parcel) => parcel.assignment_id,
            None => return Err(StorageError::not_found("parcel", parcel_id)),
        };
        Ok(assignment_id.and_then(|id| data.assignments.get(&id).cloned()))
    }

    async fn list_assignments_by_session(
        &self,
        session_id: Uuid,
    ) -> StorageResult<Vec<DeliveryAssignment>> {
        let mut assignments: Vec<DeliveryAssignment> = self
            .data
            .read()
            .assignments
            .values()
            .filter(|a| a.session_id == Some(session_id))
            .cloned()
            .collect();
        assignments.sort_by_key(|a| a.sequence);
        Ok(assignments)
    }

    async fn get_session(&self, session_id: Uuid) -> StorageResult<DeliverySession> {
        self.data
            .read()
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("session", session_id))
    }

    async fn find_active_session(
        &self,
        shipper_id: Uuid,
    ) -> StorageResult<Option<DeliverySession>> {
        Ok(self
            .data
            .read()
            .sessions
            .values()
            .find(|s| s.shipper_id == shipper_id && !s.status.is_terminal())
            .cloned())
    }

    async fn list_open_sessions_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<Vec<DeliverySession>> {
        let mut sessions: Vec<DeliverySession> = self
            .data
            .read()
            .sessions
            .values()
            .filter(|s| !s.status.is_terminal() && s.started_at >= from && s.started_at <= to)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.started_at);
        Ok(sessions)
    }

    async fn get_shipper(&self, shipper_id: Uuid) -> StorageResult<ShipperProfile> {
        self.data
            .read()
            .shippers
            .get(&shipper_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("shipper", shipper_id))
    }

    async fn list_available_shippers(&self) -> StorageResult<Vec<ShipperProfile>> {
        let mut shippers: Vec<ShipperProfile> = self
            .data
            .read()
            .shippers
            .values()
            .filter(|s| s.available)
            .cloned()
            .collect();
        shippers.sort_by_key(|s| s.shipper_id);
        Ok(shippers)
    }

    async fn upsert_shipper(&self, profile: &ShipperProfile) -> StorageResult<()> {
        self.data
            .write()
            .shippers
            .insert(profile.shipper_id, profile.clone());
        Ok(())
    }

    async fn create_assignments_with_parcels(
        &self,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut data = self.data.write();
        for parcel in parcels {
            data.check_parcel(parcel)?;
        }
        for assignment in assignments {
            data.assignments
                .insert(assignment.assignment_id, assignment.clone());
        }
        for parcel in parcels {
            data.apply_parcel(parcel);
        }
        Ok(())
    }

    async fn create_session_with_bindings(
        &self,
        session: &DeliverySession,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut data = self.data.write();

        if let Some(existing) = data
            .sessions
            .values()
            .find(|s| s.shipper_id == session.shipper_id && !s.status.is_terminal())
        {
            return Err(StorageError::ActiveSessionExists {
                shipper_id: session.shipper_id,
                session_id: existing.session_id,
            });
        }

        for assignment in assignments {
            data.check_assignment(assignment)?;
        }
        for parcel in parcels {
            data.check_parcel(parcel)?;
        }

        data.sessions.insert(session.session_id, session.clone());
        for assignment in assignments {
            data.apply_assignment(assignment);
        }
        for parcel in parcels {
            data.apply_parcel(parcel);
        }
        Ok(())
    }

    async fn commit_cascade(
        &self,
        session: Option<&DeliverySession>,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut data = self.data.write();

        if let Some(session) = session {
            data.check_session(session)?;
        }
        for assignment in assignments {
            data.check_assignment(assignment)?;
        }
        for parcel in parcels {
            data.check_parcel(parcel)?;
        }

        if let Some(session) = session {
            data.apply_session(session);
        }
        for assignment in assignments {
            data.apply_assignment(assignment);
        }
        for parcel in parcels {
            data.apply_parcel(parcel);
        }
        Ok(())
    }
}
