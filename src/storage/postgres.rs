//! # Postgres Store
//!
//! sqlx-backed implementation of [`DispatchStore`]. Grouped commits run in
//! a single transaction; every update is guarded by a `version` predicate
//! and a zero-row result is reported as a conflict (or a missing row when
//! the id itself is gone), never silently overwritten.
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE dispatch_parcels (
//!   parcel_id UUID PRIMARY KEY,
//!   code TEXT NOT NULL,
//!   status TEXT NOT NULL,
//!   delivery_address_id UUID NOT NULL,
//!   zone_id TEXT NOT NULL,
//!   receiver_id UUID NOT NULL,
//!   receiver_name TEXT NOT NULL,
//!   receiver_phone TEXT NOT NULL,
//!   lat DOUBLE PRECISION NOT NULL,
//!   lon DOUBLE PRECISION NOT NULL,
//!   priority INTEGER NOT NULL,
//!   service_time_secs BIGINT NOT NULL,
//!   assignment_id UUID,
//!   version BIGINT NOT NULL,
//!   created_at TIMESTAMPTZ NOT NULL,
//!   updated_at TIMESTAMPTZ NOT NULL
//! );
//! -- dispatch_assignments, dispatch_sessions and dispatch_shippers follow
//! -- the model structs the same way (parcel_ids UUID[], working_zones TEXT[]).
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};
use super::DispatchStore;
use crate::models::{DeliveryAssignment, DeliverySession, Parcel, ShipperProfile};

/// Postgres-backed [`DispatchStore`] implementation.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn update_parcel_tx(
        tx: &mut Transaction<'_, Postgres>,
        parcel: &Parcel,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE dispatch_parcels
            SET code = $1, status = $2, delivery_address_id = $3, zone_id = $4,
                receiver_id = $5, receiver_name = $6, receiver_phone = $7,
                lat = $8, lon = $9, priority = $10, service_time_secs = $11,
                assignment_id = $12, version = version + 1, updated_at = NOW()
            WHERE parcel_id = $13 AND version = $14
            "#,
        )
        .bind(&parcel.code)
        .bind(parcel.status)
        .bind(parcel.delivery_address_id)
        .bind(&parcel.zone_id)
        .bind(parcel.receiver_id)
        .bind(&parcel.receiver_name)
        .bind(&parcel.receiver_phone)
        .bind(parcel.lat)
        .bind(parcel.lon)
        .bind(parcel.priority)
        .bind(parcel.service_time_secs)
        .bind(parcel.assignment_id)
        .bind(parcel.parcel_id)
        .bind(parcel.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::conflict("parcel", parcel.parcel_id));
        }
        Ok(())
    }

    async fn update_assignment_tx(
        tx: &mut Transaction<'_, Postgres>,
        assignment: &DeliveryAssignment,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE dispatch_assignments
            SET status = $1, session_id = $2, sequence = $3, accepted_at = $4,
                started_at = $5, terminated_at = $6, fail_reason = $7,
                version = version + 1, updated_at = NOW()
            WHERE assignment_id = $8 AND version = $9
            "#,
        )
        .bind(assignment.status)
        .bind(assignment.session_id)
        .bind(assignment.sequence)
        .bind(assignment.accepted_at)
        .bind(assignment.started_at)
        .bind(assignment.terminated_at)
        .bind(&assignment.fail_reason)
        .bind(assignment.assignment_id)
        .bind(assignment.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::conflict(
                "assignment",
                assignment.assignment_id,
            ));
        }
        Ok(())
    }

    async fn update_session_tx(
        tx: &mut Transaction<'_, Postgres>,
        session: &DeliverySession,
    ) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE dispatch_sessions
            SET status = $1, ended_at = $2, total_tasks = $3, completed_tasks = $4,
                failed_tasks = $5, delayed_tasks = $6, fail_reason = $7,
                version = version + 1, updated_at = NOW()
            WHERE session_id = $8 AND version = $9
            "#,
        )
        .bind(session.status)
        .bind(session.ended_at)
        .bind(session.total_tasks)
        .bind(session.completed_tasks)
        .bind(session.failed_tasks)
        .bind(session.delayed_tasks)
        .bind(&session.fail_reason)
        .bind(session.session_id)
        .bind(session.version)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::conflict("session", session.session_id));
        }
        Ok(())
    }

    async fn insert_assignment_tx(
        tx: &mut Transaction<'_, Postgres>,
        assignment: &DeliveryAssignment,
    ) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatch_assignments
              (assignment_id, shipper_id, delivery_address_id, parcel_ids, status,
               session_id, sequence, accepted_at, started_at, terminated_at,
               fail_reason, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(assignment.assignment_id)
        .bind(assignment.shipper_id)
        .bind(assignment.delivery_address_id)
        .bind(&assignment.parcel_ids)
        .bind(assignment.status)
        .bind(assignment.session_id)
        .bind(assignment.sequence)
        .bind(assignment.accepted_at)
        .bind(assignment.started_at)
        .bind(assignment.terminated_at)
        .bind(&assignment.fail_reason)
        .bind(assignment.version)
        .bind(assignment.created_at)
        .bind(assignment.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DispatchStore for PgStore {
    async fn get_parcel(&self, parcel_id: Uuid) -> StorageResult<Parcel> {
        sqlx::query_as::<_, Parcel>("SELECT * FROM dispatch_parcels WHERE parcel_id = $1")
            .bind(parcel_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::not_found("parcel", parcel_id))
    }

    async fn insert_parcel(&self, parcel: &Parcel) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatch_parcels
              (parcel_id, code, status, delivery_address_id, zone_id, receiver_id,
               receiver_name, receiver_phone, lat, lon, priority, service_time_secs,
               assignment_id, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(parcel.parcel_id)
        .bind(&parcel.code)
        .bind(parcel.status)
        .bind(parcel.delivery_address_id)
        .bind(&parcel.zone_id)
        .bind(parcel.receiver_id)
        .bind(&parcel.receiver_name)
        .bind(&parcel.receiver_phone)
        .bind(parcel.lat)
        .bind(parcel.lon)
        .bind(parcel.priority)
        .bind(parcel.service_time_secs)
        .bind(parcel.assignment_id)
        .bind(parcel.version)
        .bind(parcel.created_at)
        .bind(parcel.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_unassigned_parcels(&self) -> StorageResult<Vec<Parcel>> {
        let parcels = sqlx::query_as::<_, Parcel>(
            r#"
            SELECT * FROM dispatch_parcels
            WHERE assignment_id IS NULL AND status = 'in_warehouse'
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(parcels)
    }

    async fn get_assignment(&self, assignment_id: Uuid) -> StorageResult<DeliveryAssignment> {
        sqlx::query_as::<_, DeliveryAssignment>(
            "SELECT * FROM dispatch_assignments WHERE assignment_id = $1",
        )
        .bind(assignment_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("assignment", assignment_id))
    }

    async fn find_assignment_by_parcel(
        &self,
        parcel_id: Uuid,
    ) -> StorageResult<Option<DeliveryAssignment>> {
        let parcel = self.get_parcel(parcel_id).await?;
        match parcel.assignment_id {
            Some(assignment_id) => Ok(Some(self.get_assignment(assignment_id).await?)),
            None => Ok(None),
        }
    }

    async fn list_assignments_by_session(
        &self,
        session_id: Uuid,
    ) -> StorageResult<Vec<DeliveryAssignment>> {
        let assignments = sqlx::query_as::<_, DeliveryAssignment>(
            "SELECT * FROM dispatch_assignments WHERE session_id = $1 ORDER BY sequence",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(assignments)
    }

    async fn get_session(&self, session_id: Uuid) -> StorageResult<DeliverySession> {
        sqlx::query_as::<_, DeliverySession>(
            "SELECT * FROM dispatch_sessions WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("session", session_id))
    }

    async fn find_active_session(
        &self,
        shipper_id: Uuid,
    ) -> StorageResult<Option<DeliverySession>> {
        let session = sqlx::query_as::<_, DeliverySession>(
            r#"
            SELECT * FROM dispatch_sessions
            WHERE shipper_id = $1 AND status IN ('created', 'in_progress')
            "#,
        )
        .bind(shipper_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    async fn list_open_sessions_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StorageResult<Vec<DeliverySession>> {
        let sessions = sqlx::query_as::<_, DeliverySession>(
            r#"
            SELECT * FROM dispatch_sessions
            WHERE status IN ('created', 'in_progress')
              AND started_at >= $1 AND started_at <= $2
            ORDER BY started_at
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(sessions)
    }

    async fn get_shipper(&self, shipper_id: Uuid) -> StorageResult<ShipperProfile> {
        sqlx::query_as::<_, ShipperProfile>(
            "SELECT * FROM dispatch_shippers WHERE shipper_id = $1",
        )
        .bind(shipper_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::not_found("shipper", shipper_id))
    }

    async fn list_available_shippers(&self) -> StorageResult<Vec<ShipperProfile>> {
        let shippers = sqlx::query_as::<_, ShipperProfile>(
            "SELECT * FROM dispatch_shippers WHERE available ORDER BY shipper_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(shippers)
    }

    async fn upsert_shipper(&self, profile: &ShipperProfile) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dispatch_shippers
              (shipper_id, name, lat, lon, shift_start, max_session_minutes,
               capacity, working_zones, available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (shipper_id) DO UPDATE SET
              name = EXCLUDED.name, lat = EXCLUDED.lat, lon = EXCLUDED.lon,
              shift_start = EXCLUDED.shift_start,
              max_session_minutes = EXCLUDED.max_session_minutes,
              capacity = EXCLUDED.capacity,
              working_zones = EXCLUDED.working_zones,
              available = EXCLUDED.available
            "#,
        )
        .bind(profile.shipper_id)
        .bind(&profile.name)
        .bind(profile.lat)
        .bind(profile.lon)
        .bind(profile.shift_start)
        .bind(profile.max_session_minutes)
        .bind(profile.capacity)
        .bind(&profile.working_zones)
        .bind(profile.available)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_assignments_with_parcels(
        &self,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        for assignment in assignments {
            Self::insert_assignment_tx(&mut tx, assignment).await?;
        }
        for parcel in parcels {
            Self::update_parcel_tx(&mut tx, parcel).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn create_session_with_bindings(
        &self,
        session: &DeliverySession,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        // Uniqueness check under the same transaction; the shipper row lock
        // serializes two concurrent creations for the same shipper.
        let existing = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT session_id FROM dispatch_sessions
            WHERE shipper_id = $1 AND status IN ('created', 'in_progress')
            FOR UPDATE
            "#,
        )
        .bind(session.shipper_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(session_id) = existing {
            return Err(StorageError::ActiveSessionExists {
                shipper_id: session.shipper_id,
                session_id,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO dispatch_sessions
              (session_id, shipper_id, status, started_at, ended_at, total_tasks,
               completed_tasks, failed_tasks, delayed_tasks, fail_reason, version,
               created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(session.session_id)
        .bind(session.shipper_id)
        .bind(session.status)
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(session.total_tasks)
        .bind(session.completed_tasks)
        .bind(session.failed_tasks)
        .bind(session.delayed_tasks)
        .bind(&session.fail_reason)
        .bind(session.version)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&mut *tx)
        .await?;

        for assignment in assignments {
            Self::update_assignment_tx(&mut tx, assignment).await?;
        }
        for parcel in parcels {
            Self::update_parcel_tx(&mut tx, parcel).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn commit_cascade(
        &self,
        session: Option<&DeliverySession>,
        assignments: &[DeliveryAssignment],
        parcels: &[Parcel],
    ) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(session) = session {
            Self::update_session_tx(&mut tx, session).await?;
        }
        for assignment in assignments {
            Self::update_assignment_tx(&mut tx, assignment).await?;
        }
        for parcel in parcels {
            Self::update_parcel_tx(&mut tx, parcel).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
