//! # Session Lifecycle Manager
//!
//! Owns session creation and closure, and is the only writer of session
//! counters. Closing a session cascades to its assignments and parcels as
//! one store commit: either every child update and the session status land
//! together, or none do. Events are published only after the commit.

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::errors::{OrchestrationError, OrchestrationResult};
use crate::events::{DispatchEvent, EventPublisher};
use crate::models::{DeliveryAssignment, DeliverySession};
use crate::state_machine::{
    assignment as assignment_sm, parcel as parcel_sm, session as session_sm, AssignmentEvent,
    AssignmentStatus, ParcelEvent, ParcelStatus, SessionEvent, SessionStatus,
};
use crate::storage::DispatchStore;

/// Outcome of one assignment inside a session, used for counter updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed,
    Failed,
    Delayed,
}

/// Manager for the session state machine and its cascades.
pub struct SessionLifecycleManager {
    store: Arc<dyn DispatchStore>,
    publisher: EventPublisher,
}

impl SessionLifecycleManager {
    pub fn new(store: Arc<dyn DispatchStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Fold a task outcome into the session counters, promoting a freshly
    /// created session to in-progress on its first recorded activity.
    ///
    /// This is the single place session counters are written; the
    /// assignment manager includes the updated session in its own commit
    /// unit.
    pub fn record_task_outcome(
        session: &mut DeliverySession,
        outcome: TaskOutcome,
    ) -> OrchestrationResult<()> {
        if session.status == SessionStatus::Created {
            session.status = session_sm::transition(session.status, &SessionEvent::Start)
                .map_err(OrchestrationError::invalid_state("session"))?;
        }
        match outcome {
            TaskOutcome::Completed => session.completed_tasks += 1,
            TaskOutcome::Failed => session.failed_tasks += 1,
            TaskOutcome::Delayed => session.delayed_tasks += 1,
        }
        Ok(())
    }

    /// Create a session for a shipper over the given assignments.
    ///
    /// Every assignment must belong to the shipper, be unbound, and be in a
    /// bindable state (Pending/Accepted); each is started into the session
    /// and its parcels advance to on-route. The whole unit commits together
    /// with the one-active-session uniqueness check.
    pub async fn create_session(
        &self,
        shipper_id: Uuid,
        assignment_ids: &[Uuid],
    ) -> OrchestrationResult<DeliverySession> {
        if assignment_ids.is_empty() {
            return Err(OrchestrationError::validation("assignment list is empty"));
        }
        let mut unique = assignment_ids.to_vec();
        unique.sort();
        unique.dedup();
        if unique.len() != assignment_ids.len() {
            return Err(OrchestrationError::validation(
                "assignment list contains duplicates",
            ));
        }

        // Existence check; also keeps foreign ids out of sessions
        self.store.get_shipper(shipper_id).await?;

        let now = Utc::now();
        let session = DeliverySession::open(shipper_id, assignment_ids.len() as i32);

        let mut assignments = Vec::with_capacity(assignment_ids.len());
        let mut parcels = Vec::new();

        for assignment_id in assignment_ids {
            let mut assignment = self.store.get_assignment(*assignment_id).await?;
            if assignment.shipper_id != shipper_id {
                return Err(OrchestrationError::validation(format!(
                    "assignment {assignment_id} does not belong to shipper {shipper_id}"
                )));
            }
            if assignment.session_id.is_some() {
                return Err(OrchestrationError::validation(format!(
                    "assignment {assignment_id} is already bound to a session"
                )));
            }

            assignment.status =
                assignment_sm::transition(assignment.status, &AssignmentEvent::Start)
                    .map_err(OrchestrationError::invalid_state("assignment"))?;
            assignment.session_id = Some(session.session_id);
            assignment.started_at = Some(now);

            for parcel_id in &assignment.parcel_ids {
                let mut parcel = self.store.get_parcel(*parcel_id).await?;
                parcel.status = parcel_sm::transition(parcel.status, &ParcelEvent::ScanQr)
                    .map_err(OrchestrationError::invalid_state("parcel"))?;
                parcels.push(parcel);
            }

            assignments.push(assignment);
        }

        self.store
            .create_session_with_bindings(&session, &assignments, &parcels)
            .await?;

        info!(
            session_id = %session.session_id,
            shipper_id = %shipper_id,
            assignments = assignments.len(),
            parcels = parcels.len(),
            "session created"
        );

        Ok(session)
    }

    /// Complete a session, cascading terminal handling to its assignments
    /// and parcels.
    ///
    /// Idempotent: completing an already-terminal session is a no-op that
    /// returns the stored session without touching counters or publishing
    /// events.
    pub async fn complete_session(
        &self,
        session_id: Uuid,
    ) -> OrchestrationResult<DeliverySession> {
        let session = self.store.get_session(session_id).await?;
        if session.status.is_terminal() {
            info!(session_id = %session_id, status = %session.status, "session already terminal, complete is a no-op");
            return Ok(session);
        }
        self.close(session, SessionEvent::Complete, None).await
    }

    /// Fail a session with an audit reason, cascading the same terminal
    /// handling as completion. Idempotent on terminal sessions.
    pub async fn fail_session(
        &self,
        session_id: Uuid,
        reason: impl Into<String>,
    ) -> OrchestrationResult<DeliverySession> {
        let session = self.store.get_session(session_id).await?;
        if session.status.is_terminal() {
            info!(session_id = %session_id, status = %session.status, "session already terminal, fail is a no-op");
            return Ok(session);
        }
        let reason = reason.into();
        self.close(session, SessionEvent::Fail(reason.clone()), Some(reason))
            .await
    }

    async fn close(
        &self,
        mut session: DeliverySession,
        event: SessionEvent,
        fail_reason: Option<String>,
    ) -> OrchestrationResult<DeliverySession> {
        let now = Utc::now();
        session.status = session_sm::transition(session.status, &event)
            .map_err(OrchestrationError::invalid_state("session"))?;
        session.ended_at = Some(now);
        session.fail_reason = fail_reason;

        let assignments = self
            .store
            .list_assignments_by_session(session.session_id)
            .await?;

        let mut changed_assignments = Vec::new();
        let mut changed_parcels = Vec::new();
        let mut parcel_ids = Vec::new();
        let mut receiver_ids = Vec::new();
        let mut completed = 0;

        for assignment in &assignments {
            let mut assignment = assignment.clone();
            parcel_ids.extend(assignment.parcel_ids.iter().copied());

            if assignment.status.is_terminal() {
                if assignment.status == AssignmentStatus::Completed {
                    completed += 1;
                }
                self.collect_receivers(&assignment, &mut receiver_ids).await;
                continue;
            }

            // Undelivered work is failed, never left dangling. A single
            // assignment's bad state is logged and skipped rather than
            // aborting the whole close.
            match assignment_sm::transition(
                assignment.status,
                &AssignmentEvent::fail_with_reason("session closed before completion"),
            ) {
                Ok(next) => assignment.status = next,
                Err(e) => {
                    warn!(
                        assignment_id = %assignment.assignment_id,
                        error = %e,
                        "skipping assignment during session close"
                    );
                    continue;
                }
            }
            assignment.terminated_at = Some(now);
            assignment.fail_reason = Some("session closed before completion".to_string());

            for parcel_id in &assignment.parcel_ids {
                let mut parcel = self.store.get_parcel(*parcel_id).await?;
                receiver_ids.push(parcel.receiver_id);
                match parcel.status {
                    ParcelStatus::OnRoute => {
                        parcel.status =
                            parcel_sm::transition(parcel.status, &ParcelEvent::CanNotDeliver)
                                .map_err(OrchestrationError::invalid_state("parcel"))?;
                        changed_parcels.push(parcel);
                    }
                    ParcelStatus::Delayed => {
                        parcel.status =
                            parcel_sm::transition(parcel.status, &ParcelEvent::EndSession)
                                .map_err(OrchestrationError::invalid_state("parcel"))?;
                        parcel.assignment_id = None;
                        changed_parcels.push(parcel);
                    }
                    ParcelStatus::InWarehouse => {
                        // Assignment never started; release the parcel
                        parcel.assignment_id = None;
                        changed_parcels.push(parcel);
                    }
                    _ => {}
                }
            }

            changed_assignments.push(assignment);
        }

        // Postponed tasks were already counted when they happened; the
        // remainder of the unfinished work is failed.
        session.completed_tasks = completed;
        session.failed_tasks = session.total_tasks - completed - session.delayed_tasks;

        self.store
            .commit_cascade(Some(&session), &changed_assignments, &changed_parcels)
            .await?;

        info!(
            session_id = %session.session_id,
            status = %session.status,
            completed = session.completed_tasks,
            failed = session.failed_tasks,
            delayed = session.delayed_tasks,
            "session closed"
        );

        if matches!(event, SessionEvent::Complete) {
            receiver_ids.sort();
            receiver_ids.dedup();
            self.publisher.publish(DispatchEvent::SessionCompleted {
                session_id: session.session_id,
                delivery_man_id: session.shipper_id,
                started_at: session.started_at,
                ended_at: now,
                total_tasks: session.total_tasks,
                completed_tasks: session.completed_tasks,
                failed_tasks: session.failed_tasks,
                delayed_tasks: session.delayed_tasks,
                parcel_ids,
                receiver_ids,
            });
        }

        match self.store.get_session(session.session_id).await {
            Ok(stored) => Ok(stored),
            Err(e) => {
                error!(session_id = %session.session_id, error = %e, "re-read after close failed");
                Err(e.into())
            }
        }
    }

    async fn collect_receivers(&self, assignment: &DeliveryAssignment, out: &mut Vec<Uuid>) {
        for parcel_id in &assignment.parcel_ids {
            match self.store.get_parcel(*parcel_id).await {
                Ok(parcel) => out.push(parcel.receiver_id),
                Err(e) => warn!(parcel_id = %parcel_id, error = %e, "parcel lookup failed during close"),
            }
        }
    }
}
