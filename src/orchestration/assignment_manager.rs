//! # Assignment Manager
//!
//! Creates assignments (manual and auto paths) and drives assignment task
//! transitions. Every transition validates the current state through the
//! assignment state machine before mutating, fires the matching parcel
//! events, folds the outcome into the owning session's counters, and
//! commits the whole unit atomically. Events publish after the commit.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::errors::{OrchestrationError, OrchestrationResult};
use super::session_manager::{SessionLifecycleManager, TaskOutcome};
use crate::events::{DispatchEvent, EventPublisher};
use crate::models::{DeliveryAssignment, Parcel, ShipperProfile};
use crate::routing::{SolverMode, VehicleProfile};
use crate::solver::{AutoAssignmentEngine, Order, Shipper, SolveStats};
use crate::state_machine::{
    assignment as assignment_sm, parcel as parcel_sm, session as session_sm, AssignmentEvent,
    ParcelEvent, ParcelStatus, SessionEvent, SessionStatus,
};
use crate::storage::DispatchStore;

/// Result of applying an auto-assignment solve.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAssignmentOutcome {
    pub assignments: Vec<DeliveryAssignment>,
    /// Orders with no feasible placement; left for the caller to retry,
    /// escalate, or leave for the next sweep
    pub unassigned_orders: Vec<Uuid>,
    pub stats: SolveStats,
}

/// Manager for assignment creation and task transitions.
pub struct AssignmentManager {
    store: Arc<dyn DispatchStore>,
    engine: AutoAssignmentEngine,
    publisher: EventPublisher,
}

impl AssignmentManager {
    pub fn new(
        store: Arc<dyn DispatchStore>,
        engine: AutoAssignmentEngine,
        publisher: EventPublisher,
    ) -> Self {
        Self {
            store,
            engine,
            publisher,
        }
    }

    /// Create a manual assignment of the given parcels to a shipper.
    ///
    /// Fails validation when the list is empty or contains duplicates, when
    /// any parcel is bound to a non-terminal assignment, when the parcels
    /// do not share one delivery address, or when a supplied zone falls
    /// outside the shipper's working zones. Parcel status is untouched
    /// until the assignment is started inside a session.
    pub async fn create_manual(
        &self,
        shipper_id: Uuid,
        parcel_ids: &[Uuid],
        zone_id: Option<&str>,
    ) -> OrchestrationResult<DeliveryAssignment> {
        if parcel_ids.is_empty() {
            return Err(OrchestrationError::validation("parcel list is empty"));
        }
        let unique: HashSet<Uuid> = parcel_ids.iter().copied().collect();
        if unique.len() != parcel_ids.len() {
            return Err(OrchestrationError::validation(
                "parcel list contains duplicates",
            ));
        }

        let shipper = self.store.get_shipper(shipper_id).await?;

        let mut parcels = Vec::with_capacity(parcel_ids.len());
        for parcel_id in parcel_ids {
            let parcel = self.store.get_parcel(*parcel_id).await?;
            if let Some(bound_to) = parcel.assignment_id {
                let existing = self.store.get_assignment(bound_to).await?;
                if !existing.status.is_terminal() {
                    return Err(OrchestrationError::validation(format!(
                        "parcel {parcel_id} is already bound to assignment {bound_to}"
                    )));
                }
            }
            parcels.push(parcel);
        }

        let delivery_address_id = parcels[0].delivery_address_id;
        if parcels
            .iter()
            .any(|p| p.delivery_address_id != delivery_address_id)
        {
            return Err(OrchestrationError::validation(
                "parcels do not share a delivery address",
            ));
        }

        if let Some(zone) = zone_id {
            if !shipper.serves_zone(zone) {
                return Err(OrchestrationError::validation(format!(
                    "zone {zone} is outside shipper working zones"
                )));
            }
            if let Some(outside) = parcels.iter().find(|p| !shipper.serves_zone(&p.zone_id)) {
                return Err(OrchestrationError::validation(format!(
                    "parcel {} zone {} is outside shipper working zones",
                    outside.parcel_id, outside.zone_id
                )));
            }
        }

        let assignment = DeliveryAssignment::new(
            shipper_id,
            delivery_address_id,
            parcel_ids.to_vec(),
            0,
        );
        for parcel in &mut parcels {
            parcel.assignment_id = Some(assignment.assignment_id);
        }

        self.store
            .create_assignments_with_parcels(std::slice::from_ref(&assignment), &parcels)
            .await?;

        info!(
            assignment_id = %assignment.assignment_id,
            shipper_id = %shipper_id,
            parcels = parcels.len(),
            "manual assignment created"
        );

        Ok(assignment)
    }

    /// Run the auto-assignment engine and materialize its solution.
    ///
    /// Shipper and parcel sets default to all available shippers and all
    /// unassigned warehouse parcels. Per solved route, consecutive stops at
    /// one delivery address collapse into a single assignment, in route
    /// order. The whole solution is applied in one commit; unplaced orders
    /// are reported, not an error.
    pub async fn create_auto(
        &self,
        shipper_ids: Option<&[Uuid]>,
        parcel_ids: Option<&[Uuid]>,
        vehicle: VehicleProfile,
        mode: SolverMode,
    ) -> OrchestrationResult<AutoAssignmentOutcome> {
        let shippers = self.resolve_shippers(shipper_ids).await?;
        let parcels = self.resolve_parcels(parcel_ids).await?;

        let vrp_shippers: Vec<Shipper> = shippers.iter().map(Shipper::from_profile).collect();
        let orders: Vec<Order> = parcels.iter().map(Order::from_parcel).collect();

        let solution = self
            .engine
            .solve(&vrp_shippers, &orders, vehicle, mode)
            .await?;

        let mut by_id: std::collections::HashMap<Uuid, Parcel> = parcels
            .into_iter()
            .map(|p| (p.parcel_id, p))
            .collect();

        let mut assignments = Vec::new();
        let mut bound_parcels = Vec::new();

        for route in &solution.routes {
            let mut sequence = 0;
            let mut stops = route.stops.iter().peekable();
            while let Some(first) = stops.next() {
                let mut group = vec![first.parcel_id];
                while let Some(next) =
                    stops.next_if(|s| s.delivery_address_id == first.delivery_address_id)
                {
                    group.push(next.parcel_id);
                }

                sequence += 1;
                let assignment = DeliveryAssignment::new(
                    route.shipper_id,
                    first.delivery_address_id,
                    group.clone(),
                    sequence,
                );
                for parcel_id in &group {
                    // Every stop comes from the resolved parcel set
                    if let Some(mut parcel) = by_id.remove(parcel_id) {
                        parcel.assignment_id = Some(assignment.assignment_id);
                        bound_parcels.push(parcel);
                    }
                }
                assignments.push(assignment);
            }
        }

        self.store
            .create_assignments_with_parcels(&assignments, &bound_parcels)
            .await?;

        info!(
            assignments = assignments.len(),
            unassigned = solution.unassigned.len(),
            "auto assignment applied"
        );

        Ok(AutoAssignmentOutcome {
            assignments,
            unassigned_orders: solution.unassigned,
            stats: solution.stats,
        })
    }

    /// Shipper acknowledges the assignment, stamping the scan time.
    pub async fn accept_task(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let mut assignment = self.load_for_shipper(assignment_id, shipper_id).await?;
        assignment.status = assignment_sm::transition(assignment.status, &AssignmentEvent::Accept)
            .map_err(OrchestrationError::invalid_state("assignment"))?;
        assignment.accepted_at = Some(Utc::now());

        self.store
            .commit_cascade(None, std::slice::from_ref(&assignment), &[])
            .await?;
        Ok(self.store.get_assignment(assignment_id).await?)
    }

    /// Start an accepted (or still pending) assignment inside an existing
    /// session, advancing its parcels onto the route.
    pub async fn start_task(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
        session_id: Uuid,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let mut assignment = self.load_for_shipper(assignment_id, shipper_id).await?;
        if assignment.session_id.is_some() {
            return Err(OrchestrationError::validation(format!(
                "assignment {assignment_id} is already bound to a session"
            )));
        }

        let mut session = self.store.get_session(session_id).await?;
        if session.shipper_id != shipper_id {
            return Err(OrchestrationError::validation(format!(
                "session {session_id} does not belong to shipper {shipper_id}"
            )));
        }
        if session.status.is_terminal() {
            return Err(OrchestrationError::validation(format!(
                "session {session_id} is already closed"
            )));
        }

        assignment.status = assignment_sm::transition(assignment.status, &AssignmentEvent::Start)
            .map_err(OrchestrationError::invalid_state("assignment"))?;
        assignment.session_id = Some(session_id);
        assignment.started_at = Some(Utc::now());

        let mut parcels = Vec::with_capacity(assignment.parcel_ids.len());
        for parcel_id in &assignment.parcel_ids {
            let mut parcel = self.store.get_parcel(*parcel_id).await?;
            parcel.status = parcel_sm::transition(parcel.status, &ParcelEvent::ScanQr)
                .map_err(OrchestrationError::invalid_state("parcel"))?;
            parcels.push(parcel);
        }

        // A late-started assignment joins the session's workload
        session.total_tasks += 1;
        if session.status == SessionStatus::Created {
            session.status = session_sm::transition(session.status, &SessionEvent::Start)
                .map_err(OrchestrationError::invalid_state("session"))?;
        }

        self.store
            .commit_cascade(Some(&session), std::slice::from_ref(&assignment), &parcels)
            .await?;
        Ok(self.store.get_assignment(assignment_id).await?)
    }

    /// Mark an in-progress assignment as delivered, advancing every parcel
    /// to delivered and publishing one assignment-completed event per
    /// parcel.
    pub async fn complete_task(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let shipper = self.store.get_shipper(shipper_id).await?;
        let (assignment, parcels) = self
            .terminate(
                assignment_id,
                &shipper,
                AssignmentEvent::Complete,
                ParcelEvent::DeliverySuccessful,
                TaskOutcome::Completed,
                None,
            )
            .await?;

        let completed_at = assignment.terminated_at.unwrap_or_else(Utc::now);
        for parcel in &parcels {
            self.publisher.publish(DispatchEvent::AssignmentCompleted {
                assignment_id: assignment.assignment_id,
                parcel_id: parcel.parcel_id,
                parcel_code: parcel.code.clone(),
                session_id: assignment.session_id,
                delivery_man_id: shipper.shipper_id,
                delivery_man_name: shipper.name.clone(),
                receiver_id: parcel.receiver_id,
                receiver_name: parcel.receiver_name.clone(),
                receiver_phone: parcel.receiver_phone.clone(),
                completed_at,
            });
        }

        Ok(assignment)
    }

    /// Record a failed delivery attempt, failing the assignment and its
    /// parcels.
    pub async fn delivery_failed(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
        reason: impl Into<String>,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let shipper = self.store.get_shipper(shipper_id).await?;
        let reason = reason.into();
        let (assignment, _) = self
            .terminate(
                assignment_id,
                &shipper,
                AssignmentEvent::fail_with_reason(reason.clone()),
                ParcelEvent::CanNotDeliver,
                TaskOutcome::Failed,
                Some(reason),
            )
            .await?;
        Ok(assignment)
    }

    /// Shipper declines the assignment; on-route parcels return to the
    /// warehouse and become eligible again.
    pub async fn refuse_task(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let shipper = self.store.get_shipper(shipper_id).await?;
        let (assignment, _) = self
            .terminate(
                assignment_id,
                &shipper,
                AssignmentEvent::Refuse,
                ParcelEvent::Postpone,
                TaskOutcome::Failed,
                Some("refused by shipper".to_string()),
            )
            .await?;
        Ok(assignment)
    }

    /// Receiver pushed the delivery to a later time; parcels return to the
    /// warehouse and a parcel-postponed event is published for each.
    pub async fn postpone_task(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
        requested_time: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let shipper = self.store.get_shipper(shipper_id).await?;
        let reason = reason.into();
        let (assignment, parcels) = self
            .terminate(
                assignment_id,
                &shipper,
                AssignmentEvent::Postpone,
                ParcelEvent::Postpone,
                TaskOutcome::Delayed,
                Some(format!("postponed: {reason}")),
            )
            .await?;

        for parcel in &parcels {
            self.publisher.publish(DispatchEvent::ParcelPostponed {
                assignment_id: assignment.assignment_id,
                parcel_id: parcel.parcel_id,
                session_id: assignment.session_id,
                delivery_man_id: shipper.shipper_id,
                requested_time,
                reason: reason.clone(),
            });
        }

        Ok(assignment)
    }

    /// Shared terminal-transition path: validate through the state
    /// machines, fold the outcome into the owning session's counters, and
    /// commit assignment + parcels + session as one unit.
    async fn terminate(
        &self,
        assignment_id: Uuid,
        shipper: &ShipperProfile,
        assignment_event: AssignmentEvent,
        parcel_event: ParcelEvent,
        outcome: TaskOutcome,
        fail_reason: Option<String>,
    ) -> OrchestrationResult<(DeliveryAssignment, Vec<Parcel>)> {
        let mut assignment = self
            .load_for_shipper(assignment_id, shipper.shipper_id)
            .await?;

        assignment.status = assignment_sm::transition(assignment.status, &assignment_event)
            .map_err(OrchestrationError::invalid_state("assignment"))?;
        assignment.terminated_at = Some(Utc::now());
        if assignment.fail_reason.is_none() {
            assignment.fail_reason = fail_reason;
        }

        let mut parcels = Vec::with_capacity(assignment.parcel_ids.len());
        for parcel_id in &assignment.parcel_ids {
            let mut parcel = self.store.get_parcel(*parcel_id).await?;
            if parcel.status == ParcelStatus::InWarehouse {
                // Never left the warehouse (refusal before session start):
                // no lifecycle event, just release the binding
                parcel.assignment_id = None;
            } else {
                parcel.status = parcel_sm::transition(parcel.status, &parcel_event)
                    .map_err(OrchestrationError::invalid_state("parcel"))?;
                if parcel.status == ParcelStatus::InWarehouse {
                    // Back in the warehouse means free for re-assignment
                    parcel.assignment_id = None;
                }
            }
            parcels.push(parcel);
        }

        let session = match assignment.session_id {
            Some(session_id) => {
                let mut session = self.store.get_session(session_id).await?;
                if !session.status.is_terminal() {
                    SessionLifecycleManager::record_task_outcome(&mut session, outcome)?;
                    Some(session)
                } else {
                    None
                }
            }
            None => None,
        };

        self.store
            .commit_cascade(
                session.as_ref(),
                std::slice::from_ref(&assignment),
                &parcels,
            )
            .await?;

        info!(
            assignment_id = %assignment.assignment_id,
            event = assignment_event.event_type(),
            status = %assignment.status,
            "assignment transition applied"
        );

        let stored = self.store.get_assignment(assignment_id).await?;
        Ok((stored, parcels))
    }

    async fn load_for_shipper(
        &self,
        assignment_id: Uuid,
        shipper_id: Uuid,
    ) -> OrchestrationResult<DeliveryAssignment> {
        let assignment = self.store.get_assignment(assignment_id).await?;
        if assignment.shipper_id != shipper_id {
            return Err(OrchestrationError::validation(format!(
                "assignment {assignment_id} does not belong to shipper {shipper_id}"
            )));
        }
        Ok(assignment)
    }

    async fn resolve_shippers(
        &self,
        shipper_ids: Option<&[Uuid]>,
    ) -> OrchestrationResult<Vec<ShipperProfile>> {
        match shipper_ids {
            Some(ids) => {
                if ids.is_empty() {
                    return Err(OrchestrationError::validation("shipper list is empty"));
                }
                let mut shippers = Vec::with_capacity(ids.len());
                for id in ids {
                    shippers.push(self.store.get_shipper(*id).await?);
                }
                Ok(shippers)
            }
            None => Ok(self.store.list_available_shippers().await?),
        }
    }

    async fn resolve_parcels(
        &self,
        parcel_ids: Option<&[Uuid]>,
    ) -> OrchestrationResult<Vec<Parcel>> {
        match parcel_ids {
            Some(ids) => {
                if ids.is_empty() {
                    return Err(OrchestrationError::validation("parcel list is empty"));
                }
                let mut parcels = Vec::with_capacity(ids.len());
                for id in ids {
                    let parcel = self.store.get_parcel(*id).await?;
                    if !parcel.is_unassigned() {
                        return Err(OrchestrationError::validation(format!(
                            "parcel {id} is not eligible for auto-assignment"
                        )));
                    }
                    parcels.push(parcel);
                }
                Ok(parcels)
            }
            None => Ok(self.store.list_unassigned_parcels().await?),
        }
    }
}
