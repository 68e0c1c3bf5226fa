//! # Parcel State Machine
//!
//! Pure transition table for the parcel lifecycle. The function holds no
//! side effects; callers persist the returned status and publish events.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::ParcelEvent;
use super::states::ParcelStatus;

/// Determine the next parcel status for an event, or fail if the event is
/// not legal from the current status.
///
/// The only modeled self-transition is `Delivered` on `ConfirmReminder`,
/// which refreshes the confirmation window without changing state. Every
/// other unknown (status, event) pair is a hard error, never a silent no-op.
pub fn transition(current: ParcelStatus, event: &ParcelEvent) -> StateMachineResult<ParcelStatus> {
    use ParcelEvent as E;
    use ParcelStatus as S;

    let next = match (current, event) {
        (S::InWarehouse, E::ScanQr) => S::OnRoute,

        (S::OnRoute, E::DeliverySuccessful) => S::Delivered,
        (S::OnRoute, E::Postpone) => S::InWarehouse,
        (S::OnRoute, E::Delay) => S::Delayed,
        (S::OnRoute, E::CanNotDeliver) => S::Failed,
        (S::OnRoute, E::Accident) => S::Failed,

        // Reminder refresh is the one explicitly modeled no-op
        (S::Delivered, E::ConfirmReminder) => S::Delivered,
        (S::Delivered, E::ConfirmTimeout) => S::Succeeded,
        (S::Delivered, E::CustomerReceived) => S::Succeeded,
        (S::Delivered, E::CustomerReject) => S::Failed,

        (S::Delayed, E::EndSession) => S::InWarehouse,

        (S::Failed, E::OpenDispute) => S::Dispute,
        (S::Failed, E::ReturnToWarehouse) => S::InWarehouse,

        (S::Dispute, E::CustomerRetract) => S::Succeeded,
        (S::Dispute, E::Misunderstanding) => S::Succeeded,
        (S::Dispute, E::FaultConfirmed) => S::Lost,

        (from, event) => {
            return Err(StateMachineError::invalid_transition(
                from,
                event.event_type(),
            ))
        }
    };

    Ok(next)
}
