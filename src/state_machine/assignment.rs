//! # Assignment State Machine
//!
//! Pure transition table for delivery assignments. Cascades to parcel
//! status and session counters are the orchestration layer's job.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::AssignmentEvent;
use super::states::AssignmentStatus;

/// Determine the next assignment status for an event, or fail if the event
/// is not legal from the current status.
pub fn transition(
    current: AssignmentStatus,
    event: &AssignmentEvent,
) -> StateMachineResult<AssignmentStatus> {
    use AssignmentEvent as E;
    use AssignmentStatus as S;

    let next = match (current, event) {
        (S::Pending, E::Accept) => S::Accepted,

        // Session creation may start a still-pending assignment directly
        (S::Pending, E::Start) => S::InProgress,
        (S::Accepted, E::Start) => S::InProgress,

        (S::InProgress, E::Complete) => S::Completed,
        (S::InProgress, E::Fail(_)) => S::Failed,
        (S::InProgress, E::Postpone) => S::Failed,

        // A shipper may decline before the session starts
        (S::Pending, E::Refuse) => S::Failed,
        (S::Accepted, E::Refuse) => S::Failed,
        (S::InProgress, E::Refuse) => S::Failed,

        // Force-close of the owning session fails unstarted work
        (S::Pending, E::Fail(_)) => S::Failed,
        (S::Accepted, E::Fail(_)) => S::Failed,

        (from, event) => {
            return Err(StateMachineError::invalid_transition(
                from,
                event.event_type(),
            ))
        }
    };

    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        assert_eq!(
            transition(AssignmentStatus::Pending, &AssignmentEvent::Accept).unwrap(),
            AssignmentStatus::Accepted
        );
        assert_eq!(
            transition(AssignmentStatus::Accepted, &AssignmentEvent::Start).unwrap(),
            AssignmentStatus::InProgress
        );
        assert_eq!(
            transition(AssignmentStatus::InProgress, &AssignmentEvent::Complete).unwrap(),
            AssignmentStatus::Completed
        );
    }

    #[test]
    fn test_accept_requires_pending() {
        for status in [
            AssignmentStatus::Accepted,
            AssignmentStatus::InProgress,
            AssignmentStatus::Completed,
            AssignmentStatus::Failed,
        ] {
            assert!(transition(status, &AssignmentEvent::Accept).is_err());
        }
    }

    #[test]
    fn test_pending_assignment_starts_at_session_bind() {
        assert_eq!(
            transition(AssignmentStatus::Pending, &AssignmentEvent::Start).unwrap(),
            AssignmentStatus::InProgress
        );
        assert!(transition(AssignmentStatus::InProgress, &AssignmentEvent::Start).is_err());
        assert!(transition(AssignmentStatus::Completed, &AssignmentEvent::Start).is_err());
    }

    #[test]
    fn test_force_fail_of_unstarted_assignment() {
        let event = AssignmentEvent::fail_with_reason("session force-closed");
        assert_eq!(
            transition(AssignmentStatus::Pending, &event).unwrap(),
            AssignmentStatus::Failed
        );
        assert_eq!(
            transition(AssignmentStatus::Accepted, &event).unwrap(),
            AssignmentStatus::Failed
        );
    }

    #[test]
    fn test_terminal_states_reject_every_event() {
        let events = [
            AssignmentEvent::Accept,
            AssignmentEvent::Start,
            AssignmentEvent::Complete,
            AssignmentEvent::fail_with_reason("late"),
            AssignmentEvent::Refuse,
            AssignmentEvent::Postpone,
        ];
        for status in [AssignmentStatus::Completed, AssignmentStatus::Failed] {
            for event in &events {
                assert!(transition(status, event).is_err());
            }
        }
    }
}
