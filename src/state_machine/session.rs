//! # Session State Machine
//!
//! Pure transition table for delivery sessions.

use super::errors::{StateMachineError, StateMachineResult};
use super::events::SessionEvent;
use super::states::SessionStatus;

/// Determine the next session status for an event, or fail if the event is
/// not legal from the current status.
///
/// A session may be completed or failed straight from `Created`: the
/// auto-close sweep and an operator can both close a session the shipper
/// never started.
pub fn transition(
    current: SessionStatus,
    event: &SessionEvent,
) -> StateMachineResult<SessionStatus> {
    use SessionEvent as E;
    use SessionStatus as S;

    let next = match (current, event) {
        (S::Created, E::Start) => S::InProgress,

        (S::Created, E::Complete) => S::Completed,
        (S::InProgress, E::Complete) => S::Completed,

        (S::Created, E::Fail(_)) => S::Failed,
        (S::InProgress, E::Fail(_)) => S::Failed,

        (from, event) => {
            return Err(StateMachineError::invalid_transition(
                from,
                event.event_type(),
            ))
        }
    };

    Ok(next)
}
