//! Ride state machine: which lifecycle transitions are legal.
//!
//! `Requested -> Accepted` only ever happens through the dispatch claim;
//! `Emergency` is reachable from any non-terminal state and is terminal
//! pending manual resolution outside this system.

use crate::error::RideError;
use crate::models::RideStatus;

impl RideStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RideStatus::Completed | RideStatus::Cancelled | RideStatus::Emergency
        )
    }
}

/// Whether `from -> to` is a legal lifecycle transition.
pub fn can_transition(from: RideStatus, to: RideStatus) -> bool {
    use RideStatus::*;
    if to == Emergency {
        return !from.is_terminal();
    }
    matches!(
        (from, to),
        (Requested, Accepted)
            | (Requested, Cancelled)
            | (Accepted, InProgress)
            | (Accepted, Cancelled)
            | (InProgress, Completed)
    )
}

/// Validates a transition, leaving the decision to commit it to the caller.
pub fn ensure_transition(from: RideStatus, to: RideStatus) -> Result<(), RideError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(RideError::IllegalTransition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RideStatus::*;

    const ALL: [RideStatus; 6] = [Requested, Accepted, InProgress, Completed, Cancelled, Emergency];

    #[test]
    fn happy_path_transitions_are_legal() {
        assert!(can_transition(Requested, Accepted));
        assert!(can_transition(Accepted, InProgress));
        assert!(can_transition(InProgress, Completed));
    }

    #[test]
    fn cancellation_is_legal_before_the_trip_starts() {
        assert!(can_transition(Requested, Cancelled));
        assert!(can_transition(Accepted, Cancelled));
        assert!(!can_transition(InProgress, Cancelled));
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        for from in [Completed, Cancelled, Emergency] {
            for to in ALL {
                assert!(
                    !can_transition(from, to),
                    "{from:?} -> {to:?} should be rejected"
                );
            }
        }
    }

    #[test]
    fn emergency_is_reachable_from_every_active_state() {
        for from in [Requested, Accepted, InProgress] {
            assert!(can_transition(from, Emergency));
        }
    }

    #[test]
    fn ensure_transition_reports_both_endpoints() {
        let err = ensure_transition(Completed, InProgress).unwrap_err();
        match err {
            RideError::IllegalTransition { from, to } => {
                assert_eq!(from, Completed);
                assert_eq!(to, InProgress);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
