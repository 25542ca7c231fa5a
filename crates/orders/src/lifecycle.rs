//! Order status lifecycle: the single authority on which transitions exist.

use serde::{Deserialize, Serialize};

use paintstock_core::{DomainError, DomainResult};

/// Order document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Draft,
    Ongoing,
    Finished,
    Canceled,
}

impl OrderStatus {
    /// Finished and canceled orders are permanently read-only.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Finished | OrderStatus::Canceled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Ongoing => "ongoing",
            OrderStatus::Finished => "finished",
            OrderStatus::Canceled => "canceled",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a valid transition does besides changing the status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEffect {
    /// Status change only.
    None,
    /// The commit edge: stock movements must be appended, atomically with
    /// the status change, before the document locks.
    Commit,
}

/// Check one edge of the transition table.
///
/// Transition validation always runs before any ledger write; a failure here
/// means no state change of any kind.
pub fn validate_transition(from: OrderStatus, to: OrderStatus) -> DomainResult<TransitionEffect> {
    use OrderStatus::*;

    if from.is_terminal() {
        return Err(DomainError::order_locked(from.as_str()));
    }

    match (from, to) {
        (Draft, Ongoing) => Ok(TransitionEffect::None),
        (Draft, Canceled) | (Ongoing, Canceled) => Ok(TransitionEffect::None),
        (Draft, Finished) | (Ongoing, Finished) => Ok(TransitionEffect::Commit),
        _ => Err(DomainError::invalid_transition(from.as_str(), to.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn draft_to_ongoing_has_no_stock_effect() {
        assert_eq!(validate_transition(Draft, Ongoing).unwrap(), TransitionEffect::None);
    }

    #[test]
    fn cancel_is_allowed_from_draft_and_ongoing() {
        assert_eq!(validate_transition(Draft, Canceled).unwrap(), TransitionEffect::None);
        assert_eq!(validate_transition(Ongoing, Canceled).unwrap(), TransitionEffect::None);
    }

    #[test]
    fn finish_is_the_commit_edge() {
        assert_eq!(validate_transition(Draft, Finished).unwrap(), TransitionEffect::Commit);
        assert_eq!(validate_transition(Ongoing, Finished).unwrap(), TransitionEffect::Commit);
    }

    #[test]
    fn terminal_states_reject_every_edge_with_order_locked() {
        for from in [Finished, Canceled] {
            for to in [Draft, Ongoing, Finished, Canceled] {
                let err = validate_transition(from, to).unwrap_err();
                assert!(
                    matches!(err, DomainError::OrderLocked { .. }),
                    "{from} -> {to} should be OrderLocked"
                );
            }
        }
    }

    #[test]
    fn edges_outside_the_table_are_invalid() {
        for (from, to) in [(Draft, Draft), (Ongoing, Draft), (Ongoing, Ongoing)] {
            let err = validate_transition(from, to).unwrap_err();
            assert!(
                matches!(err, DomainError::InvalidTransition { .. }),
                "{from} -> {to} should be InvalidTransition"
            );
        }
    }
}
