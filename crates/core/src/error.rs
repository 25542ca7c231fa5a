//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::id::AggregateId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant except `Storage` is a deterministic, recoverable business
/// failure: it is returned to the caller and leaves state untouched.
/// `Storage` is the fatal-to-the-request class (persistence unavailable);
/// the operation is not applied and is safe to retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Requested status change is not in the lifecycle transition table.
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Mutation or transition attempted on a finished/canceled order.
    #[error("order is locked in terminal status {status}")]
    OrderLocked { status: String },

    /// A sale commit would drive an item's balance negative.
    #[error("insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: AggregateId,
        requested: Decimal,
        available: Decimal,
    },

    /// Non-positive quantity, negative price, or a duplicate item reference
    /// within one order. Rejected at line-edit time, never reaches commit.
    #[error("invalid line: {0}")]
    InvalidLine(String),

    /// Optimistic-concurrency conflict; retry the operation from a fresh read.
    #[error("concurrent modification: {0}")]
    ConcurrentModification(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// Persistence-layer failure. Not applied, safe to retry.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn order_locked(status: impl Into<String>) -> Self {
        Self::OrderLocked {
            status: status.into(),
        }
    }

    pub fn insufficient_stock(
        item_id: AggregateId,
        requested: Decimal,
        available: Decimal,
    ) -> Self {
        Self::InsufficientStock {
            item_id,
            requested,
            available,
        }
    }

    pub fn invalid_line(msg: impl Into<String>) -> Self {
        Self::InvalidLine(msg.into())
    }

    pub fn concurrent_modification(msg: impl Into<String>) -> Self {
        Self::ConcurrentModification(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Amount by which the requested quantity exceeds the available balance.
    /// Zero for every other variant.
    pub fn shortfall(&self) -> Decimal {
        match self {
            Self::InsufficientStock {
                requested,
                available,
                ..
            } => *requested - *available,
            _ => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_stock_reports_shortfall() {
        let err =
            DomainError::insufficient_stock(AggregateId::new(), dec!(8), dec!(5));
        assert_eq!(err.shortfall(), dec!(3));
    }

    #[test]
    fn shortfall_is_zero_for_other_variants() {
        assert_eq!(DomainError::not_found().shortfall(), Decimal::ZERO);
        assert_eq!(
            DomainError::order_locked("finished").shortfall(),
            Decimal::ZERO
        );
    }
}
