use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paintstock_core::{AggregateId, DomainError, DomainResult, UserId};
use paintstock_inventory::{ItemId, ItemKind};
use paintstock_orders::{OrderDocument, OrderId, OrderKind};

/// Stock movement identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub AggregateId);

impl MovementId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for MovementId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Movement type. Direction is implied by the type, except `Adjustment`,
/// which carries an explicit signed delta supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    PurchaseIn,
    SaleOut,
    ProductionIn,
    ProductionOut,
    ReturnIn,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::PurchaseIn => "purchase_in",
            MovementType::SaleOut => "sale_out",
            MovementType::ProductionIn => "production_in",
            MovementType::ProductionOut => "production_out",
            MovementType::ReturnIn => "return_in",
            MovementType::Adjustment => "adjustment",
        }
    }

    /// Sign applied to the magnitude when folding into a balance.
    /// `None` means the quantity is already signed (adjustments).
    fn sign(&self) -> Option<Decimal> {
        match self {
            MovementType::PurchaseIn | MovementType::ProductionIn | MovementType::ReturnIn => {
                Some(Decimal::ONE)
            }
            MovementType::SaleOut | MovementType::ProductionOut => Some(Decimal::NEGATIVE_ONE),
            MovementType::Adjustment => None,
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movement that has not been admitted to the ledger yet (no sequence
/// number). Once appended it becomes a [`StockMovement`] and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMovement {
    pub item_id: ItemId,
    pub item_kind: ItemKind,
    pub movement_type: MovementType,
    /// Positive magnitude, except `Adjustment` where this is the signed delta.
    pub quantity: Decimal,
    /// Originating order, for movements produced by an order commit.
    pub order_ref: Option<OrderId>,
    /// Free-text reason for adjustments and returns.
    pub reason: Option<String>,
    pub author: UserId,
    pub occurred_at: DateTime<Utc>,
}

impl PendingMovement {
    /// Well-formedness check applied by the ledger on admission. Business
    /// rules (sufficient balance etc.) are the caller's job; the ledger only
    /// refuses records that make no sense as facts.
    pub fn validate(&self) -> DomainResult<()> {
        match self.movement_type {
            MovementType::Adjustment => {
                if self.quantity.is_zero() {
                    return Err(DomainError::validation("adjustment delta cannot be zero"));
                }
            }
            _ => {
                if self.quantity <= Decimal::ZERO {
                    return Err(DomainError::validation(format!(
                        "{} quantity must be positive",
                        self.movement_type
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn signed_effect(&self) -> Decimal {
        match self.movement_type.sign() {
            Some(sign) => sign * self.quantity,
            None => self.quantity,
        }
    }
}

/// An admitted, immutable ledger record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: MovementId,
    /// Ledger-wide monotonically increasing position; the ordering authority
    /// for deterministic replay.
    pub sequence: u64,
    pub item_id: ItemId,
    pub item_kind: ItemKind,
    pub movement_type: MovementType,
    pub quantity: Decimal,
    pub order_ref: Option<OrderId>,
    pub reason: Option<String>,
    pub author: UserId,
    pub recorded_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn signed_effect(&self) -> Decimal {
        match self.movement_type.sign() {
            Some(sign) => sign * self.quantity,
            None => self.quantity,
        }
    }
}

/// Build the movement batch for an order commit, one movement per line, in
/// line order. Pure; nothing is appended here.
pub fn movements_for_commit(
    doc: &OrderDocument,
    author: UserId,
    occurred_at: DateTime<Utc>,
) -> DomainResult<Vec<PendingMovement>> {
    doc.ensure_committable()?;

    let movement_type = match doc.kind() {
        OrderKind::Purchase => MovementType::PurchaseIn,
        OrderKind::Sale => MovementType::SaleOut,
    };

    Ok(doc
        .lines()
        .iter()
        .map(|line| PendingMovement {
            item_id: line.item_id(),
            item_kind: line.item_kind(),
            movement_type,
            quantity: line.quantity(),
            order_ref: Some(doc.id_typed()),
            reason: None,
            author,
            occurred_at,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paintstock_core::PartyId;
    use paintstock_orders::OrderLine;
    use rust_decimal_macros::dec;

    fn pending(movement_type: MovementType, quantity: Decimal) -> PendingMovement {
        PendingMovement {
            item_id: ItemId::new(AggregateId::new()),
            item_kind: ItemKind::FinishedGood,
            movement_type,
            quantity,
            order_ref: None,
            reason: None,
            author: UserId::new(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn inbound_types_add_and_outbound_types_subtract() {
        assert_eq!(pending(MovementType::PurchaseIn, dec!(10)).signed_effect(), dec!(10));
        assert_eq!(pending(MovementType::ProductionIn, dec!(3)).signed_effect(), dec!(3));
        assert_eq!(pending(MovementType::ReturnIn, dec!(2)).signed_effect(), dec!(2));
        assert_eq!(pending(MovementType::SaleOut, dec!(4)).signed_effect(), dec!(-4));
        assert_eq!(pending(MovementType::ProductionOut, dec!(5)).signed_effect(), dec!(-5));
    }

    #[test]
    fn adjustment_carries_its_own_sign() {
        assert_eq!(pending(MovementType::Adjustment, dec!(-7)).signed_effect(), dec!(-7));
        assert_eq!(pending(MovementType::Adjustment, dec!(7)).signed_effect(), dec!(7));
    }

    #[test]
    fn zero_adjustment_is_malformed() {
        let err = pending(MovementType::Adjustment, dec!(0)).validate().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_magnitude_is_malformed_for_typed_directions() {
        assert!(pending(MovementType::SaleOut, dec!(0)).validate().is_err());
        assert!(pending(MovementType::PurchaseIn, dec!(-1)).validate().is_err());
        assert!(pending(MovementType::ReturnIn, dec!(1)).validate().is_ok());
    }

    #[test]
    fn commit_batch_follows_line_order_and_references_the_order() {
        let mut doc = OrderDocument::create(
            OrderId::new(AggregateId::new()),
            OrderKind::Sale,
            "SO-77",
            PartyId::new(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();

        let first = ItemId::new(AggregateId::new());
        let second = ItemId::new(AggregateId::new());
        for (item, qty) in [(first, dec!(4)), (second, dec!(9))] {
            doc.upsert_line(
                OrderLine::new(item, ItemKind::FinishedGood, qty, dec!(100), dec!(130)).unwrap(),
            )
            .unwrap();
        }

        let author = UserId::new();
        let batch = movements_for_commit(&doc, author, Utc::now()).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].item_id, first);
        assert_eq!(batch[0].quantity, dec!(4));
        assert_eq!(batch[1].item_id, second);
        assert_eq!(batch[1].quantity, dec!(9));
        for m in &batch {
            assert_eq!(m.movement_type, MovementType::SaleOut);
            assert_eq!(m.order_ref, Some(doc.id_typed()));
            assert_eq!(m.author, author);
        }
    }

    #[test]
    fn wire_format_uses_snake_case_types_and_transparent_ids() {
        let value = serde_json::to_value(MovementType::ProductionOut).unwrap();
        assert_eq!(value, serde_json::json!("production_out"));

        let id = MovementId::new(AggregateId::new());
        let value = serde_json::to_value(id).unwrap();
        assert_eq!(value, serde_json::json!(id.0.to_string()));

        let roundtripped: MovementId = serde_json::from_value(value).unwrap();
        assert_eq!(roundtripped, id);
    }

    #[test]
    fn commit_batch_of_empty_order_is_refused() {
        let doc = OrderDocument::create(
            OrderId::new(AggregateId::new()),
            OrderKind::Purchase,
            "PO-1",
            PartyId::new(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap();

        assert!(movements_for_commit(&doc, UserId::new(), Utc::now()).is_err());
    }
}
