use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paintstock_core::{AggregateId, DomainError, DomainResult, Entity, PartyId, UserId};
use paintstock_inventory::{ItemId, ItemKind};
use paintstock_pricing::{line_subtotal, order_totals, LinePricing, OrderTotals};

use crate::lifecycle::{validate_transition, OrderStatus, TransitionEffect};

/// Order document identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase documents bring stock in; sale documents take it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderKind {
    Purchase,
    Sale,
}

impl OrderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderKind::Purchase => "purchase",
            OrderKind::Sale => "sale",
        }
    }
}

/// One line of an order document.
///
/// Purchase lines price at cost; sale lines carry a selling price that the
/// caller derives from cost + margin (or edits directly) through the pricing
/// functions. The subtotal is always computed, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    item_id: ItemId,
    item_kind: ItemKind,
    quantity: Decimal,
    unit_cost: Decimal,
    unit_price: Decimal,
}

impl OrderLine {
    pub fn new(
        item_id: ItemId,
        item_kind: ItemKind,
        quantity: Decimal,
        unit_cost: Decimal,
        unit_price: Decimal,
    ) -> DomainResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(DomainError::invalid_line("quantity must be positive"));
        }
        if unit_cost < Decimal::ZERO {
            return Err(DomainError::invalid_line("unit cost cannot be negative"));
        }
        if unit_price < Decimal::ZERO {
            return Err(DomainError::invalid_line("unit price cannot be negative"));
        }

        Ok(Self {
            item_id,
            item_kind,
            quantity,
            unit_cost,
            unit_price,
        })
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn item_kind(&self) -> ItemKind {
        self.item_kind
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn subtotal(&self) -> Decimal {
        line_subtotal(self.quantity, self.unit_price)
    }

    fn pricing(&self) -> LinePricing {
        LinePricing {
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            unit_price: self.unit_price,
        }
    }
}

/// A purchase or sale document: header + ordered lines + lifecycle status.
///
/// Mutable while draft or ongoing; permanently locked once finished or
/// canceled. `version` increases on every successful mutation and backs the
/// engine's optimistic concurrency checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDocument {
    id: OrderId,
    kind: OrderKind,
    number: String,
    counterparty: PartyId,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    notes: String,
    created_by: UserId,
    created_at: DateTime<Utc>,
    version: u64,
}

impl OrderDocument {
    pub fn create(
        id: OrderId,
        kind: OrderKind,
        number: impl Into<String>,
        counterparty: PartyId,
        created_by: UserId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(DomainError::validation("order number cannot be empty"));
        }

        Ok(Self {
            id,
            kind,
            number,
            counterparty,
            status: OrderStatus::Draft,
            lines: Vec::new(),
            notes: String::new(),
            created_by,
            created_at,
            version: 1,
        })
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn counterparty(&self) -> PartyId {
        self.counterparty
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, OrderStatus::Draft | OrderStatus::Ongoing)
    }

    pub fn totals(&self) -> OrderTotals {
        order_totals(self.lines.iter().map(OrderLine::pricing))
    }

    fn ensure_modifiable(&self) -> DomainResult<()> {
        if self.is_modifiable() {
            Ok(())
        } else {
            Err(DomainError::order_locked(self.status.as_str()))
        }
    }

    /// Add a line, merging a duplicate item into a quantity increment.
    ///
    /// One item appears at most once per document; re-selecting it bumps the
    /// existing line's quantity and keeps its pricing.
    pub fn upsert_line(&mut self, line: OrderLine) -> DomainResult<()> {
        self.ensure_modifiable()?;

        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.item_id == line.item_id)
        {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }

        self.version += 1;
        Ok(())
    }

    /// Replace the whole line list (the form's save-all path).
    pub fn replace_lines(&mut self, lines: Vec<OrderLine>) -> DomainResult<()> {
        self.ensure_modifiable()?;

        for (idx, line) in lines.iter().enumerate() {
            let dup = lines[..idx].iter().any(|l| l.item_id == line.item_id);
            if dup {
                return Err(DomainError::invalid_line(format!(
                    "item {} appears more than once",
                    line.item_id
                )));
            }
        }

        self.lines = lines;
        self.version += 1;
        Ok(())
    }

    pub fn update_header(
        &mut self,
        counterparty: Option<PartyId>,
        notes: Option<String>,
    ) -> DomainResult<()> {
        self.ensure_modifiable()?;

        if let Some(counterparty) = counterparty {
            self.counterparty = counterparty;
        }
        if let Some(notes) = notes {
            self.notes = notes;
        }

        self.version += 1;
        Ok(())
    }

    /// Pure check of a status change against the lifecycle table.
    pub fn validate_transition(&self, to: OrderStatus) -> DomainResult<TransitionEffect> {
        validate_transition(self.status, to)
    }

    /// Extra conditions the commit edge carries beyond the table itself.
    pub fn ensure_committable(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation(
                "cannot finish an order without lines",
            ));
        }
        for line in &self.lines {
            if line.quantity <= Decimal::ZERO {
                return Err(DomainError::invalid_line("quantity must be positive"));
            }
        }
        Ok(())
    }

    /// Apply a validated transition. For the commit edge the caller appends
    /// the stock movements first and flips the status only once the append
    /// has succeeded.
    pub fn apply_transition(&mut self, to: OrderStatus) -> DomainResult<TransitionEffect> {
        let effect = self.validate_transition(to)?;
        self.status = to;
        self.version += 1;
        Ok(effect)
    }
}

impl Entity for OrderDocument {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn test_order(kind: OrderKind) -> OrderDocument {
        OrderDocument::create(
            OrderId::new(AggregateId::new()),
            kind,
            "PO-2024-001",
            PartyId::new(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    fn test_line(item_id: ItemId, qty: Decimal) -> OrderLine {
        OrderLine::new(item_id, ItemKind::FinishedGood, qty, dec!(1000), dec!(1300)).unwrap()
    }

    #[test]
    fn new_order_starts_as_draft_at_version_one() {
        let order = test_order(OrderKind::Purchase);
        assert_eq!(order.status(), OrderStatus::Draft);
        assert_eq!(order.version(), 1);
        assert!(order.lines().is_empty());
    }

    #[test]
    fn empty_number_is_rejected() {
        let err = OrderDocument::create(
            OrderId::new(AggregateId::new()),
            OrderKind::Sale,
            "  ",
            PartyId::new(),
            UserId::new(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn non_positive_quantity_line_is_invalid() {
        let err = OrderLine::new(
            ItemId::new(AggregateId::new()),
            ItemKind::RawMaterial,
            dec!(0),
            dec!(10),
            dec!(12),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidLine(_)));
    }

    #[test]
    fn negative_price_line_is_invalid() {
        let err = OrderLine::new(
            ItemId::new(AggregateId::new()),
            ItemKind::RawMaterial,
            dec!(1),
            dec!(10),
            dec!(-1),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidLine(_)));
    }

    #[test]
    fn duplicate_item_merges_into_quantity_increment() {
        let mut order = test_order(OrderKind::Sale);
        let item = ItemId::new(AggregateId::new());

        order.upsert_line(test_line(item, dec!(3))).unwrap();
        order.upsert_line(test_line(item, dec!(2))).unwrap();

        assert_eq!(order.lines().len(), 1);
        assert_eq!(order.lines()[0].quantity(), dec!(5));
    }

    #[test]
    fn replace_lines_rejects_duplicate_items() {
        let mut order = test_order(OrderKind::Sale);
        let item = ItemId::new(AggregateId::new());

        let err = order
            .replace_lines(vec![test_line(item, dec!(1)), test_line(item, dec!(2))])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidLine(_)));
    }

    #[test]
    fn edits_are_allowed_while_ongoing() {
        let mut order = test_order(OrderKind::Purchase);
        order.apply_transition(OrderStatus::Ongoing).unwrap();

        order
            .upsert_line(test_line(ItemId::new(AggregateId::new()), dec!(1)))
            .unwrap();
        order.update_header(None, Some("rush order".into())).unwrap();
        assert_eq!(order.notes(), "rush order");
    }

    #[test]
    fn canceled_order_rejects_every_mutation_with_order_locked() {
        let mut order = test_order(OrderKind::Sale);
        order
            .upsert_line(test_line(ItemId::new(AggregateId::new()), dec!(1)))
            .unwrap();
        order.apply_transition(OrderStatus::Canceled).unwrap();
        let version = order.version();

        let line = test_line(ItemId::new(AggregateId::new()), dec!(1));
        assert!(matches!(
            order.upsert_line(line.clone()).unwrap_err(),
            DomainError::OrderLocked { .. }
        ));
        assert!(matches!(
            order.replace_lines(vec![line]).unwrap_err(),
            DomainError::OrderLocked { .. }
        ));
        assert!(matches!(
            order.update_header(None, Some("x".into())).unwrap_err(),
            DomainError::OrderLocked { .. }
        ));
        assert!(matches!(
            order.apply_transition(OrderStatus::Ongoing).unwrap_err(),
            DomainError::OrderLocked { .. }
        ));

        // No observable state change, however often it is retried.
        assert_eq!(order.version(), version);
        assert_eq!(order.status(), OrderStatus::Canceled);
    }

    #[test]
    fn commit_requires_at_least_one_line() {
        let order = test_order(OrderKind::Purchase);
        assert!(matches!(
            order.ensure_committable().unwrap_err(),
            DomainError::Validation(_)
        ));
    }

    #[test]
    fn totals_fold_over_lines() {
        let mut order = test_order(OrderKind::Sale);
        order
            .upsert_line(test_line(ItemId::new(AggregateId::new()), dec!(10)))
            .unwrap();

        let totals = order.totals();
        assert_eq!(totals.total_quantity, dec!(10));
        assert_eq!(totals.total_cost, dec!(10000));
        assert_eq!(totals.revenue, dec!(13000));
        assert_eq!(totals.profit, dec!(3000));
        assert_eq!(totals.margin_percent, dec!(30));
    }

    #[test]
    fn version_bumps_on_every_successful_mutation() {
        let mut order = test_order(OrderKind::Purchase);
        assert_eq!(order.version(), 1);

        order
            .upsert_line(test_line(ItemId::new(AggregateId::new()), dec!(1)))
            .unwrap();
        assert_eq!(order.version(), 2);

        order.update_header(Some(PartyId::new()), None).unwrap();
        assert_eq!(order.version(), 3);

        order.apply_transition(OrderStatus::Ongoing).unwrap();
        assert_eq!(order.version(), 4);
    }
}
