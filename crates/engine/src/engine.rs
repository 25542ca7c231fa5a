use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use paintstock_core::{
    AggregateId, DomainError, DomainResult, ExpectedVersion, PartyId, UserId,
};
use paintstock_inventory::{Item, ItemId, NewItem};
use paintstock_ledger::{
    movements_for_commit, BalanceDrift, BalanceProjector, InMemoryStockLedger, MovementPage,
    MovementType, Pagination, PendingMovement, SortOrder, StockLedger, StockMovement,
};
use paintstock_orders::{
    OrderDocument, OrderId, OrderKind, OrderLine, OrderStatus, TransitionEffect,
};

use crate::locks::{lock_all, ItemLocks};

/// One line of order input, as the forms submit it.
///
/// Purchase lines always price at the item's catalog cost. Sale lines take an
/// explicit selling price (typically derived from cost + margin through the
/// pricing functions); omitting it defaults to cost, i.e. zero margin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLine {
    pub item_id: ItemId,
    pub quantity: Decimal,
    pub unit_price: Option<Decimal>,
}

/// Input for order creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub kind: OrderKind,
    /// Human-readable document number; must be unique across all orders.
    pub number: String,
    pub counterparty: PartyId,
    pub notes: Option<String>,
    pub lines: Vec<NewLine>,
}

/// Partial update of a draft/ongoing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub counterparty: Option<PartyId>,
    pub notes: Option<String>,
    /// Full replacement of the line list when present.
    pub lines: Option<Vec<NewLine>>,
}

/// Movement listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementQuery {
    Item(ItemId),
    Order(OrderId),
}

/// The order lifecycle / stock ledger engine.
///
/// Owns the item catalog, the order documents, and the ledger. Each operation
/// is synchronous: it completes or fails before returning, and failures leave
/// no partial state behind. Orders are independent of each other; the only
/// shared mutable resource is the per-item balance, serialized through
/// [`ItemLocks`] on every path that writes movements.
#[derive(Debug)]
pub struct Engine<L: StockLedger = InMemoryStockLedger> {
    items: RwLock<HashMap<ItemId, Item>>,
    orders: RwLock<HashMap<OrderId, Arc<Mutex<OrderDocument>>>>,
    numbers: Mutex<HashSet<String>>,
    ledger: L,
    item_locks: ItemLocks,
}

impl Engine<InMemoryStockLedger> {
    pub fn in_memory() -> Self {
        Self::new(InMemoryStockLedger::new())
    }
}

impl<L: StockLedger> Engine<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            numbers: Mutex::new(HashSet::new()),
            ledger,
            item_locks: ItemLocks::new(),
        }
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ---- catalog ----

    pub fn create_item(&self, new: NewItem, now: DateTime<Utc>) -> DomainResult<Item> {
        let item = Item::new(ItemId::new(AggregateId::new()), new, now)?;

        let mut items = self
            .items
            .write()
            .map_err(|_| DomainError::storage("item store lock poisoned"))?;
        items.insert(item.id_typed(), item.clone());
        Ok(item)
    }

    pub fn item(&self, item_id: ItemId) -> DomainResult<Item> {
        self.items
            .read()
            .map_err(|_| DomainError::storage("item store lock poisoned"))?
            .get(&item_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    /// Current on-hand quantity of a known item.
    pub fn item_on_hand(&self, item_id: ItemId) -> DomainResult<Decimal> {
        self.item(item_id)?;
        self.ledger.balance_of(item_id)
    }

    // ---- orders ----

    pub fn create_order(
        &self,
        new: NewOrder,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<OrderDocument> {
        let mut doc = OrderDocument::create(
            OrderId::new(AggregateId::new()),
            new.kind,
            new.number,
            new.counterparty,
            author,
            now,
        )?;

        if let Some(notes) = new.notes {
            doc.update_header(None, Some(notes))?;
        }
        for line in new.lines {
            let line = self.resolve_line(new.kind, line)?;
            doc.upsert_line(line)?;
        }

        {
            let mut numbers = self
                .numbers
                .lock()
                .map_err(|_| DomainError::storage("order number index poisoned"))?;
            if !numbers.insert(doc.number().to_string()) {
                return Err(DomainError::validation(format!(
                    "order number {} already in use",
                    doc.number()
                )));
            }
        }

        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::storage("order store lock poisoned"))?;
        orders.insert(doc.id_typed(), Arc::new(Mutex::new(doc.clone())));

        info!(order = %doc.id_typed(), kind = doc.kind().as_str(), number = doc.number(), "order created");
        Ok(doc)
    }

    pub fn get_order(&self, order_id: OrderId) -> DomainResult<OrderDocument> {
        let arc = self.order_arc(order_id)?;
        let doc = arc
            .lock()
            .map_err(|_| DomainError::storage("order lock poisoned"))?;
        Ok(doc.clone())
    }

    /// Patch header fields and/or replace the line list.
    ///
    /// Fails with `OrderLocked` once the order is finished or canceled, and
    /// with `ConcurrentModification` when `expected` no longer matches.
    pub fn update_order(
        &self,
        order_id: OrderId,
        expected: ExpectedVersion,
        patch: OrderPatch,
    ) -> DomainResult<OrderDocument> {
        let arc = self.order_arc(order_id)?;
        let mut doc = arc
            .lock()
            .map_err(|_| DomainError::storage("order lock poisoned"))?;

        expected.check(doc.version())?;

        if let Some(lines) = patch.lines {
            let lines = lines
                .into_iter()
                .map(|line| self.resolve_line(doc.kind(), line))
                .collect::<DomainResult<Vec<OrderLine>>>()?;
            doc.replace_lines(lines)?;
        }
        if patch.counterparty.is_some() || patch.notes.is_some() {
            doc.update_header(patch.counterparty, patch.notes)?;
        }

        Ok(doc.clone())
    }

    /// Drive an order through the lifecycle table.
    ///
    /// The finish edge is the commit: validation, the sale balance check, the
    /// batch append, and the status flip execute as one isolated unit under
    /// the order's lock plus the locks of every affected item. A failure at
    /// any point leaves the ledger, the balances, and the order untouched.
    pub fn transition_status(
        &self,
        order_id: OrderId,
        expected: ExpectedVersion,
        to: OrderStatus,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<OrderDocument> {
        let arc = self.order_arc(order_id)?;
        let mut doc = arc
            .lock()
            .map_err(|_| DomainError::storage("order lock poisoned"))?;

        expected.check(doc.version())?;
        let effect = doc.validate_transition(to)?;

        if effect == TransitionEffect::None {
            doc.apply_transition(to)?;
            info!(order = %order_id, status = %to, "order status changed");
            return Ok(doc.clone());
        }

        // Commit edge.
        doc.ensure_committable()?;

        let item_ids: Vec<ItemId> = doc.lines().iter().map(|l| l.item_id()).collect();
        let handles = self.item_locks.handles(&item_ids)?;
        let _guards = lock_all(&handles)?;

        if doc.kind() == OrderKind::Sale {
            for line in doc.lines() {
                let available = self.ledger.balance_of(line.item_id())?;
                if available < line.quantity() {
                    return Err(DomainError::insufficient_stock(
                        line.item_id().0,
                        line.quantity(),
                        available,
                    ));
                }
            }
        }

        let batch = movements_for_commit(&doc, author, now)?;
        let admitted = self.ledger.append(batch)?;
        doc.apply_transition(to)?;

        info!(
            order = %order_id,
            kind = doc.kind().as_str(),
            movements = admitted.len(),
            "order committed to the stock ledger"
        );
        Ok(doc.clone())
    }

    // ---- ledger access ----

    pub fn list_movements(
        &self,
        query: MovementQuery,
        sort: SortOrder,
        pagination: Pagination,
    ) -> DomainResult<MovementPage> {
        match query {
            MovementQuery::Item(item_id) => {
                self.ledger.movements_for_item(item_id, sort, pagination)
            }
            MovementQuery::Order(order_id) => {
                self.ledger.movements_for_order(order_id, sort, pagination)
            }
        }
    }

    /// Manual stock correction: an `Adjustment` movement with an explicit
    /// signed delta. Goes through the same append-only contract and the same
    /// no-negative-stock rule as commit-generated movements.
    pub fn append_adjustment(
        &self,
        item_id: ItemId,
        delta: Decimal,
        reason: impl Into<String>,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<StockMovement> {
        let item = self.item(item_id)?;

        let handles = self.item_locks.handles(&[item_id])?;
        let _guards = lock_all(&handles)?;

        let available = self.ledger.balance_of(item_id)?;
        if available + delta < Decimal::ZERO {
            return Err(DomainError::insufficient_stock(
                item_id.0,
                -delta,
                available,
            ));
        }

        let admitted = self.ledger.append(vec![PendingMovement {
            item_id,
            item_kind: item.kind(),
            movement_type: MovementType::Adjustment,
            quantity: delta,
            order_ref: None,
            reason: Some(reason.into()),
            author,
            occurred_at: now,
        }])?;

        info!(item = %item_id, %delta, "manual stock adjustment recorded");
        admitted
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::storage("ledger returned an empty batch"))
    }

    /// Customer return: strictly inbound, same contract as adjustments.
    pub fn append_return(
        &self,
        item_id: ItemId,
        quantity: Decimal,
        reason: impl Into<String>,
        author: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<StockMovement> {
        let item = self.item(item_id)?;
        if quantity <= Decimal::ZERO {
            return Err(DomainError::validation("return quantity must be positive"));
        }

        let handles = self.item_locks.handles(&[item_id])?;
        let _guards = lock_all(&handles)?;

        let admitted = self.ledger.append(vec![PendingMovement {
            item_id,
            item_kind: item.kind(),
            movement_type: MovementType::ReturnIn,
            quantity,
            order_ref: None,
            reason: Some(reason.into()),
            author,
            occurred_at: now,
        }])?;

        info!(item = %item_id, %quantity, "sale return recorded");
        admitted
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::storage("ledger returned an empty batch"))
    }

    /// Record a production run: raw/semi-finished inputs out, produced goods
    /// in, as one atomic batch. Inputs must be covered by on-hand balances.
    pub fn record_production(
        &self,
        consumed: &[(ItemId, Decimal)],
        produced: &[(ItemId, Decimal)],
        author: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<StockMovement>> {
        if consumed.is_empty() && produced.is_empty() {
            return Err(DomainError::validation("production run has no movements"));
        }
        for (_, quantity) in consumed.iter().chain(produced) {
            if *quantity <= Decimal::ZERO {
                return Err(DomainError::validation(
                    "production quantities must be positive",
                ));
            }
        }

        let mut batch = Vec::with_capacity(consumed.len() + produced.len());
        for &(item_id, quantity) in consumed {
            batch.push(PendingMovement {
                item_id,
                item_kind: self.item(item_id)?.kind(),
                movement_type: MovementType::ProductionOut,
                quantity,
                order_ref: None,
                reason: None,
                author,
                occurred_at: now,
            });
        }
        for &(item_id, quantity) in produced {
            batch.push(PendingMovement {
                item_id,
                item_kind: self.item(item_id)?.kind(),
                movement_type: MovementType::ProductionIn,
                quantity,
                order_ref: None,
                reason: None,
                author,
                occurred_at: now,
            });
        }

        let all_items: Vec<ItemId> = batch.iter().map(|m| m.item_id).collect();
        let handles = self.item_locks.handles(&all_items)?;
        let _guards = lock_all(&handles)?;

        // Sum consumption per item before checking; an input may repeat.
        let mut required: HashMap<ItemId, Decimal> = HashMap::new();
        for &(item_id, quantity) in consumed {
            *required.entry(item_id).or_default() += quantity;
        }
        for (item_id, quantity) in required {
            let available = self.ledger.balance_of(item_id)?;
            if available < quantity {
                return Err(DomainError::insufficient_stock(
                    item_id.0,
                    quantity,
                    available,
                ));
            }
        }

        let admitted = self.ledger.append(batch)?;
        info!(movements = admitted.len(), "production run recorded");
        Ok(admitted)
    }

    /// Recompute every balance from the log and report any cache drift.
    pub fn audit_balances(&self) -> DomainResult<Vec<BalanceDrift>> {
        BalanceProjector::verify(&self.ledger)
    }

    // ---- internals ----

    fn order_arc(&self, order_id: OrderId) -> DomainResult<Arc<Mutex<OrderDocument>>> {
        self.orders
            .read()
            .map_err(|_| DomainError::storage("order store lock poisoned"))?
            .get(&order_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }

    fn resolve_line(&self, kind: OrderKind, line: NewLine) -> DomainResult<OrderLine> {
        let item = self.item(line.item_id).map_err(|_| {
            DomainError::invalid_line(format!("unknown item {}", line.item_id))
        })?;

        let unit_cost = item.unit_cost();
        let unit_price = match kind {
            OrderKind::Purchase => unit_cost,
            OrderKind::Sale => line.unit_price.unwrap_or(unit_cost),
        };

        OrderLine::new(line.item_id, item.kind(), line.quantity, unit_cost, unit_price)
    }
}
