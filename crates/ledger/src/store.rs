use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;

use paintstock_core::{AggregateId, DomainError, DomainResult};
use paintstock_inventory::ItemId;
use paintstock_orders::OrderId;

use crate::movement::{MovementId, PendingMovement, StockMovement};
use crate::query::{MovementPage, Pagination, SortOrder};

/// Append-only stock ledger.
///
/// `append` is the single mutation path for stock. A batch is all-or-nothing:
/// either every record is durably visible with the cached balances adjusted,
/// or the batch has no visible effect. Records are never updated or deleted.
///
/// The ledger applies no business rules beyond well-formedness; checking that
/// a sale will not oversell is the commit path's job, done *before* calling
/// `append` and under the same item locks.
pub trait StockLedger: Send + Sync {
    /// Atomically admit a batch, assigning sequence numbers in batch order.
    fn append(&self, batch: Vec<PendingMovement>) -> DomainResult<Vec<StockMovement>>;

    /// Current cached balance; zero for an item with no movements.
    fn balance_of(&self, item_id: ItemId) -> DomainResult<Decimal>;

    /// Snapshot of every cached balance.
    fn balances(&self) -> DomainResult<HashMap<ItemId, Decimal>>;

    /// Movements for one item, ordered by sequence.
    fn movements_for_item(
        &self,
        item_id: ItemId,
        sort: SortOrder,
        pagination: Pagination,
    ) -> DomainResult<MovementPage>;

    /// Movements generated by one order, ordered by sequence.
    fn movements_for_order(
        &self,
        order_id: OrderId,
        sort: SortOrder,
        pagination: Pagination,
    ) -> DomainResult<MovementPage>;

    /// Full log in sequence order, for audit and projection rebuilds.
    fn all_movements(&self) -> DomainResult<Vec<StockMovement>>;
}

#[derive(Debug, Default)]
struct LedgerState {
    movements: Vec<StockMovement>,
    balances: HashMap<ItemId, Decimal>,
    next_sequence: u64,
}

/// In-memory append-only ledger.
///
/// Log and cached balances live under one `RwLock`, so a batch append and
/// its balance updates are a single critical section.
#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.state
            .read()
            .map_err(|_| DomainError::storage("ledger lock poisoned"))
    }
}

impl StockLedger for InMemoryStockLedger {
    fn append(&self, batch: Vec<PendingMovement>) -> DomainResult<Vec<StockMovement>> {
        if batch.is_empty() {
            return Ok(vec![]);
        }

        // Validate the whole batch before touching state; a malformed record
        // anywhere means nothing is admitted.
        for pending in &batch {
            pending.validate()?;
        }

        let mut state = self
            .state
            .write()
            .map_err(|_| DomainError::storage("ledger lock poisoned"))?;

        let mut admitted = Vec::with_capacity(batch.len());
        for pending in batch {
            state.next_sequence += 1;
            let movement = StockMovement {
                id: MovementId::new(AggregateId::new()),
                sequence: state.next_sequence,
                item_id: pending.item_id,
                item_kind: pending.item_kind,
                movement_type: pending.movement_type,
                quantity: pending.quantity,
                order_ref: pending.order_ref,
                reason: pending.reason,
                author: pending.author,
                recorded_at: pending.occurred_at,
            };

            *state.balances.entry(movement.item_id).or_default() += movement.signed_effect();
            state.movements.push(movement.clone());
            admitted.push(movement);
        }

        Ok(admitted)
    }

    fn balance_of(&self, item_id: ItemId) -> DomainResult<Decimal> {
        Ok(self
            .read()?
            .balances
            .get(&item_id)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    fn balances(&self) -> DomainResult<HashMap<ItemId, Decimal>> {
        Ok(self.read()?.balances.clone())
    }

    fn movements_for_item(
        &self,
        item_id: ItemId,
        sort: SortOrder,
        pagination: Pagination,
    ) -> DomainResult<MovementPage> {
        let filtered: Vec<StockMovement> = self
            .read()?
            .movements
            .iter()
            .filter(|m| m.item_id == item_id)
            .cloned()
            .collect();
        Ok(MovementPage::paginate(filtered, sort, pagination))
    }

    fn movements_for_order(
        &self,
        order_id: OrderId,
        sort: SortOrder,
        pagination: Pagination,
    ) -> DomainResult<MovementPage> {
        let filtered: Vec<StockMovement> = self
            .read()?
            .movements
            .iter()
            .filter(|m| m.order_ref == Some(order_id))
            .cloned()
            .collect();
        Ok(MovementPage::paginate(filtered, sort, pagination))
    }

    fn all_movements(&self) -> DomainResult<Vec<StockMovement>> {
        Ok(self.read()?.movements.clone())
    }
}
