//! Append-only stock ledger.
//!
//! Every change to stock is one immutable [`movement::StockMovement`] record;
//! the only mutation path is "append a new movement". Cached per-item
//! balances are updated in the same critical section as the append, and the
//! [`projector::BalanceProjector`] can always rebuild them from the log.

pub mod movement;
pub mod projector;
pub mod query;
pub mod store;

pub use movement::{
    movements_for_commit, MovementId, MovementType, PendingMovement, StockMovement,
};
pub use projector::{BalanceDrift, BalanceProjector};
pub use query::{MovementPage, Pagination, SortOrder};
pub use store::{InMemoryStockLedger, StockLedger};
