//! Inventory catalog: the items stock is tracked for.
//!
//! An item's *current quantity* is not stored here. It is a cached projection
//! owned by the stock ledger, whose `append` is its only writer.

pub mod item;

pub use item::{Item, ItemId, ItemKind, NewItem};
