//! Application engine: the narrow operation surface the admin screens call.
//!
//! Everything above this crate (forms, tables, dialogs, auth) is an external
//! collaborator; everything below (documents, ledger, pricing) is pure domain
//! code. The engine wires them together and owns the one piece of shared
//! mutable state that needs serialization: item balances during a commit.

pub mod engine;
pub mod locks;


pub use engine::{Engine, MovementQuery, NewLine, NewOrder, OrderPatch};
pub use locks::ItemLocks;
