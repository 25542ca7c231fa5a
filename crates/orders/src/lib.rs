//! Purchase and sale order documents and their lifecycle rules.
//!
//! The two document kinds are structurally identical: a header, an ordered
//! list of lines, and a status driven through one transition table. All the
//! "disable this button once finished" behavior scattered across the admin
//! screens collapses into [`lifecycle::validate_transition`] and the lock
//! checks on [`document::OrderDocument`].

pub mod document;
pub mod lifecycle;

pub use document::{OrderDocument, OrderId, OrderKind, OrderLine};
pub use lifecycle::{validate_transition, OrderStatus, TransitionEffect};
