//! Pricing math for order lines.
//!
//! Pure functions, no stored state. Whatever layer needs a live total calls
//! in here; nothing is recomputed reactively or cached.

pub mod calc;

pub use calc::{
    line_subtotal, margin_from_prices, order_totals, selling_price_from_margin, LinePricing,
    OrderTotals,
};
