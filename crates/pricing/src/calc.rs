use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing inputs of one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub unit_price: Decimal,
}

/// Aggregated amounts over a set of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub total_quantity: Decimal,
    pub total_cost: Decimal,
    pub revenue: Decimal,
    pub profit: Decimal,
    /// Profit over cost, in percent. Zero when total cost is zero.
    pub margin_percent: Decimal,
}

/// `cost * (1 + margin / 100)`.
///
/// Editing the margin field recomputes the price through this; editing the
/// price recomputes the margin through [`margin_from_prices`]. Never both
/// independently, so the two fields cannot diverge.
pub fn selling_price_from_margin(cost: Decimal, margin_percent: Decimal) -> Decimal {
    cost * (Decimal::ONE + margin_percent / Decimal::ONE_HUNDRED)
}

/// `(price - cost) / cost * 100`, or zero for zero cost.
pub fn margin_from_prices(cost: Decimal, selling_price: Decimal) -> Decimal {
    if cost.is_zero() {
        Decimal::ZERO
    } else {
        (selling_price - cost) / cost * Decimal::ONE_HUNDRED
    }
}

/// `quantity * unit_price`.
pub fn line_subtotal(quantity: Decimal, unit_price: Decimal) -> Decimal {
    quantity * unit_price
}

/// Fold line amounts into order-level totals.
pub fn order_totals<I>(lines: I) -> OrderTotals
where
    I: IntoIterator<Item = LinePricing>,
{
    let mut total_quantity = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut revenue = Decimal::ZERO;

    for line in lines {
        total_quantity += line.quantity;
        total_cost += line.quantity * line.unit_cost;
        revenue += line_subtotal(line.quantity, line.unit_price);
    }

    let profit = revenue - total_cost;
    let margin_percent = if total_cost.is_zero() {
        Decimal::ZERO
    } else {
        profit / total_cost * Decimal::ONE_HUNDRED
    };

    OrderTotals {
        total_quantity,
        total_cost,
        revenue,
        profit,
        margin_percent,
    }
}
