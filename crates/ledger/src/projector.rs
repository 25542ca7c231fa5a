//! Balance projection: rebuild per-item balances from the movement log.
//!
//! The cached balances the ledger maintains are a disposable read model; the
//! log is the source of truth. This module is the independent verification
//! path that proves the cache never drifts from the append-only log.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use paintstock_core::DomainResult;
use paintstock_inventory::ItemId;

use crate::movement::StockMovement;
use crate::store::StockLedger;

/// A cached balance that disagrees with the recomputed fold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceDrift {
    pub item_id: ItemId,
    pub cached: Decimal,
    pub recomputed: Decimal,
}

/// Folds movements into balances. Stateless; a namespace for the rebuild
/// and verification passes.
#[derive(Debug)]
pub struct BalanceProjector;

impl BalanceProjector {
    /// `balance(item) = sum of signed effects of its movements, in sequence order`.
    pub fn project(movements: &[StockMovement]) -> HashMap<ItemId, Decimal> {
        let mut balances: HashMap<ItemId, Decimal> = HashMap::new();
        for movement in movements {
            *balances.entry(movement.item_id).or_default() += movement.signed_effect();
        }
        balances
    }

    /// Recompute from the full log and compare against the cached balances.
    /// An empty result means the cache is exact.
    pub fn verify(ledger: &dyn StockLedger) -> DomainResult<Vec<BalanceDrift>> {
        let cached = ledger.balances()?;
        let recomputed = Self::project(&ledger.all_movements()?);

        let items: HashSet<ItemId> = cached.keys().chain(recomputed.keys()).copied().collect();

        let mut drifts: Vec<BalanceDrift> = items
            .into_iter()
            .filter_map(|item_id| {
                let cached = cached.get(&item_id).copied().unwrap_or(Decimal::ZERO);
                let recomputed = recomputed.get(&item_id).copied().unwrap_or(Decimal::ZERO);
                (cached != recomputed).then_some(BalanceDrift {
                    item_id,
                    cached,
                    recomputed,
                })
            })
            .collect();
        drifts.sort_by_key(|d| d.item_id);
        Ok(drifts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{MovementType, PendingMovement};
    use crate::store::InMemoryStockLedger;
    use chrono::Utc;
    use paintstock_core::{AggregateId, UserId};
    use paintstock_inventory::ItemKind;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn pending(item_id: ItemId, movement_type: MovementType, quantity: Decimal) -> PendingMovement {
        PendingMovement {
            item_id,
            item_kind: ItemKind::RawMaterial,
            movement_type,
            quantity,
            order_ref: None,
            reason: None,
            author: UserId::new(),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn projection_of_empty_log_is_empty() {
        assert!(BalanceProjector::project(&[]).is_empty());
    }

    #[test]
    fn verify_reports_no_drift_for_a_fresh_ledger() {
        let ledger = InMemoryStockLedger::new();
        let item = ItemId::new(AggregateId::new());

        ledger
            .append(vec![
                pending(item, MovementType::PurchaseIn, dec!(12)),
                pending(item, MovementType::SaleOut, dec!(5)),
                pending(item, MovementType::Adjustment, dec!(-0.25)),
            ])
            .unwrap();

        assert!(BalanceProjector::verify(&ledger).unwrap().is_empty());
        let recomputed = BalanceProjector::project(&ledger.all_movements().unwrap());
        assert_eq!(recomputed[&item], dec!(6.75));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any movement sequence, the cached balance equals the
        /// signed fold of the log, for every item.
        #[test]
        fn cached_balance_equals_fold_of_the_log(
            ops in prop::collection::vec((0usize..3, 0u8..4, 1i64..10_000i64), 1..40)
        ) {
            let ledger = InMemoryStockLedger::new();
            let items: Vec<ItemId> = (0..3).map(|_| ItemId::new(AggregateId::new())).collect();

            for (item_idx, type_idx, magnitude) in ops {
                let quantity = Decimal::new(magnitude, 2);
                let movement = match type_idx {
                    0 => pending(items[item_idx], MovementType::PurchaseIn, quantity),
                    1 => pending(items[item_idx], MovementType::SaleOut, quantity),
                    2 => pending(items[item_idx], MovementType::ReturnIn, quantity),
                    _ => pending(items[item_idx], MovementType::Adjustment, -quantity),
                };
                ledger.append(vec![movement]).unwrap();
            }

            let drifts = BalanceProjector::verify(&ledger).unwrap();
            prop_assert!(drifts.is_empty(), "cache drifted: {drifts:?}");

            let recomputed = BalanceProjector::project(&ledger.all_movements().unwrap());
            for item in &items {
                let cached = ledger.balance_of(*item).unwrap();
                let folded = recomputed.get(item).copied().unwrap_or(Decimal::ZERO);
                prop_assert_eq!(cached, folded);
            }
        }
    }
}
