use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paintstock_core::{AggregateId, DomainError, DomainResult, Entity};

/// Inventory item identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub AggregateId);

impl ItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for ItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// The four concrete stocked kinds in a paint plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    RawMaterial,
    SemiFinishedGood,
    FinishedGood,
    PaintAccessory,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::RawMaterial => "raw_material",
            ItemKind::SemiFinishedGood => "semi_finished_good",
            ItemKind::FinishedGood => "finished_good",
            ItemKind::PaintAccessory => "paint_accessory",
        }
    }
}

/// Input for item registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub kind: ItemKind,
    pub name: String,
    /// Unit of measure as free text (kg, liter, pail, ...).
    pub unit: String,
    pub unit_cost: Decimal,
}

/// Catalog entry for a stocked item.
///
/// Immutable descriptive data only; on-hand quantity lives in the ledger's
/// balance store and is never hand-edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    kind: ItemKind,
    name: String,
    unit: String,
    unit_cost: Decimal,
    created_at: DateTime<Utc>,
}

impl Item {
    pub fn new(id: ItemId, new: NewItem, created_at: DateTime<Utc>) -> DomainResult<Self> {
        if new.name.trim().is_empty() {
            return Err(DomainError::validation("item name cannot be empty"));
        }
        if new.unit_cost < Decimal::ZERO {
            return Err(DomainError::validation("unit cost cannot be negative"));
        }

        Ok(Self {
            id,
            kind: new.kind,
            name: new.name,
            unit: new.unit,
            unit_cost: new.unit_cost,
            created_at,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for Item {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
