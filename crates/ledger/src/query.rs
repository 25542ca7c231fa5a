//! Read-only movement queries: pagination and ordering.

use serde::{Deserialize, Serialize};

use crate::movement::StockMovement;

/// Pagination parameters for movement queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of movements to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Caller-selectable ordering by creation time (sequence order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Paginated movement query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementPage {
    /// The movements on this page.
    pub movements: Vec<StockMovement>,
    /// Total number of movements matching the filter (across all pages).
    pub total: u64,
    /// Pagination parameters used.
    pub pagination: Pagination,
    /// Whether there are more movements available.
    pub has_more: bool,
}

impl MovementPage {
    /// Slice a fully filtered, ascending-by-sequence list into one page.
    pub(crate) fn paginate(
        mut filtered: Vec<StockMovement>,
        sort: SortOrder,
        pagination: Pagination,
    ) -> Self {
        if sort == SortOrder::Desc {
            filtered.reverse();
        }

        let total = filtered.len() as u64;
        let start = (pagination.offset as usize).min(filtered.len());
        let end = (start + pagination.limit as usize).min(filtered.len());
        let has_more = end < filtered.len();

        Self {
            movements: filtered[start..end].to_vec(),
            total,
            pagination,
            has_more,
        }
    }
}
