//! Optimistic concurrency expectation for mutable documents.

use crate::error::{DomainError, DomainResult};

/// Version expectation supplied by a caller alongside a mutation.
///
/// A caller that read an order at version `n` passes `Exact(n)`; if another
/// caller got a mutation in first, the check fails with
/// `ConcurrentModification` and the caller retries from a fresh read.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (useful for idempotent operations, migrations, etc.).
    Any,
    /// Require the document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::concurrent_modification(format!(
                "expected version {self:?}, actual {actual}"
            )))
        }
    }
}
