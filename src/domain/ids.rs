//! Sequential, prefixed identifiers for races and trainers.
//!
//! The next identifier is the highest stored numeric suffix plus one. Reading
//! the maximum and inserting are two statements, so concurrent callers can mint
//! the same identifier; the primary key rejects the loser with
//! [`DomainError::AllocationConflict`] and [`allocate_with_retry`] runs the whole
//! attempt again in a fresh transaction.

use crate::domain::error::{DomainError, DomainResult};
use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdClass {
    Race,
    Trainer,
}

impl IdClass {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdClass::Race => "race",
            IdClass::Trainer => "trainer",
        }
    }

    /// Numeric suffix of `id` under this class' prefix.
    ///
    /// Returns `None` for identifiers with another prefix or a non-numeric tail
    /// (`race`, `race7b`), which are ignored when computing the maximum.
    pub fn suffix_of(&self, id: &str) -> Option<u64> {
        let tail = id.strip_prefix(self.prefix())?;
        if tail.is_empty() || !tail.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        tail.parse().ok()
    }

    /// Highest suffix among `ids`, or `None` when none match.
    pub fn max_suffix<'a>(&self, ids: impl IntoIterator<Item = &'a str>) -> Option<u64> {
        ids.into_iter().filter_map(|id| self.suffix_of(id)).max()
    }
}

/// Formats the identifier following `current_max` (no zero padding).
///
/// Fails when `current_max` is already the largest representable suffix.
pub fn next_id(class: IdClass, current_max: Option<u64>) -> DomainResult<String> {
    let next = current_max.unwrap_or(0).checked_add(1).ok_or_else(|| {
        DomainError::IntegrityViolation(format!("{} id space exhausted", class.prefix()))
    })?;
    Ok(format!("{}{}", class.prefix(), next))
}

/// Runs `attempt` until it succeeds, fails with something other than an
/// allocation conflict, or `max_attempts` is used up.
///
/// Each attempt must be a complete transaction: read the maximum, insert, commit.
pub async fn allocate_with_retry<T, F, Fut>(
    class: IdClass,
    max_attempts: u32,
    mut attempt: F,
) -> DomainResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut n = 1;
    loop {
        match attempt(n).await {
            Err(DomainError::AllocationConflict { id }) if n < max_attempts => {
                tracing::warn!(
                    prefix = class.prefix(),
                    %id,
                    attempt = n,
                    "identifier collided on insert, retrying allocation"
                );
                n += 1;
            }
            other => return other,
        }
    }
}
