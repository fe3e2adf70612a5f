//! Append-only history of deleted horses.
//!
//! Every horse deletion produces exactly one [`ArchivedHorse`], written inside
//! the deleting transaction. PostgreSQL does this with the `trg_horse_to_old_info`
//! row trigger (see `migrations/`), so any statement that deletes a horse is
//! covered. The in-process store routes every horse removal through
//! [`ArchiveLog::record_deletion`].

use crate::domain::model::Horse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Snapshot of a horse row at the moment it was deleted.
///
/// Only `horse_id`, `horse_name` and `registration` are guaranteed; everything
/// else may be missing for partially-known rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArchivedHorse {
    pub horse_id: String,
    pub horse_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub registration: i32,
    pub stable_id: Option<String>,
    pub deleted_at: DateTime<Utc>,
}

impl ArchivedHorse {
    pub fn capture(horse: &Horse, deleted_at: DateTime<Utc>) -> Self {
        Self {
            horse_id: horse.horse_id.clone(),
            horse_name: horse.horse_name.clone(),
            age: horse.age,
            gender: horse.gender.clone(),
            registration: horse.registration,
            stable_id: Some(horse.stable_id.clone()),
            deleted_at,
        }
    }
}

/// Append-only archive. There is deliberately no way to edit or remove entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveLog {
    entries: Vec<ArchivedHorse>,
}

impl ArchiveLog {
    /// Records the deletion of `horse`, stamping it with the store's clock.
    pub fn record_deletion(&mut self, horse: &Horse) -> &ArchivedHorse {
        self.entries.push(ArchivedHorse::capture(horse, Utc::now()));
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[ArchivedHorse] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horse(id: &str) -> Horse {
        Horse {
            horse_id: id.to_string(),
            horse_name: format!("Horse {}", id),
            age: None,
            gender: None,
            registration: 1001,
            stable_id: "stable1".to_string(),
        }
    }

    #[test]
    fn record_deletion_appends_and_stamps() {
        let before = Utc::now();
        let mut log = ArchiveLog::default();
        log.record_deletion(&horse("H1"));
        let entry = log.record_deletion(&horse("H2")).clone();

        assert_eq!(log.len(), 2);
        assert_eq!(entry.horse_id, "H2");
        assert_eq!(entry.age, None);
        assert!(entry.deleted_at >= before);
        assert_eq!(log.entries()[0].horse_id, "H1");
    }
}
