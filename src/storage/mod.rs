//! Store seams for the racing schema.
//!
//! Domain logic talks to the relational store only through [`RacingStore`]
//! (connection-level reads and `begin`) and [`StoreTx`] (statements executed in
//! a caller-controlled transaction). Dropping a [`StoreTx`] without calling
//! `commit` rolls it back.

pub mod memory;
pub mod postgres;

pub use memory::{FaultPoint, MemoryStore, MemoryTables};
pub use postgres::PostgresStore;

use crate::domain::archive::ArchivedHorse;
use crate::domain::error::DomainResult;
use crate::domain::ids::IdClass;
use crate::domain::model::{
    ApplicationDecision, Horse, Owner, OwnerHorse, OwnerSummary, Race, RaceResult, Trainer,
    TrainerApplication,
};
use crate::domain::reports::{
    OwnedHorseRow, RaceResultView, TrackStatsRow, TrainerWinningsRow, WinningTrainerRow,
};
use async_trait::async_trait;

#[async_trait]
pub trait RacingStore: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self) -> DomainResult<Box<dyn StoreTx>>;

    /// Cheap connectivity check.
    async fn ping(&self) -> DomainResult<()>;

    async fn owners_overview(&self) -> DomainResult<Vec<OwnerSummary>>;

    /// Horses linked to `owner_id`, or `None` when the owner does not exist.
    async fn owner_horses(&self, owner_id: &str) -> DomainResult<Option<Vec<OwnerHorse>>>;

    async fn pending_applications(&self) -> DomainResult<Vec<TrainerApplication>>;

    async fn archived_horses(&self) -> DomainResult<Vec<ArchivedHorse>>;

    async fn horses_by_owner(&self, lname_fragment: &str) -> DomainResult<Vec<OwnedHorseRow>>;

    async fn winning_trainers(&self) -> DomainResult<Vec<WinningTrainerRow>>;

    async fn trainer_winnings(&self) -> DomainResult<Vec<TrainerWinningsRow>>;

    async fn track_stats(&self) -> DomainResult<Vec<TrackStatsRow>>;
}

#[async_trait]
pub trait StoreTx: Send {
    /// Reads the owner and holds a write lock on it until the transaction ends.
    async fn lock_owner(&mut self, owner_id: &str) -> DomainResult<Option<Owner>>;

    /// Locks every horse currently linked to `owner_id`, in id order.
    async fn lock_horses_of_owner(&mut self, owner_id: &str) -> DomainResult<Vec<String>>;

    async fn delete_ownership_of_owner(&mut self, owner_id: &str) -> DomainResult<u64>;

    /// Horses with no ownership edge at all, as seen by this transaction.
    async fn orphaned_horses(&mut self) -> DomainResult<Vec<String>>;

    async fn delete_results_of_horse(&mut self, horse_id: &str) -> DomainResult<u64>;

    async fn delete_ownership_of_horse(&mut self, horse_id: &str) -> DomainResult<u64>;

    /// Deletes the horse row. The archive entry is written as part of the delete.
    async fn delete_horse(&mut self, horse_id: &str) -> DomainResult<bool>;

    async fn delete_owner(&mut self, owner_id: &str) -> DomainResult<bool>;

    async fn lock_horse(&mut self, horse_id: &str) -> DomainResult<Option<Horse>>;

    async fn horse_exists(&mut self, horse_id: &str) -> DomainResult<bool>;

    async fn stable_exists(&mut self, stable_id: &str) -> DomainResult<bool>;

    async fn track_exists(&mut self, track_name: &str) -> DomainResult<bool>;

    async fn update_horse_stable(&mut self, horse_id: &str, stable_id: &str) -> DomainResult<u64>;

    /// Highest numeric suffix stored for `class`, or `None` when there is none.
    async fn max_id_suffix(&mut self, class: IdClass) -> DomainResult<Option<u64>>;

    /// Fails with `AllocationConflict` if `race.race_id` already exists.
    async fn insert_race(&mut self, race: &Race) -> DomainResult<()>;

    async fn insert_race_result(&mut self, result: &RaceResult) -> DomainResult<()>;

    /// Results of one race as this transaction sees them, highest prize first.
    async fn race_results(&mut self, race_id: &str) -> DomainResult<Vec<RaceResultView>>;

    /// Fails with `AllocationConflict` if `trainer.trainer_id` already exists.
    async fn insert_trainer(&mut self, trainer: &Trainer) -> DomainResult<()>;

    async fn lock_application(&mut self, app_id: i64) -> DomainResult<Option<TrainerApplication>>;

    /// Writes the decision onto one pending application; returns rows updated.
    async fn decide_application(
        &mut self,
        app_id: i64,
        decision: &ApplicationDecision,
    ) -> DomainResult<u64>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

/// Commits `tx` when `outcome` is `Ok`, otherwise rolls it back and returns
/// the original error.
pub async fn settle<T: Send>(
    tx: Box<dyn StoreTx>,
    outcome: DomainResult<T>,
    operation: &'static str,
) -> DomainResult<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(operation, error = %rb, "rollback failed");
            }
            tracing::warn!(operation, error = %err, "transaction rolled back");
            Err(err)
        }
    }
}
