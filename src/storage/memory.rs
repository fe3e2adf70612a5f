//! In-process racing store.
//!
//! Transactions are fully serialized: `begin` takes the store's async mutex and
//! holds it until the transaction ends, working on a private copy of the
//! tables. `commit` swaps the copy in; rollback (or drop) throws it away. This
//! gives the same atomicity and read-your-writes guarantees the PostgreSQL
//! store provides, which makes it suitable for tests, demos and the
//! `contention_test` binary.
//!
//! Faults can be armed with [`MemoryStore::arm_fault`] to fail a transaction at
//! a chosen statement.

use crate::domain::archive::{ArchiveLog, ArchivedHorse};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::IdClass;
use crate::domain::model::{
    ApplicationDecision, ApplicationStatus, FinishPosition, Horse, Owner, OwnerHorse, OwnerSummary,
    Race,
    RaceResult, Stable, Trainer, TrainerApplication,
};
use crate::domain::reports::{
    OwnedHorseRow, RaceResultView, TrackStatsRow, TrainerWinningsRow, WinningTrainerRow,
};
use crate::storage::{RacingStore, StoreTx};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Statement at which an armed fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultPoint {
    DeleteOwnership = 1,
    OrphanScan = 2,
    DeleteHorse = 3,
    DeleteOwner = 4,
    InsertRaceResult = 5,
    Commit = 6,
    ReadRaceResults = 7,
}

const NO_FAULT: u8 = 0;

/// Committed state of the in-process store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryTables {
    owners: BTreeMap<String, Owner>,
    stables: BTreeMap<String, Stable>,
    tracks: BTreeSet<String>,
    horses: BTreeMap<String, Horse>,
    /// (owner_id, horse_id)
    owns: BTreeSet<(String, String)>,
    races: BTreeMap<String, Race>,
    /// Keyed by (race_id, horse_id).
    results: BTreeMap<(String, String), RaceResult>,
    trainers: BTreeMap<String, Trainer>,
    applications: BTreeMap<i64, TrainerApplication>,
    archive: ArchiveLog,
    last_app_id: i64,
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stable(&mut self, stable_id: &str, stable_name: &str) -> &mut Self {
        self.stables.insert(
            stable_id.to_string(),
            Stable {
                stable_id: stable_id.to_string(),
                stable_name: stable_name.to_string(),
            },
        );
        self
    }

    pub fn add_track(&mut self, track_name: &str) -> &mut Self {
        self.tracks.insert(track_name.to_string());
        self
    }

    pub fn add_owner(&mut self, owner_id: &str, fname: &str, lname: &str) -> &mut Self {
        self.owners.insert(
            owner_id.to_string(),
            Owner {
                owner_id: owner_id.to_string(),
                fname: fname.to_string(),
                lname: lname.to_string(),
            },
        );
        self
    }

    pub fn add_horse(&mut self, horse: Horse) -> DomainResult<&mut Self> {
        if !self.stables.contains_key(&horse.stable_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "horse '{}' references unknown stable '{}'",
                horse.horse_id, horse.stable_id
            )));
        }
        self.horses.insert(horse.horse_id.clone(), horse);
        Ok(self)
    }

    pub fn add_ownership(&mut self, owner_id: &str, horse_id: &str) -> DomainResult<&mut Self> {
        if !self.owners.contains_key(owner_id) || !self.horses.contains_key(horse_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "ownership ({}, {}) references a missing owner or horse",
                owner_id, horse_id
            )));
        }
        self.owns
            .insert((owner_id.to_string(), horse_id.to_string()));
        Ok(self)
    }

    pub fn add_race(&mut self, race: Race) -> DomainResult<&mut Self> {
        self.put_race(&race)?;
        Ok(self)
    }

    pub fn add_result(&mut self, result: RaceResult) -> DomainResult<&mut Self> {
        self.put_result(&result)?;
        Ok(self)
    }

    pub fn add_trainer(&mut self, trainer: Trainer) -> DomainResult<&mut Self> {
        self.put_trainer(&trainer)?;
        Ok(self)
    }

    /// Files a pending application and returns its id.
    pub fn submit_application(
        &mut self,
        fname: &str,
        lname: &str,
        stable_id: &str,
        requested_at: DateTime<Utc>,
    ) -> DomainResult<i64> {
        if !self.stables.contains_key(stable_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "application references unknown stable '{}'",
                stable_id
            )));
        }
        self.last_app_id += 1;
        let app_id = self.last_app_id;
        self.applications.insert(
            app_id,
            TrainerApplication {
                app_id,
                fname: fname.to_string(),
                lname: lname.to_string(),
                stable_id: stable_id.to_string(),
                requested_at,
                status: ApplicationStatus::Pending,
                decided_at: None,
                decision_by: None,
                decision_reason: None,
                approved_trainer_id: None,
            },
        );
        Ok(app_id)
    }

    pub fn owner(&self, owner_id: &str) -> Option<&Owner> {
        self.owners.get(owner_id)
    }

    pub fn horse(&self, horse_id: &str) -> Option<&Horse> {
        self.horses.get(horse_id)
    }

    pub fn race(&self, race_id: &str) -> Option<&Race> {
        self.races.get(race_id)
    }

    pub fn trainer(&self, trainer_id: &str) -> Option<&Trainer> {
        self.trainers.get(trainer_id)
    }

    pub fn application(&self, app_id: i64) -> Option<&TrainerApplication> {
        self.applications.get(&app_id)
    }

    pub fn owns(&self, owner_id: &str, horse_id: &str) -> bool {
        self.owns
            .contains(&(owner_id.to_string(), horse_id.to_string()))
    }

    pub fn owner_count(&self, horse_id: &str) -> usize {
        self.owns.iter().filter(|(_, h)| h == horse_id).count()
    }

    pub fn results_of_horse(&self, horse_id: &str) -> Vec<&RaceResult> {
        self.results
            .values()
            .filter(|r| r.horse_id == horse_id)
            .collect()
    }

    pub fn archive(&self) -> &[ArchivedHorse] {
        self.archive.entries()
    }

    fn put_race(&mut self, race: &Race) -> DomainResult<()> {
        if self.races.contains_key(&race.race_id) {
            return Err(DomainError::AllocationConflict {
                id: race.race_id.clone(),
            });
        }
        if !self.tracks.contains(&race.track_name) {
            return Err(DomainError::IntegrityViolation(format!(
                "race '{}' references unknown track '{}'",
                race.race_id, race.track_name
            )));
        }
        self.races.insert(race.race_id.clone(), race.clone());
        Ok(())
    }

    fn put_result(&mut self, result: &RaceResult) -> DomainResult<()> {
        if !self.races.contains_key(&result.race_id) || !self.horses.contains_key(&result.horse_id)
        {
            return Err(DomainError::IntegrityViolation(format!(
                "result ({}, {}) references a missing race or horse",
                result.race_id, result.horse_id
            )));
        }
        if !(result.prize >= 0.0) {
            return Err(DomainError::IntegrityViolation(format!(
                "prize {} violates prize >= 0",
                result.prize
            )));
        }
        let key = (result.race_id.clone(), result.horse_id.clone());
        if self.results.contains_key(&key) {
            return Err(DomainError::IntegrityViolation(format!(
                "duplicate result ({}, {})",
                key.0, key.1
            )));
        }
        self.results.insert(key, result.clone());
        Ok(())
    }

    fn put_trainer(&mut self, trainer: &Trainer) -> DomainResult<()> {
        if self.trainers.contains_key(&trainer.trainer_id) {
            return Err(DomainError::AllocationConflict {
                id: trainer.trainer_id.clone(),
            });
        }
        if !self.stables.contains_key(&trainer.stable_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "trainer '{}' references unknown stable '{}'",
                trainer.trainer_id, trainer.stable_id
            )));
        }
        self.trainers
            .insert(trainer.trainer_id.clone(), trainer.clone());
        Ok(())
    }

    fn trainers_at(&self, stable_id: &str) -> impl Iterator<Item = &Trainer> {
        let stable_id = stable_id.to_string();
        self.trainers
            .values()
            .filter(move |t| t.stable_id == stable_id)
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
    fault: Arc<AtomicU8>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: MemoryTables) -> Self {
        Self {
            tables: Arc::new(Mutex::new(tables)),
            fault: Arc::new(AtomicU8::new(NO_FAULT)),
        }
    }

    /// Copy of the committed state. Waits for any open transaction to finish.
    pub async fn snapshot(&self) -> MemoryTables {
        self.tables.lock().await.clone()
    }

    /// Makes the next statement reaching `point` fail with `StoreUnavailable`.
    /// The fault fires once.
    pub fn arm_fault(&self, point: FaultPoint) {
        self.fault.store(point as u8, Ordering::SeqCst);
    }

    pub fn disarm_fault(&self) {
        self.fault.store(NO_FAULT, Ordering::SeqCst);
    }
}

fn trip(fault: &AtomicU8, point: FaultPoint) -> DomainResult<()> {
    if fault
        .compare_exchange(point as u8, NO_FAULT, Ordering::SeqCst, Ordering::SeqCst)
        .is_ok()
    {
        return Err(DomainError::StoreUnavailable(format!(
            "injected fault at {:?}",
            point
        )));
    }
    Ok(())
}

fn by_prize_desc(a: &f64, b: &f64) -> CmpOrdering {
    b.partial_cmp(a).unwrap_or(CmpOrdering::Equal)
}

#[async_trait]
impl RacingStore for MemoryStore {
    async fn begin(&self) -> DomainResult<Box<dyn StoreTx>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            work,
            fault: self.fault.clone(),
        }))
    }

    async fn ping(&self) -> DomainResult<()> {
        Ok(())
    }

    async fn owners_overview(&self) -> DomainResult<Vec<OwnerSummary>> {
        let t = self.tables.lock().await;
        let mut counts: HashMap<&str, i64> = HashMap::new();
        for (owner_id, _) in &t.owns {
            *counts.entry(owner_id.as_str()).or_default() += 1;
        }
        let mut out: Vec<OwnerSummary> = t
            .owners
            .values()
            .map(|o| OwnerSummary {
                owner_id: o.owner_id.clone(),
                fname: o.fname.clone(),
                lname: o.lname.clone(),
                horse_count: counts.get(o.owner_id.as_str()).copied().unwrap_or(0),
            })
            .collect();
        out.sort_by(|a, b| {
            (&a.fname, &a.lname, &a.owner_id).cmp(&(&b.fname, &b.lname, &b.owner_id))
        });
        Ok(out)
    }

    async fn owner_horses(&self, owner_id: &str) -> DomainResult<Option<Vec<OwnerHorse>>> {
        let t = self.tables.lock().await;
        if !t.owners.contains_key(owner_id) {
            return Ok(None);
        }
        let mut out: Vec<OwnerHorse> = t
            .owns
            .iter()
            .filter(|(o, _)| o == owner_id)
            .filter_map(|(_, h)| t.horses.get(h))
            .map(|h| OwnerHorse {
                horse_id: h.horse_id.clone(),
                horse_name: h.horse_name.clone(),
                owner_count: t.owner_count(&h.horse_id) as i64,
            })
            .collect();
        out.sort_by(|a, b| (&a.horse_name, &a.horse_id).cmp(&(&b.horse_name, &b.horse_id)));
        Ok(Some(out))
    }

    async fn pending_applications(&self) -> DomainResult<Vec<TrainerApplication>> {
        let t = self.tables.lock().await;
        let mut out: Vec<TrainerApplication> = t
            .applications
            .values()
            .filter(|a| a.status == ApplicationStatus::Pending)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then(b.app_id.cmp(&a.app_id))
        });
        Ok(out)
    }

    async fn archived_horses(&self) -> DomainResult<Vec<ArchivedHorse>> {
        let t = self.tables.lock().await;
        Ok(t.archive.entries().to_vec())
    }

    async fn horses_by_owner(&self, lname_fragment: &str) -> DomainResult<Vec<OwnedHorseRow>> {
        let t = self.tables.lock().await;
        let needle = lname_fragment.to_lowercase();
        let horse_ids: BTreeSet<&str> = t
            .owns
            .iter()
            .filter(|(owner_id, _)| {
                t.owners
                    .get(owner_id)
                    .map(|o| o.lname.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .map(|(_, horse_id)| horse_id.as_str())
            .collect();

        let mut out = Vec::with_capacity(horse_ids.len());
        for horse_id in horse_ids {
            let Some(horse) = t.horses.get(horse_id) else {
                continue;
            };
            let mut trainers: Vec<&Trainer> = t.trainers_at(&horse.stable_id).collect();
            trainers.sort_by(|a, b| {
                (&a.lname, &a.fname, &a.trainer_id).cmp(&(&b.lname, &b.fname, &b.trainer_id))
            });
            out.push(OwnedHorseRow {
                horse_id: horse.horse_id.clone(),
                horse_name: horse.horse_name.clone(),
                age: horse.age,
                trainers: trainers
                    .into_iter()
                    .map(|tr| format!("{} {}", tr.fname, tr.lname))
                    .collect(),
            });
        }
        out.sort_by(|a, b| (&a.horse_name, &a.horse_id).cmp(&(&b.horse_name, &b.horse_id)));
        Ok(out)
    }

    async fn winning_trainers(&self) -> DomainResult<Vec<WinningTrainerRow>> {
        let t = self.tables.lock().await;
        let mut rows: Vec<(String, WinningTrainerRow)> = Vec::new();
        for result in t
            .results
            .values()
            .filter(|r| r.results == FinishPosition::First)
        {
            let (Some(horse), Some(race)) =
                (t.horses.get(&result.horse_id), t.races.get(&result.race_id))
            else {
                continue;
            };
            for trainer in t.trainers_at(&horse.stable_id) {
                rows.push((
                    race.race_id.clone(),
                    WinningTrainerRow {
                        trainer_fname: trainer.fname.clone(),
                        trainer_lname: trainer.lname.clone(),
                        horse_name: horse.horse_name.clone(),
                        race_name: race.race_name.clone(),
                        race_date: race.race_date,
                        track_name: race.track_name.clone(),
                    },
                ));
            }
        }
        rows.sort_by(|(ra, a), (rb, b)| {
            b.race_date
                .cmp(&a.race_date)
                .then_with(|| a.trainer_lname.cmp(&b.trainer_lname))
                .then_with(|| a.trainer_fname.cmp(&b.trainer_fname))
                .then_with(|| ra.cmp(rb))
        });
        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    async fn trainer_winnings(&self) -> DomainResult<Vec<TrainerWinningsRow>> {
        let t = self.tables.lock().await;
        let mut out: Vec<TrainerWinningsRow> = t
            .trainers
            .values()
            .map(|trainer| {
                let total_winnings = t
                    .results
                    .values()
                    .filter(|r| {
                        t.horses
                            .get(&r.horse_id)
                            .map(|h| h.stable_id == trainer.stable_id)
                            .unwrap_or(false)
                    })
                    .map(|r| r.prize)
                    .sum();
                TrainerWinningsRow {
                    trainer_id: trainer.trainer_id.clone(),
                    trainer: format!("{} {}", trainer.fname, trainer.lname),
                    total_winnings,
                }
            })
            .collect();
        out.sort_by(|a, b| {
            by_prize_desc(&a.total_winnings, &b.total_winnings)
                .then_with(|| a.trainer_id.cmp(&b.trainer_id))
        });
        Ok(out)
    }

    async fn track_stats(&self) -> DomainResult<Vec<TrackStatsRow>> {
        let t = self.tables.lock().await;
        let mut stats: BTreeMap<&str, (i64, i64)> = BTreeMap::new();
        for race in t.races.values() {
            let participations = t
                .results
                .values()
                .filter(|r| r.race_id == race.race_id)
                .count() as i64;
            let entry = stats.entry(race.track_name.as_str()).or_default();
            entry.0 += 1;
            entry.1 += participations;
        }
        let mut out: Vec<TrackStatsRow> = stats
            .into_iter()
            .map(|(track_name, (race_count, participations))| TrackStatsRow {
                track_name: track_name.to_string(),
                race_count,
                participations,
            })
            .collect();
        out.sort_by(|a, b| {
            b.race_count
                .cmp(&a.race_count)
                .then_with(|| a.track_name.cmp(&b.track_name))
        });
        Ok(out)
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryTables>,
    work: MemoryTables,
    fault: Arc<AtomicU8>,
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_owner(&mut self, owner_id: &str) -> DomainResult<Option<Owner>> {
        Ok(self.work.owners.get(owner_id).cloned())
    }

    async fn lock_horses_of_owner(&mut self, owner_id: &str) -> DomainResult<Vec<String>> {
        Ok(self
            .work
            .owns
            .iter()
            .filter(|(o, _)| o == owner_id)
            .map(|(_, h)| h.clone())
            .collect())
    }

    async fn delete_ownership_of_owner(&mut self, owner_id: &str) -> DomainResult<u64> {
        trip(&self.fault, FaultPoint::DeleteOwnership)?;
        let before = self.work.owns.len();
        self.work.owns.retain(|(o, _)| o != owner_id);
        Ok((before - self.work.owns.len()) as u64)
    }

    async fn orphaned_horses(&mut self) -> DomainResult<Vec<String>> {
        trip(&self.fault, FaultPoint::OrphanScan)?;
        let owned: BTreeSet<&str> = self.work.owns.iter().map(|(_, h)| h.as_str()).collect();
        Ok(self
            .work
            .horses
            .keys()
            .filter(|h| !owned.contains(h.as_str()))
            .cloned()
            .collect())
    }

    async fn delete_results_of_horse(&mut self, horse_id: &str) -> DomainResult<u64> {
        let before = self.work.results.len();
        self.work.results.retain(|(_, h), _| h != horse_id);
        Ok((before - self.work.results.len()) as u64)
    }

    async fn delete_ownership_of_horse(&mut self, horse_id: &str) -> DomainResult<u64> {
        let before = self.work.owns.len();
        self.work.owns.retain(|(_, h)| h != horse_id);
        Ok((before - self.work.owns.len()) as u64)
    }

    async fn delete_horse(&mut self, horse_id: &str) -> DomainResult<bool> {
        trip(&self.fault, FaultPoint::DeleteHorse)?;
        if self.work.results.keys().any(|(_, h)| h == horse_id)
            || self.work.owns.iter().any(|(_, h)| h == horse_id)
        {
            return Err(DomainError::IntegrityViolation(format!(
                "horse '{}' is still referenced",
                horse_id
            )));
        }
        match self.work.horses.remove(horse_id) {
            Some(horse) => {
                self.work.archive.record_deletion(&horse);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_owner(&mut self, owner_id: &str) -> DomainResult<bool> {
        trip(&self.fault, FaultPoint::DeleteOwner)?;
        if self.work.owns.iter().any(|(o, _)| o == owner_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "owner '{}' still has ownership links",
                owner_id
            )));
        }
        Ok(self.work.owners.remove(owner_id).is_some())
    }

    async fn lock_horse(&mut self, horse_id: &str) -> DomainResult<Option<Horse>> {
        Ok(self.work.horses.get(horse_id).cloned())
    }

    async fn horse_exists(&mut self, horse_id: &str) -> DomainResult<bool> {
        Ok(self.work.horses.contains_key(horse_id))
    }

    async fn stable_exists(&mut self, stable_id: &str) -> DomainResult<bool> {
        Ok(self.work.stables.contains_key(stable_id))
    }

    async fn track_exists(&mut self, track_name: &str) -> DomainResult<bool> {
        Ok(self.work.tracks.contains(track_name))
    }

    async fn update_horse_stable(&mut self, horse_id: &str, stable_id: &str) -> DomainResult<u64> {
        if !self.work.stables.contains_key(stable_id) {
            return Err(DomainError::IntegrityViolation(format!(
                "unknown stable '{}'",
                stable_id
            )));
        }
        match self.work.horses.get_mut(horse_id) {
            Some(horse) => {
                horse.stable_id = stable_id.to_string();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn max_id_suffix(&mut self, class: IdClass) -> DomainResult<Option<u64>> {
        Ok(match class {
            IdClass::Race => class.max_suffix(self.work.races.keys().map(String::as_str)),
            IdClass::Trainer => class.max_suffix(self.work.trainers.keys().map(String::as_str)),
        })
    }

    async fn insert_race(&mut self, race: &Race) -> DomainResult<()> {
        self.work.put_race(race)
    }

    async fn insert_race_result(&mut self, result: &RaceResult) -> DomainResult<()> {
        trip(&self.fault, FaultPoint::InsertRaceResult)?;
        self.work.put_result(result)
    }

    async fn race_results(&mut self, race_id: &str) -> DomainResult<Vec<RaceResultView>> {
        trip(&self.fault, FaultPoint::ReadRaceResults)?;
        let t = &self.work;
        let mut out: Vec<RaceResultView> = t
            .results
            .values()
            .filter(|r| r.race_id == race_id)
            .filter_map(|r| {
                t.horses.get(&r.horse_id).map(|h| RaceResultView {
                    race_id: r.race_id.clone(),
                    horse_id: r.horse_id.clone(),
                    horse_name: h.horse_name.clone(),
                    results: r.results,
                    prize: r.prize,
                })
            })
            .collect();
        out.sort_by(|a, b| by_prize_desc(&a.prize, &b.prize).then(a.horse_id.cmp(&b.horse_id)));
        Ok(out)
    }

    async fn insert_trainer(&mut self, trainer: &Trainer) -> DomainResult<()> {
        self.work.put_trainer(trainer)
    }

    async fn lock_application(&mut self, app_id: i64) -> DomainResult<Option<TrainerApplication>> {
        Ok(self.work.applications.get(&app_id).cloned())
    }

    async fn decide_application(
        &mut self,
        app_id: i64,
        decision: &ApplicationDecision,
    ) -> DomainResult<u64> {
        let Some(app) = self
            .work
            .applications
            .get_mut(&app_id)
            .filter(|a| a.status == ApplicationStatus::Pending)
        else {
            return Ok(0);
        };
        app.status = decision.status();
        app.decided_at = Some(Utc::now());
        app.decision_by = Some(decision.decided_by().to_string());
        match decision {
            ApplicationDecision::Approved { trainer_id, .. } => {
                app.approved_trainer_id = Some(trainer_id.clone());
            }
            ApplicationDecision::Rejected { reason, .. } => {
                app.decision_reason = reason.clone();
            }
        }
        Ok(1)
    }

    async fn commit(self: Box<Self>) -> DomainResult<()> {
        let MemoryTx {
            mut guard,
            work,
            fault,
        } = *self;
        trip(&fault, FaultPoint::Commit)?;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> DomainResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let mut tables = MemoryTables::new();
        tables.add_owner("O1", "Mona", "Saeed");
        let store = MemoryStore::from_tables(tables);

        {
            let mut tx = store.begin().await.unwrap();
            tx.delete_owner("O1").await.unwrap();
        }

        assert!(store.snapshot().await.owner("O1").is_some());
    }

    #[tokio::test]
    async fn armed_fault_fires_once() {
        let store = MemoryStore::new();
        store.arm_fault(FaultPoint::Commit);

        let tx = store.begin().await.unwrap();
        assert!(tx.commit().await.is_err());

        let tx = store.begin().await.unwrap();
        assert!(tx.commit().await.is_ok());
    }

    #[tokio::test]
    async fn horse_rows_cannot_be_deleted_while_referenced() {
        let mut tables = MemoryTables::new();
        tables.add_stable("S1", "North");
        tables.add_owner("O1", "Mona", "Saeed");
        tables
            .add_horse(Horse {
                horse_id: "H1".into(),
                horse_name: "Comet".into(),
                age: Some(4),
                gender: Some("M".into()),
                registration: 11,
                stable_id: "S1".into(),
            })
            .unwrap();
        tables.add_ownership("O1", "H1").unwrap();
        let store = MemoryStore::from_tables(tables);

        let mut tx = store.begin().await.unwrap();
        let err = tx.delete_horse("H1").await.unwrap_err();
        assert_eq!(err.code(), "INTEGRITY_VIOLATION");
    }
}
