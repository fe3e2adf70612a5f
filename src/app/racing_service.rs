//! The racing administration service.
//!
//! This is what transports call into. It is responsible for:
//! 1.  Gating every admin operation on the caller's [`RequestContext`].
//! 2.  Handing the shared store to the domain operations.
//! 3.  Applying the configured id-allocation retry budget.
//!
//! The service keeps no per-caller state; it is cheap to clone behind an `Arc`.

use crate::domain::archive::ArchivedHorse;
use crate::domain::cascade::{self, DeletionSummary};
use crate::domain::context::RequestContext;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::model::{NewRace, OwnerHorse, OwnerSummary, Trainer, TrainerApplication};
use crate::domain::races::{self, RaceRegistration};
use crate::domain::relocation::{self, Relocation};
use crate::domain::reports::{
    owner_search_term, OwnedHorseRow, TrackStatsRow, TrainerWinningsRow, WinningTrainerRow,
};
use crate::domain::trainers;
use crate::storage::RacingStore;
use std::sync::Arc;

pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 5;

#[derive(Clone)]
pub struct RacingService {
    store: Arc<dyn RacingStore>,
    allocation_attempts: u32,
}

impl RacingService {
    pub fn new(store: Arc<dyn RacingStore>) -> Self {
        Self::with_allocation_attempts(store, DEFAULT_ALLOCATION_ATTEMPTS)
    }

    pub fn with_allocation_attempts(store: Arc<dyn RacingStore>, attempts: u32) -> Self {
        Self {
            store,
            allocation_attempts: attempts.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn RacingStore> {
        &self.store
    }

    pub fn allocation_attempts(&self) -> u32 {
        self.allocation_attempts
    }

    pub async fn ping(&self) -> DomainResult<()> {
        self.store.ping().await
    }

    // --- Admin ---

    pub async fn owners_overview(&self, ctx: &RequestContext) -> DomainResult<Vec<OwnerSummary>> {
        ctx.require_admin("owners_overview")?;
        self.store.owners_overview().await
    }

    /// Preview of what deleting `owner_id` would take with it.
    pub async fn owner_horses(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> DomainResult<Vec<OwnerHorse>> {
        ctx.require_admin("owner_horses")?;
        let owner_id = owner_id.trim();
        self.store
            .owner_horses(owner_id)
            .await?
            .ok_or_else(|| DomainError::not_found("owner", owner_id))
    }

    pub async fn delete_owner(
        &self,
        ctx: &RequestContext,
        owner_id: &str,
    ) -> DomainResult<DeletionSummary> {
        ctx.require_admin("delete_owner")?;
        cascade::delete_owner(self.store.as_ref(), owner_id).await
    }

    /// Returns the number of race results removed with the horse.
    pub async fn delete_horse(&self, ctx: &RequestContext, horse_id: &str) -> DomainResult<u64> {
        ctx.require_admin("delete_horse")?;
        cascade::delete_horse(self.store.as_ref(), horse_id).await
    }

    pub async fn move_horse(
        &self,
        ctx: &RequestContext,
        horse_id: &str,
        new_stable_id: &str,
    ) -> DomainResult<Relocation> {
        ctx.require_admin("move_horse")?;
        relocation::move_horse(self.store.as_ref(), horse_id, new_stable_id).await
    }

    pub async fn add_race(
        &self,
        ctx: &RequestContext,
        new_race: &NewRace,
    ) -> DomainResult<RaceRegistration> {
        ctx.require_admin("add_race")?;
        races::add_race(self.store.as_ref(), new_race, self.allocation_attempts).await
    }

    pub async fn pending_applications(
        &self,
        ctx: &RequestContext,
    ) -> DomainResult<Vec<TrainerApplication>> {
        ctx.require_admin("pending_applications")?;
        self.store.pending_applications().await
    }

    pub async fn approve_application(
        &self,
        ctx: &RequestContext,
        app_id: i64,
    ) -> DomainResult<Trainer> {
        ctx.require_admin("approve_application")?;
        trainers::approve_application(
            self.store.as_ref(),
            app_id,
            &ctx.actor,
            self.allocation_attempts,
        )
        .await
    }

    pub async fn reject_application(
        &self,
        ctx: &RequestContext,
        app_id: i64,
        reason: Option<&str>,
    ) -> DomainResult<()> {
        ctx.require_admin("reject_application")?;
        trainers::reject_application(self.store.as_ref(), app_id, reason, &ctx.actor).await
    }

    pub async fn archived_horses(&self, ctx: &RequestContext) -> DomainResult<Vec<ArchivedHorse>> {
        ctx.require_admin("archived_horses")?;
        self.store.archived_horses().await
    }

    // --- Guest reports (open to both roles) ---

    pub async fn horses_by_owner(&self, lname: &str) -> DomainResult<Vec<OwnedHorseRow>> {
        let term = owner_search_term(lname)?;
        self.store.horses_by_owner(&term).await
    }

    pub async fn winning_trainers(&self) -> DomainResult<Vec<WinningTrainerRow>> {
        self.store.winning_trainers().await
    }

    pub async fn trainer_winnings(&self) -> DomainResult<Vec<TrainerWinningsRow>> {
        self.store.trainer_winnings().await
    }

    pub async fn track_stats(&self) -> DomainResult<Vec<TrackStatsRow>> {
        self.store.track_stats().await
    }
}
