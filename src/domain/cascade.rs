//! Owner deletion with cascade to horses left without any owner.
//!
//! The whole cascade runs in one transaction:
//!
//! 1. lock the owner row (absent owner: `NotFound`, nothing written);
//! 2. lock the owner's horses, then drop the owner's ownership edges;
//! 3. find horses with no edge left, counted over *all* owners;
//! 4. for each: delete its race results, its remaining edges, then the horse
//!    (which archives it);
//! 5. delete the owner;
//! 6. commit.
//!
//! Any error rolls the transaction back, so a failed call leaves the store as
//! it was. Retrying after success fails cleanly with `NotFound`.

use crate::domain::error::{DomainError, DomainResult};
use crate::storage::{settle, RacingStore, StoreTx};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeletionSummary {
    pub owner_id: String,
    /// Horses removed because the owner was their last one.
    pub deleted_horses: Vec<String>,
    /// Ownership edges released by the owner itself.
    pub released_edges: u64,
    /// Race result rows removed together with the deleted horses.
    pub deleted_results: u64,
}

pub async fn delete_owner(store: &dyn RacingStore, owner_id: &str) -> DomainResult<DeletionSummary> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(DomainError::Validation("owner id is required".to_string()));
    }

    let mut tx = store.begin().await?;
    let outcome = cascade(tx.as_mut(), owner_id).await;
    let summary = settle(tx, outcome, "delete_owner").await?;

    tracing::info!(
        owner_id = %summary.owner_id,
        deleted_horses = ?summary.deleted_horses,
        released_edges = summary.released_edges,
        deleted_results = summary.deleted_results,
        "owner deleted"
    );
    Ok(summary)
}

async fn cascade(tx: &mut dyn StoreTx, owner_id: &str) -> DomainResult<DeletionSummary> {
    if tx.lock_owner(owner_id).await?.is_none() {
        return Err(DomainError::not_found("owner", owner_id));
    }

    let linked = tx.lock_horses_of_owner(owner_id).await?;
    let released_edges = tx.delete_ownership_of_owner(owner_id).await?;
    tracing::debug!(%owner_id, ?linked, released_edges, "ownership edges released");

    let orphans = tx.orphaned_horses().await?;
    tracing::debug!(%owner_id, ?orphans, "horses left without an owner");

    let mut deleted_results = 0;
    let mut deleted_horses = Vec::with_capacity(orphans.len());
    for horse_id in orphans {
        deleted_results += tx.delete_results_of_horse(&horse_id).await?;
        tx.delete_ownership_of_horse(&horse_id).await?;
        if tx.delete_horse(&horse_id).await? {
            deleted_horses.push(horse_id);
        }
    }

    if !tx.delete_owner(owner_id).await? {
        return Err(DomainError::not_found("owner", owner_id));
    }

    Ok(DeletionSummary {
        owner_id: owner_id.to_string(),
        deleted_horses,
        released_edges,
        deleted_results,
    })
}

/// Deletes a single horse with its results and ownership edges. The archive
/// entry is written exactly as it is for cascaded deletions.
pub async fn delete_horse(store: &dyn RacingStore, horse_id: &str) -> DomainResult<u64> {
    let horse_id = horse_id.trim();
    if horse_id.is_empty() {
        return Err(DomainError::Validation("horse id is required".to_string()));
    }

    let mut tx = store.begin().await?;
    let outcome = remove_horse(tx.as_mut(), horse_id).await;
    let results = settle(tx, outcome, "delete_horse").await?;

    tracing::info!(%horse_id, deleted_results = results, "horse deleted");
    Ok(results)
}

async fn remove_horse(tx: &mut dyn StoreTx, horse_id: &str) -> DomainResult<u64> {
    if tx.lock_horse(horse_id).await?.is_none() {
        return Err(DomainError::not_found("horse", horse_id));
    }
    let results = tx.delete_results_of_horse(horse_id).await?;
    tx.delete_ownership_of_horse(horse_id).await?;
    tx.delete_horse(horse_id).await?;
    Ok(results)
}
