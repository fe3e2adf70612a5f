//! Moving a horse to another stable.

use crate::domain::error::{DomainError, DomainResult};
use crate::storage::{settle, RacingStore, StoreTx};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Relocation {
    pub horse_id: String,
    pub from_stable_id: String,
    pub to_stable_id: String,
}

/// Updates the horse's stable reference and nothing else.
///
/// Moving a horse to the stable it is already in is rejected, not treated as a
/// successful no-op.
pub async fn move_horse(
    store: &dyn RacingStore,
    horse_id: &str,
    new_stable_id: &str,
) -> DomainResult<Relocation> {
    let (horse_id, new_stable_id) = (horse_id.trim(), new_stable_id.trim());
    if horse_id.is_empty() || new_stable_id.is_empty() {
        return Err(DomainError::Validation(
            "horse id and destination stable are required".to_string(),
        ));
    }

    let mut tx = store.begin().await?;
    let outcome = relocate(tx.as_mut(), horse_id, new_stable_id).await;
    let relocation = settle(tx, outcome, "move_horse").await?;
    tracing::info!(
        horse_id = %relocation.horse_id,
        from = %relocation.from_stable_id,
        to = %relocation.to_stable_id,
        "horse moved"
    );
    Ok(relocation)
}

async fn relocate(
    tx: &mut dyn StoreTx,
    horse_id: &str,
    new_stable_id: &str,
) -> DomainResult<Relocation> {
    let horse = tx
        .lock_horse(horse_id)
        .await?
        .ok_or_else(|| DomainError::not_found("horse", horse_id))?;

    if horse.stable_id == new_stable_id {
        return Err(DomainError::Validation(format!(
            "horse '{}' is already in stable '{}'",
            horse_id, new_stable_id
        )));
    }
    if !tx.stable_exists(new_stable_id).await? {
        return Err(DomainError::not_found("stable", new_stable_id));
    }

    let updated = tx.update_horse_stable(horse_id, new_stable_id).await?;
    if updated != 1 {
        return Err(DomainError::IntegrityViolation(format!(
            "moving horse '{}' updated {} rows",
            horse_id, updated
        )));
    }

    Ok(Relocation {
        horse_id: horse_id.to_string(),
        from_stable_id: horse.stable_id,
        to_stable_id: new_stable_id.to_string(),
    })
}
