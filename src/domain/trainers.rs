//! Trainer application approval.
//!
//! Approving allocates the next `trainerN` id, inserts the trainer and marks the
//! application in one transaction. Both decisions apply to exactly one pending
//! application.

use crate::domain::context::check_actor;
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::{allocate_with_retry, next_id, IdClass};
use crate::domain::model::{ApplicationDecision, ApplicationStatus, Trainer, TrainerApplication};
use crate::storage::{settle, RacingStore, StoreTx};

pub async fn approve_application(
    store: &dyn RacingStore,
    app_id: i64,
    decided_by: &str,
    max_attempts: u32,
) -> DomainResult<Trainer> {
    check_actor(decided_by)?;
    let trainer = allocate_with_retry(IdClass::Trainer, max_attempts, |_attempt| async move {
        let mut tx = store.begin().await?;
        let outcome = approve(tx.as_mut(), app_id, decided_by).await;
        settle(tx, outcome, "approve_application").await
    })
    .await?;

    tracing::info!(
        app_id,
        trainer_id = %trainer.trainer_id,
        stable_id = %trainer.stable_id,
        "trainer application approved"
    );
    Ok(trainer)
}

pub async fn reject_application(
    store: &dyn RacingStore,
    app_id: i64,
    reason: Option<&str>,
    decided_by: &str,
) -> DomainResult<()> {
    check_actor(decided_by)?;
    let decision = ApplicationDecision::Rejected {
        reason: reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string),
        decided_by: decided_by.to_string(),
    };

    let mut tx = store.begin().await?;
    let outcome = decide(tx.as_mut(), app_id, &decision).await;
    settle(tx, outcome, "reject_application").await?;

    tracing::info!(app_id, "trainer application rejected");
    Ok(())
}

async fn pending(tx: &mut dyn StoreTx, app_id: i64) -> DomainResult<TrainerApplication> {
    match tx.lock_application(app_id).await? {
        Some(app) if app.status == ApplicationStatus::Pending => Ok(app),
        _ => Err(DomainError::not_found(
            "pending trainer application",
            app_id.to_string(),
        )),
    }
}

async fn decide(
    tx: &mut dyn StoreTx,
    app_id: i64,
    decision: &ApplicationDecision,
) -> DomainResult<()> {
    pending(tx, app_id).await?;
    let updated = tx.decide_application(app_id, decision).await?;
    if updated != 1 {
        return Err(DomainError::IntegrityViolation(format!(
            "deciding application {} updated {} rows",
            app_id, updated
        )));
    }
    Ok(())
}

async fn approve(tx: &mut dyn StoreTx, app_id: i64, decided_by: &str) -> DomainResult<Trainer> {
    let app = pending(tx, app_id).await?;

    let max = tx.max_id_suffix(IdClass::Trainer).await?;
    let trainer = Trainer {
        trainer_id: next_id(IdClass::Trainer, max)?,
        fname: app.fname,
        lname: app.lname,
        stable_id: app.stable_id,
    };
    tx.insert_trainer(&trainer).await?;

    let decision = ApplicationDecision::Approved {
        trainer_id: trainer.trainer_id.clone(),
        decided_by: decided_by.to_string(),
    };
    decide(tx, app_id, &decision).await?;
    Ok(trainer)
}
