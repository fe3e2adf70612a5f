//! PostgreSQL-backed checks: archive trigger, row locking and id allocation.
//!
//! Skipped (returns early) unless `DATABASE_URL` points at a disposable database.
//! Every test works on rows tagged with a random suffix so runs do not collide.

use chrono::{DateTime, Utc};
use horse_racing_admin::domain::model::{FinishPosition, NewRace, RaceEntry};
use horse_racing_admin::{DomainError, PostgresStore, RacingService, RequestContext};
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

async fn test_store() -> Result<Option<PostgresStore>, Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let Ok(url) = std::env::var("DATABASE_URL") else {
        println!("DATABASE_URL not set; skipping PostgreSQL test");
        return Ok(None);
    };
    let store = PostgresStore::connect(&url, 10).await?;
    store.migrate().await?;
    Ok(Some(store))
}

struct Fixture {
    stable: String,
    track: String,
    exclusive_owner: String,
    other_owner: String,
    exclusive_horse: String,
    shared_horse: String,
}

/// One stable and track, two owners, a horse owned by the first owner alone
/// and a horse shared by both. The exclusive horse has one race result.
async fn seed(store: &PostgresStore) -> Result<Fixture, Box<dyn std::error::Error>> {
    let tag: u32 = rand::thread_rng().gen_range(10_000_000..100_000_000);
    let f = Fixture {
        stable: format!("pg_s_{}", tag),
        track: format!("pg_track_{}", tag),
        exclusive_owner: format!("pg_oa_{}", tag),
        other_owner: format!("pg_ob_{}", tag),
        exclusive_horse: format!("pg_hx_{}", tag),
        shared_horse: format!("pg_hy_{}", tag),
    };
    let race_id = format!("pg_r_{}", tag);

    // Horses and their ownership go in together so a concurrent orphan scan never sees them bare.
    let mut tx = store.pool().begin().await?;
    sqlx::query("INSERT INTO stable (stable_id, stable_name) VALUES ($1, 'PG Barn')")
        .bind(&f.stable)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO track (track_name) VALUES ($1)")
        .bind(&f.track)
        .execute(&mut *tx)
        .await?;
    for owner in [&f.exclusive_owner, &f.other_owner] {
        sqlx::query("INSERT INTO owner (owner_id, fname, lname) VALUES ($1, 'Test', 'Owner')")
            .bind(owner)
            .execute(&mut *tx)
            .await?;
    }
    for (horse, name) in [(&f.exclusive_horse, "Solo Star"), (&f.shared_horse, "Twin Peak")] {
        sqlx::query(
            "INSERT INTO horse (horse_id, horse_name, age, gender, registration, stable_id) \
             VALUES ($1, $2, 6, 'F', 77, $3)",
        )
        .bind(horse)
        .bind(name)
        .bind(&f.stable)
        .execute(&mut *tx)
        .await?;
    }
    for (owner, horse) in [
        (&f.exclusive_owner, &f.exclusive_horse),
        (&f.exclusive_owner, &f.shared_horse),
        (&f.other_owner, &f.shared_horse),
    ] {
        sqlx::query("INSERT INTO owns (owner_id, horse_id) VALUES ($1, $2)")
            .bind(owner)
            .bind(horse)
            .execute(&mut *tx)
            .await?;
    }
    sqlx::query(
        "INSERT INTO race (race_id, race_name, track_name, race_date, race_time) \
         VALUES ($1, 'PG Cup', $2, DATE '2025-02-02', TIME '15:00')",
    )
    .bind(&race_id)
    .bind(&f.track)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "INSERT INTO race_results (race_id, horse_id, results, prize) VALUES ($1, $2, 'first', 300)",
    )
    .bind(&race_id)
    .bind(&f.exclusive_horse)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(f)
}

async fn count(
    store: &PostgresStore,
    sql: &str,
    id: &str,
) -> Result<i64, Box<dyn std::error::Error>> {
    Ok(sqlx::query_scalar(sql).bind(id).fetch_one(store.pool()).await?)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cascade_archives_exclusive_horse() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let f = seed(&store).await?;
    let db_start: DateTime<Utc> = sqlx::query_scalar("SELECT now()")
        .fetch_one(store.pool())
        .await?;

    let service = RacingService::new(Arc::new(store.clone()));
    let summary = service
        .delete_owner(&RequestContext::admin(), &f.exclusive_owner)
        .await?;
    assert!(summary.deleted_horses.contains(&f.exclusive_horse));
    assert!(!summary.deleted_horses.contains(&f.shared_horse));

    assert_eq!(count(&store, "SELECT COUNT(*) FROM horse WHERE horse_id = $1", &f.exclusive_horse).await?, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM race_results WHERE horse_id = $1", &f.exclusive_horse).await?, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM owns WHERE horse_id = $1", &f.shared_horse).await?, 1);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM owner WHERE owner_id = $1", &f.exclusive_owner).await?, 0);

    let (name, registration, stable, deleted_at): (String, i32, Option<String>, DateTime<Utc>) =
        sqlx::query_as(
            "SELECT horse_name, registration, stable_id, deleted_at FROM old_info WHERE horse_id = $1",
        )
        .bind(&f.exclusive_horse)
        .fetch_one(store.pool())
        .await?;
    assert_eq!(name, "Solo Star");
    assert_eq!(registration, 77);
    assert_eq!(stable.as_deref(), Some(f.stable.as_str()));
    assert!(deleted_at >= db_start);

    // Archive rows cannot be rewritten.
    let rewrite = sqlx::query("DELETE FROM old_info WHERE horse_id = $1")
        .bind(&f.exclusive_horse)
        .execute(store.pool())
        .await;
    assert!(rewrite.is_err());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_missing_owner_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let service = RacingService::new(Arc::new(store));
    let err = service
        .delete_owner(&RequestContext::admin(), "pg_missing_owner")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_owner_deletions_share_a_horse() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let f = seed(&store).await?;
    let service = Arc::new(RacingService::new(Arc::new(store.clone())));

    let a = {
        let service = service.clone();
        let owner = f.exclusive_owner.clone();
        tokio::spawn(async move { service.delete_owner(&RequestContext::admin(), &owner).await })
    };
    let b = {
        let service = service.clone();
        let owner = f.other_owner.clone();
        tokio::spawn(async move { service.delete_owner(&RequestContext::admin(), &owner).await })
    };
    a.await??;
    b.await??;

    assert_eq!(count(&store, "SELECT COUNT(*) FROM horse WHERE horse_id = $1", &f.shared_horse).await?, 0);
    assert_eq!(count(&store, "SELECT COUNT(*) FROM old_info WHERE horse_id = $1", &f.shared_horse).await?, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_add_race_allocates_distinct_ids() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let f = seed(&store).await?;
    let service = Arc::new(RacingService::with_allocation_attempts(
        Arc::new(store.clone()),
        20,
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let new_race = NewRace {
            race_name: Some(format!("PG Heat {}", i)),
            track_name: f.track.clone(),
            race_date: chrono::NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            race_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            entries: vec![RaceEntry {
                horse_id: f.shared_horse.clone(),
                results: FinishPosition::Fourth,
                prize: 10.0,
            }],
        };
        handles.push(tokio::spawn(async move {
            service.add_race(&RequestContext::admin(), &new_race).await
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let created = handle.await??;
        assert!(created.race.race_id.starts_with("race"));
        assert!(ids.insert(created.race.race_id), "duplicate race id");
    }
    assert_eq!(ids.len(), 8);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_move_horse_guard() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let f = seed(&store).await?;
    let service = RacingService::new(Arc::new(store.clone()));

    let err = service
        .move_horse(&RequestContext::admin(), &f.shared_horse, &f.stable)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let err = service
        .move_horse(&RequestContext::admin(), &f.shared_horse, "pg_no_such_stable")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "stable", .. }));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_data_exceptions_are_not_retryable() -> Result<(), Box<dyn std::error::Error>> {
    let Some(store) = test_store().await? else {
        return Ok(());
    };
    let overflow = sqlx::query("SELECT CAST(1e13 AS NUMERIC(12, 2))")
        .execute(store.pool())
        .await
        .map(|_| ())
        .map_err(DomainError::from)
        .unwrap_err();
    assert_eq!(overflow.code(), "VALIDATION_ERROR");
    assert!(!overflow.is_retryable());

    let too_long = sqlx::query("INSERT INTO track (track_name) VALUES ($1)")
        .bind("t".repeat(31))
        .execute(store.pool())
        .await
        .map(|_| ())
        .map_err(DomainError::from)
        .unwrap_err();
    assert_eq!(too_long.code(), "VALIDATION_ERROR");
    Ok(())
}
