//! Registering a race together with its results.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::{allocate_with_retry, next_id, IdClass};
use crate::domain::model::{NewRace, Race, RaceResult};
use crate::domain::reports::RaceResultView;
use crate::storage::{settle, RacingStore, StoreTx};
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RaceRegistration {
    pub race: Race,
    /// Stored results, highest prize first.
    pub results: Vec<RaceResultView>,
}

/// Longest race name `race.race_name` holds.
pub const MAX_RACE_NAME_LEN: usize = 30;

/// Largest prize `NUMERIC(12, 2)` holds.
pub const MAX_PRIZE: f64 = 9_999_999_999.99;

/// Checks everything that can be checked without the store.
pub fn validate_new_race(new_race: &NewRace) -> DomainResult<()> {
    let mut errors = Vec::new();
    if new_race.track_name.trim().is_empty() {
        errors.push("track is required".to_string());
    }
    if let Some(name) = &new_race.race_name {
        if name.trim().chars().count() > MAX_RACE_NAME_LEN {
            errors.push(format!(
                "race name is longer than {} characters",
                MAX_RACE_NAME_LEN
            ));
        }
    }
    if new_race.entries.is_empty() {
        errors.push("select at least one horse".to_string());
    }

    let mut seen = HashSet::new();
    for entry in &new_race.entries {
        let horse_id = entry.horse_id.trim();
        if horse_id.is_empty() {
            errors.push("every entry needs a horse id".to_string());
            continue;
        }
        if !seen.insert(horse_id) {
            errors.push(format!("horse '{}' selected more than once", horse_id));
        }
        if !entry.prize.is_finite() || entry.prize < 0.0 {
            errors.push(format!("prize must be >= 0 for horse '{}'", horse_id));
        } else if entry.prize > MAX_PRIZE {
            errors.push(format!(
                "prize must not exceed {:.2} for horse '{}'",
                MAX_PRIZE, horse_id
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(DomainError::Validation(errors.join("; ")))
    }
}

pub async fn add_race(
    store: &dyn RacingStore,
    new_race: &NewRace,
    max_attempts: u32,
) -> DomainResult<RaceRegistration> {
    validate_new_race(new_race)?;

    let registration = allocate_with_retry(IdClass::Race, max_attempts, |_attempt| async move {
        let mut tx = store.begin().await?;
        let outcome = register(tx.as_mut(), new_race).await;
        settle(tx, outcome, "add_race").await
    })
    .await?;

    tracing::info!(
        race_id = %registration.race.race_id,
        track = %registration.race.track_name,
        entries = new_race.entries.len(),
        "race registered"
    );
    Ok(registration)
}

/// Inserts the race and reads its results back before the commit, so a
/// returned error always means nothing was stored.
async fn register(tx: &mut dyn StoreTx, new_race: &NewRace) -> DomainResult<RaceRegistration> {
    let race = insert_race(tx, new_race).await?;
    let results = tx.race_results(&race.race_id).await?;
    Ok(RaceRegistration { race, results })
}

async fn insert_race(tx: &mut dyn StoreTx, new_race: &NewRace) -> DomainResult<Race> {
    let track_name = new_race.track_name.trim();
    if !tx.track_exists(track_name).await? {
        return Err(DomainError::not_found("track", track_name));
    }
    for entry in &new_race.entries {
        let horse_id = entry.horse_id.trim();
        if !tx.horse_exists(horse_id).await? {
            return Err(DomainError::not_found("horse", horse_id));
        }
    }

    let max = tx.max_id_suffix(IdClass::Race).await?;
    let race = Race {
        race_id: next_id(IdClass::Race, max)?,
        race_name: new_race
            .race_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        track_name: track_name.to_string(),
        race_date: new_race.race_date,
        race_time: new_race.race_time,
    };
    tx.insert_race(&race).await?;

    for entry in &new_race.entries {
        tx.insert_race_result(&RaceResult {
            race_id: race.race_id.clone(),
            horse_id: entry.horse_id.trim().to_string(),
            results: entry.results,
            prize: entry.prize,
        })
        .await?;
    }
    Ok(race)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{FinishPosition, RaceEntry};
    use chrono::{NaiveDate, NaiveTime};

    fn race_with(entries: Vec<RaceEntry>) -> NewRace {
        NewRace {
            race_name: Some("Spring Cup".to_string()),
            track_name: "Riyadh Downs".to_string(),
            race_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            race_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            entries,
        }
    }

    fn entry(horse_id: &str, prize: f64) -> RaceEntry {
        RaceEntry {
            horse_id: horse_id.to_string(),
            results: FinishPosition::First,
            prize,
        }
    }

    #[test]
    fn accepts_a_well_formed_race() {
        assert!(validate_new_race(&race_with(vec![entry("H1", 500.0), entry("H2", 0.0)])).is_ok());
    }

    #[test]
    fn rejects_duplicate_horses_and_negative_prizes() {
        let err = validate_new_race(&race_with(vec![
            entry("H1", 100.0),
            entry("H1", 50.0),
            entry("H2", -1.0),
        ]))
        .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("selected more than once"), "{}", msg);
        assert!(msg.contains("prize must be >= 0 for horse 'H2'"), "{}", msg);
    }

    #[test]
    fn rejects_empty_entries_and_blank_track() {
        let mut race = race_with(vec![]);
        race.track_name = "  ".to_string();
        let msg = validate_new_race(&race).unwrap_err().to_string();
        assert!(msg.contains("track is required"));
        assert!(msg.contains("at least one horse"));
    }

    #[test]
    fn rejects_values_the_columns_cannot_hold() {
        let mut race = race_with(vec![entry("H1", 1e13)]);
        race.race_name = Some("x".repeat(MAX_RACE_NAME_LEN + 10));
        let msg = validate_new_race(&race).unwrap_err().to_string();
        assert!(msg.contains("race name is longer than 30"), "{}", msg);
        assert!(msg.contains("prize must not exceed"), "{}", msg);

        race.race_name = Some(format!("  {}  ", "x".repeat(MAX_RACE_NAME_LEN)));
        race.entries = vec![entry("H1", MAX_PRIZE)];
        assert!(validate_new_race(&race).is_ok());
    }

    #[test]
    fn rejects_non_finite_prize() {
        assert!(validate_new_race(&race_with(vec![entry("H1", f64::NAN)])).is_err());
    }
}
