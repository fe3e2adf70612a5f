//! Shared racing fixture for the integration tests.
//!
//! Owners and horses:
//!   O1 Mona Saeed    -> H10 (exclusive), H11 (shared with O2)
//!   O2 Khalid Haddad -> H11, H12 (exclusive)
//!   O3 Lina Omar     -> no horses
//!
//! Results: race1 (Riyadh Downs, 2025-03-01): H10 first 500, H11 second 250
//!          race2 (Jeddah Park,  2025-04-12): H10 second 200, H12 first 400
//!
//! Trainers: trainer1 Ali Nasser at S1, trainer2 Sara Fahd at S2.
//! Applications 1 (Omar Zaid, S1) and 2 (Huda Salem, S2) are pending.
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use horse_racing_admin::domain::model::{FinishPosition, Horse, Race, RaceResult, Trainer};
use horse_racing_admin::storage::{MemoryStore, MemoryTables};
use horse_racing_admin::RacingService;
use std::sync::Arc;

pub fn horse(horse_id: &str, horse_name: &str, stable_id: &str, registration: i32) -> Horse {
    Horse {
        horse_id: horse_id.to_string(),
        horse_name: horse_name.to_string(),
        age: Some(5),
        gender: Some("M".to_string()),
        registration,
        stable_id: stable_id.to_string(),
    }
}

pub fn race(race_id: &str, track_name: &str, date: (i32, u32, u32)) -> Race {
    Race {
        race_id: race_id.to_string(),
        race_name: Some(format!("{} stakes", track_name)),
        track_name: track_name.to_string(),
        race_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        race_time: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
    }
}

pub fn result(race_id: &str, horse_id: &str, results: FinishPosition, prize: f64) -> RaceResult {
    RaceResult {
        race_id: race_id.to_string(),
        horse_id: horse_id.to_string(),
        results,
        prize,
    }
}

pub fn racing_tables() -> MemoryTables {
    let mut t = MemoryTables::new();
    t.add_stable("S1", "North Barn")
        .add_stable("S2", "South Barn")
        .add_stable("S3", "East Barn")
        .add_track("Riyadh Downs")
        .add_track("Jeddah Park")
        .add_owner("O1", "Mona", "Saeed")
        .add_owner("O2", "Khalid", "Haddad")
        .add_owner("O3", "Lina", "Omar");

    t.add_horse(horse("H10", "Desert Wind", "S1", 1010)).unwrap();
    t.add_horse(horse("H11", "Night Falcon", "S1", 1011)).unwrap();
    t.add_horse(horse("H12", "Red Dune", "S2", 1012)).unwrap();

    t.add_ownership("O1", "H10").unwrap();
    t.add_ownership("O1", "H11").unwrap();
    t.add_ownership("O2", "H11").unwrap();
    t.add_ownership("O2", "H12").unwrap();

    t.add_race(race("race1", "Riyadh Downs", (2025, 3, 1))).unwrap();
    t.add_race(race("race2", "Jeddah Park", (2025, 4, 12))).unwrap();
    t.add_result(result("race1", "H10", FinishPosition::First, 500.0)).unwrap();
    t.add_result(result("race1", "H11", FinishPosition::Second, 250.0)).unwrap();
    t.add_result(result("race2", "H10", FinishPosition::Second, 200.0)).unwrap();
    t.add_result(result("race2", "H12", FinishPosition::First, 400.0)).unwrap();

    t.add_trainer(Trainer {
        trainer_id: "trainer1".to_string(),
        fname: "Ali".to_string(),
        lname: "Nasser".to_string(),
        stable_id: "S1".to_string(),
    })
    .unwrap();
    t.add_trainer(Trainer {
        trainer_id: "trainer2".to_string(),
        fname: "Sara".to_string(),
        lname: "Fahd".to_string(),
        stable_id: "S2".to_string(),
    })
    .unwrap();

    t.submit_application("Omar", "Zaid", "S1", Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap())
        .unwrap();
    t.submit_application("Huda", "Salem", "S2", Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap())
        .unwrap();
    t
}

pub fn racing_store() -> MemoryStore {
    MemoryStore::from_tables(racing_tables())
}

pub fn racing_service(store: &MemoryStore) -> RacingService {
    RacingService::new(Arc::new(store.clone()))
}
