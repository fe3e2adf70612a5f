//! Read-only report rows served to guests.

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::model::FinishPosition;
use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

/// Horses of owners whose last name matches a search fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OwnedHorseRow {
    pub horse_id: String,
    pub horse_name: String,
    pub age: Option<i32>,
    /// Trainers working at the horse's stable, ordered by last name.
    pub trainers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WinningTrainerRow {
    pub trainer_fname: String,
    pub trainer_lname: String,
    pub horse_name: String,
    pub race_name: Option<String>,
    pub race_date: NaiveDate,
    pub track_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TrainerWinningsRow {
    pub trainer_id: String,
    pub trainer: String,
    pub total_winnings: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TrackStatsRow {
    pub track_name: String,
    pub race_count: i64,
    pub participations: i64,
}

/// Result row joined with the horse name, as previewed after registering a race.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RaceResultView {
    pub race_id: String,
    pub horse_id: String,
    pub horse_name: String,
    pub results: FinishPosition,
    pub prize: f64,
}

/// Normalises an owner last-name search term.
pub fn owner_search_term(lname: &str) -> DomainResult<String> {
    let term = lname.trim();
    if term.is_empty() {
        return Err(DomainError::Validation(
            "enter a last name to search".to_string(),
        ));
    }
    Ok(term.to_string())
}
