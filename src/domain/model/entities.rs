use crate::domain::error::DomainError;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Owner {
    pub owner_id: String,
    pub fname: String,
    pub lname: String,
}

/// One of an owner's horses with its total number of owners. Horses with an
/// `owner_count` of 1 are removed when that owner is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OwnerHorse {
    pub horse_id: String,
    pub horse_name: String,
    pub owner_count: i64,
}

/// Owner row plus the number of horses it currently owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OwnerSummary {
    pub owner_id: String,
    pub fname: String,
    pub lname: String,
    pub horse_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Stable {
    pub stable_id: String,
    pub stable_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Horse {
    pub horse_id: String,
    pub horse_name: String,
    pub age: Option<i32>,
    /// Single character, `M` or `F` in practice.
    pub gender: Option<String>,
    pub registration: i32,
    pub stable_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Race {
    pub race_id: String,
    pub race_name: Option<String>,
    pub track_name: String,
    pub race_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub race_time: NaiveTime,
}

/// Finishing position of a horse in a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum FinishPosition {
    #[serde(rename = "first")]
    First,
    #[serde(rename = "second")]
    Second,
    #[serde(rename = "third")]
    Third,
    #[serde(rename = "fourth")]
    Fourth,
    #[serde(rename = "last")]
    Last,
    #[serde(rename = "no show")]
    NoShow,
}

impl FinishPosition {
    pub const ALL: [FinishPosition; 6] = [
        FinishPosition::First,
        FinishPosition::Second,
        FinishPosition::Third,
        FinishPosition::Fourth,
        FinishPosition::Last,
        FinishPosition::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishPosition::First => "first",
            FinishPosition::Second => "second",
            FinishPosition::Third => "third",
            FinishPosition::Fourth => "fourth",
            FinishPosition::Last => "last",
            FinishPosition::NoShow => "no show",
        }
    }
}

impl fmt::Display for FinishPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinishPosition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FinishPosition::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown race result '{}'", s)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RaceResult {
    pub race_id: String,
    pub horse_id: String,
    pub results: FinishPosition,
    pub prize: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Trainer {
    pub trainer_id: String,
    pub fname: String,
    pub lname: String,
    pub stable_id: String,
}

/// One participating horse when registering a race.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RaceEntry {
    pub horse_id: String,
    pub results: FinishPosition,
    pub prize: f64,
}

/// A race to register; the race id is allocated on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewRace {
    #[serde(default)]
    pub race_name: Option<String>,
    pub track_name: String,
    pub race_date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub race_time: NaiveTime,
    pub entries: Vec<RaceEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_position_uses_schema_spelling() {
        assert_eq!(
            serde_json::to_value(FinishPosition::NoShow).unwrap(),
            serde_json::json!("no show")
        );
        assert_eq!("fourth".parse::<FinishPosition>().unwrap(), FinishPosition::Fourth);
        assert!("winner".parse::<FinishPosition>().is_err());
    }
}
