//! Domain records for the racing schema.
//!
//! These mirror the rows the stores read and write. Field names follow the
//! PostgreSQL column names so rows decode without renaming.

pub mod applications;
pub mod entities;

pub use applications::{ApplicationDecision, ApplicationStatus, TrainerApplication};
pub use entities::{
    FinishPosition, Horse, NewRace, Owner, OwnerHorse, OwnerSummary, Race, RaceEntry, RaceResult, Stable,
    Trainer,
};
