//! Trainer applications awaiting an admin decision.

use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "approved" => Ok(ApplicationStatus::Approved),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(DomainError::IntegrityViolation(format!(
                "unknown application status '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrainerApplication {
    pub app_id: i64,
    pub fname: String,
    pub lname: String,
    pub stable_id: String,
    pub requested_at: DateTime<Utc>,
    pub status: ApplicationStatus,
    pub decided_at: Option<DateTime<Utc>>,
    pub decision_by: Option<String>,
    pub decision_reason: Option<String>,
    pub approved_trainer_id: Option<String>,
}

/// Outcome written back onto a pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationDecision {
    Approved { trainer_id: String, decided_by: String },
    Rejected { reason: Option<String>, decided_by: String },
}

impl ApplicationDecision {
    pub fn status(&self) -> ApplicationStatus {
        match self {
            ApplicationDecision::Approved { .. } => ApplicationStatus::Approved,
            ApplicationDecision::Rejected { .. } => ApplicationStatus::Rejected,
        }
    }

    pub fn decided_by(&self) -> &str {
        match self {
            ApplicationDecision::Approved { decided_by, .. }
            | ApplicationDecision::Rejected { decided_by, .. } => decided_by,
        }
    }
}
