//! Request-scoped caller context.
//!
//! Every service operation receives the caller's role explicitly; nothing about
//! the caller is remembered between calls.

use crate::domain::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Guest => "guest",
        }
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "guest" => Ok(Role::Guest),
            other => Err(DomainError::Validation(format!("unknown role '{}'", other))),
        }
    }
}

/// Longest actor name that fits `trainer_applications.decision_by`.
pub const MAX_ACTOR_LEN: usize = 50;

pub fn check_actor(actor: &str) -> DomainResult<()> {
    if actor.chars().count() > MAX_ACTOR_LEN {
        return Err(DomainError::Validation(format!(
            "actor name is longer than {} characters",
            MAX_ACTOR_LEN
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub role: Role,
    /// Recorded as `decision_by` on trainer applications.
    pub actor: String,
}

impl RequestContext {
    pub const DEFAULT_ADMIN_ACTOR: &'static str = "Admin";

    pub fn admin() -> Self {
        Self {
            role: Role::Admin,
            actor: Self::DEFAULT_ADMIN_ACTOR.to_string(),
        }
    }

    pub fn guest() -> Self {
        Self {
            role: Role::Guest,
            actor: "Guest".to_string(),
        }
    }

    pub fn require_admin(&self, operation: &'static str) -> DomainResult<()> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Guest => Err(DomainError::Forbidden {
                role: self.role.as_str(),
                operation,
            }),
        }
    }
}
