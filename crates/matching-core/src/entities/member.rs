//! Member - the identity collaborator's view of a user

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DomainError;
use crate::value_objects::{ActorRole, Snowflake};

/// Marketplace role of a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberRole {
    Client,
    Expert,
}

impl MemberRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Expert => "EXPERT",
        }
    }
}

impl From<MemberRole> for ActorRole {
    fn from(role: MemberRole) -> Self {
        match role {
            MemberRole::Client => ActorRole::Client,
            MemberRole::Expert => ActorRole::Expert,
        }
    }
}

impl FromStr for MemberRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CLIENT" => Ok(Self::Client),
            "EXPERT" => Ok(Self::Expert),
            other => Err(DomainError::InternalError(format!("unknown member role: {other}"))),
        }
    }
}

/// Member entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub id: Snowflake,
    pub role: MemberRole,
    pub nickname: String,
}

impl Member {
    pub fn new(id: Snowflake, role: MemberRole, nickname: impl Into<String>) -> Self {
        Self {
            id,
            role,
            nickname: nickname.into(),
        }
    }

    pub fn is_client(&self) -> bool {
        self.role == MemberRole::Client
    }
}
