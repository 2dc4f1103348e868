//! Actor - the verified caller of a core operation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Snowflake;

/// Role an actor acts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActorRole {
    Client,
    Expert,
    /// Internal callers: payment callbacks and the reconciliation sweep
    System,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "CLIENT",
            Self::Expert => "EXPERT",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CLIENT" => Ok(Self::Client),
            "EXPERT" => Ok(Self::Expert),
            "SYSTEM" => Ok(Self::System),
            other => Err(format!("unknown actor role: {other}")),
        }
    }
}

/// Opaque, already-verified caller identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub id: Snowflake,
    pub role: ActorRole,
}

impl Actor {
    pub const fn new(id: Snowflake, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub const fn client(id: Snowflake) -> Self {
        Self::new(id, ActorRole::Client)
    }

    pub const fn expert(id: Snowflake) -> Self {
        Self::new(id, ActorRole::Expert)
    }

    /// The engine itself, acting on gateway outcomes
    pub const fn system() -> Self {
        Self::new(Snowflake::new(0), ActorRole::System)
    }

    pub fn is_system(&self) -> bool {
        self.role == ActorRole::System
    }

    /// True if this actor is `id` acting as `role`
    pub fn is(&self, id: Snowflake, role: ActorRole) -> bool {
        self.role == role && self.id == id
    }
}
