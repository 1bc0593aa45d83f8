use std::collections::BTreeSet;

use billing_types::TeamRole;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by every seat mutation; serializes concurrent seat changes.
    #[serde(default)]
    pub seats_version: u64,
    /// Members holding a seat. Capacity is checked against this set, and it only
    /// changes through a revision-conditional write of this document.
    #[serde(default)]
    pub seat_holders: BTreeSet<String>,
}

impl Team {
    pub fn holds_seat(&self, member_id: &str) -> bool {
        self.seat_holders.contains(member_id)
    }

    pub fn assigned_seats(&self) -> u32 {
        self.seat_holders.len() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub email: String,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Option<String>,
    #[serde(default)]
    pub seat_assignment: Option<SeatAssignment>,
}

impl TeamMember {
    pub fn has_active_seat(&self) -> bool {
        self.seat_assignment
            .as_ref()
            .is_some_and(|seat| seat.is_active)
    }

    pub fn is_owner(&self) -> bool {
        self.role == TeamRole::Owner
    }
}
