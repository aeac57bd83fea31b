//! Staff directory records, roles, and the badge tier table.

use crate::{department::Department, error::CoreError, types::StaffId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Sentinel city scoping the system-wide fallback admin.
pub const GLOBAL_CITY: &str = "Global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Citizen,
    Staff,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Citizen => "citizen",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "citizen" => Ok(Self::Citizen),
            "staff" => Ok(Self::Staff),
            "admin" => Ok(Self::Admin),
            _ => Err(CoreError::InvalidRole {
                value: s.to_string(),
            }),
        }
    }
}

/// A responsible party in the staff directory.
///
/// Citizens carry neither city nor department; staff are scoped to both;
/// admins are scoped to a city (the sentinel `"Global"` for the
/// system-wide fallback) and optionally a department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffRecord {
    pub staff_id: StaffId,
    pub name: String,
    pub role: Role,
    pub city: Option<String>,
    pub department: Option<Department>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub resolution_streak: i64,
    #[serde(default = "default_badge")]
    pub badge: String,
}

fn default_badge() -> String {
    badge_for_points(0).to_string()
}

/// Badge tier for a cumulative point total, evaluated highest-first.
#[must_use]
pub fn badge_for_points(points: i64) -> &'static str {
    match points {
        p if p >= 1000 => "Municipal Legend",
        p if p >= 500 => "City Champion",
        p if p >= 250 => "Expert Fixer",
        p if p >= 100 => "Problem Solver",
        _ => "Rookie",
    }
}
