//! Municipal departments and the category → department mapping.
//!
//! Classifier output is a free string with mixed casing from different
//! producers. It is normalized into this closed enum exactly once, at the
//! intake boundary; nothing downstream does case-insensitive lookups.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Sanitation,
    Plumbing,
    Structural,
    Electrical,
}

impl Department {
    pub const ALL: [Department; 4] = [
        Self::Sanitation,
        Self::Plumbing,
        Self::Structural,
        Self::Electrical,
    ];

    /// String representation used for persistence and API serialization.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sanitation => "sanitation",
            Self::Plumbing => "plumbing",
            Self::Structural => "structural",
            Self::Electrical => "electrical",
        }
    }

    /// Maps a raw classifier category onto a department.
    ///
    /// Case-insensitive; unmapped categories return `None` and the
    /// complaint routes city-level only.
    #[must_use]
    pub fn from_category(category: &str) -> Option<Self> {
        match category.trim().to_ascii_lowercase().as_str() {
            "sanitation" => Some(Self::Sanitation),
            "plumbing" => Some(Self::Plumbing),
            "structural" => Some(Self::Structural),
            "electrical" => Some(Self::Electrical),
            _ => None,
        }
    }
}

impl FromStr for Department {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sanitation" => Ok(Self::Sanitation),
            "plumbing" => Ok(Self::Plumbing),
            "structural" => Ok(Self::Structural),
            "electrical" => Ok(Self::Electrical),
            _ => Err(CoreError::InvalidDepartment {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
