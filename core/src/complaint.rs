//! Complaint records and the status state machine.
//!
//! Status, SLA snapshot, and escalation snapshot together form the
//! complaint lifecycle. Transition functions are the only mutators:
//! terminal complaints are frozen (the batch pass never touches them)
//! and escalation level only moves up.

use crate::{
    department::Department,
    error::CoreError,
    types::{ComplaintId, StaffId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Escalation reason recorded on every automatic transition.
pub const REASON_SLA_BREACH: &str = "SLA_BREACH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    /// Filed, awaiting staff action.
    Open,
    /// A staff member has started working the complaint.
    InProgress,
    /// Resolved by staff; `resolved_at` is set exactly once here.
    Resolved,
    /// Closed by the system without assignment (sentinel category).
    AutoClosed,
}

impl ComplaintStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::AutoClosed => "auto_closed",
        }
    }

    /// Terminal statuses freeze the complaint: no SLA refresh, no
    /// escalation, no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::AutoClosed)
    }

    /// Validates a transition to `new_status`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidTransition` if the move is not
    /// permitted by the lifecycle rules.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), CoreError> {
        if self.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "cannot transition from a terminal status".to_string(),
            });
        }

        let valid = match self {
            Self::Open => matches!(
                new_status,
                Self::InProgress | Self::Resolved | Self::AutoClosed
            ),
            Self::InProgress => matches!(new_status, Self::Resolved),
            Self::Resolved | Self::AutoClosed => false,
        };

        if valid {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
                reason: "transition not permitted by lifecycle rules".to_string(),
            })
        }
    }
}

impl FromStr for ComplaintStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "auto_closed" => Ok(Self::AutoClosed),
            _ => Err(CoreError::InvalidStatus {
                value: s.to_string(),
            }),
        }
    }
}

/// SLA snapshot, recomputed by the SLA calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlaState {
    pub deadline: DateTime<Utc>,
    pub time_remaining_hours: i64,
    pub is_overdue: bool,
    /// Set once, the first time the deadline passes. Never cleared.
    pub breached_at: Option<DateTime<Utc>>,
}

/// Escalation snapshot. `level` is monotonically non-decreasing while
/// the complaint is active; there is no de-escalation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationState {
    pub level: u8,
    pub escalated_at: Option<DateTime<Utc>>,
    pub escalated_to: Option<StaffId>,
    pub auto_escalated: bool,
    pub reason: Option<String>,
}

impl Default for EscalationState {
    fn default() -> Self {
        Self {
            level: 0,
            escalated_at: None,
            escalated_to: None,
            auto_escalated: false,
            reason: None,
        }
    }
}

/// The unit of work: one citizen-filed complaint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplaintRecord {
    pub complaint_id: ComplaintId,
    pub citizen_id: StaffId,
    /// Raw classifier output, kept for audit; the mapped `department`
    /// is what routing and SLA math consume.
    pub category: String,
    pub department: Option<Department>,
    /// Normalized city (alias table applied at intake).
    pub city: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub feedback_rating: Option<i32>,
    pub feedback_comment: Option<String>,
    /// Last point value computed for this complaint (audit only; staff
    /// totals live on the staff record).
    pub points_awarded: i64,
    pub assigned_to: Option<StaffId>,
    /// Everyone with visibility; superset of `assigned_to` when set.
    pub assigned_users: Vec<StaffId>,
    /// `None` only for auto-closed complaints that never got an SLA clock.
    pub sla: Option<SlaState>,
    pub escalation: EscalationState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_string_round_trip() {
        for status in [
            ComplaintStatus::Open,
            ComplaintStatus::InProgress,
            ComplaintStatus::Resolved,
            ComplaintStatus::AutoClosed,
        ] {
            assert_eq!(status.as_str().parse::<ComplaintStatus>().unwrap(), status);
        }
        assert!("closed".parse::<ComplaintStatus>().is_err());
    }

    #[test]
    fn terminal_statuses_are_frozen() {
        assert!(!ComplaintStatus::Open.is_terminal());
        assert!(!ComplaintStatus::InProgress.is_terminal());
        assert!(ComplaintStatus::Resolved.is_terminal());
        assert!(ComplaintStatus::AutoClosed.is_terminal());

        assert!(ComplaintStatus::Resolved
            .validate_transition(ComplaintStatus::Open)
            .is_err());
        assert!(ComplaintStatus::AutoClosed
            .validate_transition(ComplaintStatus::Resolved)
            .is_err());
    }

    #[test]
    fn open_can_progress_or_resolve() {
        assert!(ComplaintStatus::Open
            .validate_transition(ComplaintStatus::InProgress)
            .is_ok());
        assert!(ComplaintStatus::Open
            .validate_transition(ComplaintStatus::Resolved)
            .is_ok());
        assert!(ComplaintStatus::InProgress
            .validate_transition(ComplaintStatus::Resolved)
            .is_ok());
        assert!(ComplaintStatus::InProgress
            .validate_transition(ComplaintStatus::Open)
            .is_err());
    }
}
