//! Lifecycle events: the audit trail of every state change.
//!
//! Every mutation the engine or the batch pass performs appends one
//! event row. The scoring ledger and the runner's summaries consume the
//! same stream; nothing replays it to rebuild state.

use crate::types::{ComplaintId, StaffId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every event emitted by the tracker. Variants are added, never
/// removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackerEvent {
    ComplaintFiled {
        complaint_id: ComplaintId,
        citizen_id: StaffId,
        city: String,
        category: String,
        department: Option<String>,
    },
    ComplaintAutoClosed {
        complaint_id: ComplaintId,
        category: String,
    },
    ComplaintAssigned {
        complaint_id: ComplaintId,
        primary: StaffId,
        assigned_users: Vec<StaffId>,
    },
    RoutingFailed {
        complaint_id: ComplaintId,
        city: String,
        reason: String,
    },
    StatusChanged {
        complaint_id: ComplaintId,
        from: String,
        to: String,
    },
    SlaBreached {
        complaint_id: ComplaintId,
        deadline: DateTime<Utc>,
        breached_at: DateTime<Utc>,
    },
    ComplaintEscalated {
        complaint_id: ComplaintId,
        level: u8,
        escalated_to: StaffId,
        auto_escalated: bool,
        reason: String,
    },
    EscalationSkipped {
        complaint_id: ComplaintId,
        attempted_level: u8,
        reason: String,
    },
    ComplaintResolved {
        complaint_id: ComplaintId,
        resolved_at: DateTime<Utc>,
        resolution_hours: i64,
    },
    FeedbackRecorded {
        complaint_id: ComplaintId,
        rating: i32,
    },
    PointsAwarded {
        complaint_id: ComplaintId,
        staff_id: StaffId,
        points: i64,
        trigger: String,
    },
    BatchCompleted {
        updated: u64,
        escalated: u64,
        failed: u64,
    },
}

/// Extract a stable string name from a `TrackerEvent` variant.
/// Used for the `event_type` column in `event_log`.
#[must_use]
pub fn event_type_name(event: &TrackerEvent) -> &'static str {
    match event {
        TrackerEvent::ComplaintFiled { .. } => "complaint_filed",
        TrackerEvent::ComplaintAutoClosed { .. } => "complaint_auto_closed",
        TrackerEvent::ComplaintAssigned { .. } => "complaint_assigned",
        TrackerEvent::RoutingFailed { .. } => "routing_failed",
        TrackerEvent::StatusChanged { .. } => "status_changed",
        TrackerEvent::SlaBreached { .. } => "sla_breached",
        TrackerEvent::ComplaintEscalated { .. } => "complaint_escalated",
        TrackerEvent::EscalationSkipped { .. } => "escalation_skipped",
        TrackerEvent::ComplaintResolved { .. } => "complaint_resolved",
        TrackerEvent::FeedbackRecorded { .. } => "feedback_recorded",
        TrackerEvent::PointsAwarded { .. } => "points_awarded",
        TrackerEvent::BatchCompleted { .. } => "batch_completed",
    }
}

/// One persisted row of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
    pub event_type: String,
    pub payload: String,
}
