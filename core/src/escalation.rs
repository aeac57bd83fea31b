//! Escalation engine: pushes breached complaints up the hierarchy.
//!
//! Ladder, driven only by hours elapsed since `breached_at`:
//!   0 → 1 at ≥ 6h   target: admin of same city and same department
//!   1 → 2 at ≥ 12h  target: admin of same city (any department)
//!   2 → 3 at ≥ 24h  target: the global admin
//!
//! At most one transition per evaluation pass: a complaint 30h past
//! breach climbs one level per batch tick, it never jumps. A missing
//! target skips the transition (level unchanged) as a soft failure.

use crate::{
    complaint::{ComplaintRecord, EscalationState, REASON_SLA_BREACH},
    config::EscalationConfig,
    error::{CoreError, CoreResult},
    event::{event_type_name, EventLogEntry, TrackerEvent},
    staff::StaffRecord,
    store::Store,
    types::ComplaintId,
};
use chrono::{DateTime, Utc};

pub const MAX_LEVEL: u8 = 3;

/// A decided (not yet applied) escalation step.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationDecision {
    pub level: u8,
    pub target: StaffRecord,
    pub hours_since_breach: i64,
}

/// Decides whether `complaint` escalates one level at `now`.
///
/// Returns `Ok(None)` when the complaint is terminal, not overdue, has
/// topped out, has not aged past the threshold, or no target exists at
/// the next level (logged as a warning, level untouched).
pub fn evaluate(
    store: &Store,
    config: &EscalationConfig,
    complaint: &ComplaintRecord,
    now: DateTime<Utc>,
) -> CoreResult<Option<EscalationDecision>> {
    if complaint.status.is_terminal() {
        return Ok(None);
    }
    let Some(sla) = &complaint.sla else {
        return Ok(None);
    };
    if !sla.is_overdue {
        return Ok(None);
    }
    let Some(breached_at) = sla.breached_at else {
        return Ok(None);
    };

    let level = complaint.escalation.level;
    let Some(threshold) = config.threshold_hours(level) else {
        return Ok(None); // already at the top of the ladder
    };
    let hours_since_breach = (now - breached_at).num_hours();
    if hours_since_breach < threshold {
        return Ok(None);
    }

    let next_level = level + 1;
    let target = match next_level {
        1 => match complaint.department {
            Some(dept) => store.department_admin(&complaint.city, dept)?,
            None => None, // unmapped category: no department admin can match
        },
        2 => store.city_admin(&complaint.city)?,
        3 => store.global_admin()?,
        _ => None,
    };

    match target {
        Some(target) => Ok(Some(EscalationDecision {
            level: next_level,
            target,
            hours_since_breach,
        })),
        None => {
            log::warn!(
                "complaint {}: no escalation target at level {next_level} (city {}), skipping",
                complaint.complaint_id,
                complaint.city
            );
            append_skip_event(store, complaint, next_level, now)?;
            Ok(None)
        }
    }
}

fn append_skip_event(
    store: &Store,
    complaint: &ComplaintRecord,
    attempted_level: u8,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let event = TrackerEvent::EscalationSkipped {
        complaint_id: complaint.complaint_id.clone(),
        attempted_level,
        reason: format!("no matching admin for city {}", complaint.city),
    };
    store.append_event(&EventLogEntry {
        id: None,
        occurred_at: now,
        event_type: event_type_name(&event).to_string(),
        payload: serde_json::to_string(&event)?,
    })
}

/// Applies a decided automatic escalation: mutates the snapshot, adds
/// the target to the assignee set, and appends the event.
pub fn apply(
    store: &Store,
    complaint: &mut ComplaintRecord,
    decision: &EscalationDecision,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    let esc = EscalationState {
        level: decision.level,
        escalated_at: Some(now),
        escalated_to: Some(decision.target.staff_id.clone()),
        auto_escalated: true,
        reason: Some(REASON_SLA_BREACH.to_string()),
    };
    commit(store, &complaint.complaint_id, &esc, now)?;
    if !complaint
        .assigned_users
        .contains(&decision.target.staff_id)
    {
        complaint.assigned_users.push(decision.target.staff_id.clone());
    }
    complaint.escalation = esc;
    Ok(())
}

/// Manual escalation: same mutation as the automatic path but with an
/// explicit reason, `auto_escalated = false`, and no transition-table
/// gate; the caller may set any level up to the top of the ladder.
pub fn escalate_manual(
    store: &Store,
    complaint: &mut ComplaintRecord,
    target: &StaffRecord,
    level: u8,
    reason: &str,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if level > MAX_LEVEL {
        return Err(CoreError::InvalidEscalationLevel { level });
    }
    let esc = EscalationState {
        level,
        escalated_at: Some(now),
        escalated_to: Some(target.staff_id.clone()),
        auto_escalated: false,
        reason: Some(reason.to_string()),
    };
    commit(store, &complaint.complaint_id, &esc, now)?;
    if !complaint.assigned_users.contains(&target.staff_id) {
        complaint.assigned_users.push(target.staff_id.clone());
    }
    complaint.escalation = esc;
    Ok(())
}

fn commit(
    store: &Store,
    complaint_id: &ComplaintId,
    esc: &EscalationState,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    store.update_escalation(complaint_id, esc)?;
    if let Some(target) = &esc.escalated_to {
        store.add_assignee(complaint_id, target)?;
    }
    let event = TrackerEvent::ComplaintEscalated {
        complaint_id: complaint_id.clone(),
        level: esc.level,
        escalated_to: esc.escalated_to.clone().unwrap_or_default(),
        auto_escalated: esc.auto_escalated,
        reason: esc.reason.clone().unwrap_or_default(),
    };
    store.append_event(&EventLogEntry {
        id: None,
        occurred_at: now,
        event_type: event_type_name(&event).to_string(),
        payload: serde_json::to_string(&event)?,
    })
}
