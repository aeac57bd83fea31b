//! Intake and status lifecycle: city normalization, sentinel
//! auto-close, transition validation, terminal freeze, notifications.

mod common;

use chrono::Duration;
use civicfix_core::{
    complaint::ComplaintStatus,
    department::Department,
    error::CoreError,
};
use common::{admin, new_complaint, staff, tracker};

/// Intake maps the category once and starts the department SLA clock.
#[test]
fn filing_initializes_assignment_and_sla() {
    let t = tracker();
    t.engine
        .store()
        .insert_staff(&admin("A1", "Riverdale", None))
        .unwrap();
    t.engine
        .store()
        .insert_staff(&staff("S1", "Riverdale", Department::Electrical))
        .unwrap();

    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "ELECTRICAL", "Riverdale"))
        .unwrap();

    assert_eq!(record.status, ComplaintStatus::Open);
    assert_eq!(record.department, Some(Department::Electrical));
    assert_eq!(record.assigned_to.as_deref(), Some("S1"));
    assert!(record
        .assigned_users
        .contains(&record.assigned_to.clone().unwrap()));

    let sla = record.sla.expect("SLA clock started");
    assert_eq!(sla.deadline, record.created_at + Duration::hours(12));
    assert_eq!(sla.time_remaining_hours, 12);
    assert!(!sla.is_overdue);

    // Both assignees were notified of the new complaint.
    assert_eq!(t.notifier.messages_for("S1").len(), 1);
    assert_eq!(t.notifier.messages_for("A1").len(), 1);
}

/// Historical city names are normalized through the alias table before
/// routing sees them.
#[test]
fn city_aliases_normalize_at_intake() {
    let t = tracker();
    t.engine
        .store()
        .insert_staff(&admin("A1", "Prayagraj", None))
        .unwrap();

    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "Sanitation", "Allahabad"))
        .unwrap();
    assert_eq!(record.city, "Prayagraj");
    assert_eq!(record.assigned_to.as_deref(), Some("A1"));
}

/// An empty city is rejected before the router runs.
#[test]
fn empty_city_is_rejected() {
    let t = tracker();
    let result = t
        .engine
        .file_complaint(new_complaint("cit-1", "Plumbing", "   "));
    assert!(matches!(result, Err(CoreError::MissingCity)));
}

/// The sentinel category "Normal" is auto-closed at intake: terminal,
/// unassigned, no SLA clock, router never consulted.
#[test]
fn sentinel_category_auto_closes() {
    let t = tracker();
    // Deliberately no directory records: routing would hard-fail, but
    // the router must never run for the sentinel.
    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "normal", "Riverdale"))
        .unwrap();

    assert_eq!(record.status, ComplaintStatus::AutoClosed);
    assert_eq!(record.assigned_to, None);
    assert!(record.sla.is_none());
    assert_eq!(
        t.engine
            .store()
            .events_by_type("complaint_auto_closed")
            .unwrap()
            .len(),
        1
    );
}

/// Open → InProgress → Resolved is the staff path; resolved_at is set
/// exactly once and a second resolution is rejected.
#[test]
fn resolution_is_a_one_way_door() {
    let t = tracker();
    t.engine
        .store()
        .insert_staff(&admin("A1", "Riverdale", None))
        .unwrap();
    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "Plumbing", "Riverdale"))
        .unwrap();

    t.engine.start_progress(&record.complaint_id).unwrap();
    t.clock.advance(Duration::hours(2));
    t.engine.resolve_complaint(&record.complaint_id).unwrap();

    let c = t
        .engine
        .store()
        .complaint(&record.complaint_id)
        .unwrap()
        .unwrap();
    assert_eq!(c.status, ComplaintStatus::Resolved);
    assert_eq!(c.resolved_at, Some(record.created_at + Duration::hours(2)));

    assert!(matches!(
        t.engine.resolve_complaint(&record.complaint_id),
        Err(CoreError::InvalidTransition { .. })
    ));
    assert!(t.engine.start_progress(&record.complaint_id).is_err());

    // The citizen heard about the resolution.
    assert!(!t.notifier.messages_for("cit-1").is_empty());
}

/// Terminal complaints are frozen: the batch pass skips them entirely,
/// even when their deadline has long passed.
#[test]
fn terminal_complaints_are_frozen() {
    let t = tracker();
    t.engine
        .store()
        .insert_staff(&admin("A1", "Riverdale", None))
        .unwrap();
    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "Plumbing", "Riverdale"))
        .unwrap();
    t.engine.resolve_complaint(&record.complaint_id).unwrap();

    t.clock.advance(Duration::hours(1000));
    let outcome = t.engine.run_batch_once().unwrap().unwrap();
    assert_eq!(outcome.updated, 0);
    assert_eq!(outcome.escalated, 0);

    let c = t
        .engine
        .store()
        .complaint(&record.complaint_id)
        .unwrap()
        .unwrap();
    let sla = c.sla.unwrap();
    assert!(!sla.is_overdue, "terminal SLA state must not move");
    assert!(sla.breached_at.is_none());
    assert_eq!(c.escalation.level, 0);
}

/// Unknown complaint ids surface as ComplaintNotFound.
#[test]
fn unknown_complaint_id_is_an_error() {
    let t = tracker();
    assert!(matches!(
        t.engine.resolve_complaint(&"cmp-missing".to_string()),
        Err(CoreError::ComplaintNotFound { .. })
    ));
}
