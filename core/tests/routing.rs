//! Assignment router scenarios: fallback chain, department matching,
//! and routing determinism.

mod common;

use civicfix_core::{department::Department, error::CoreError, routing};
use common::{admin, global_admin, new_complaint, staff, tracker};

/// Case A: a city with zero staff and one admin routes everything to
/// that admin, alone.
#[test]
fn city_without_staff_falls_back_to_city_admin() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&admin("A1", "Riverdale", None)).unwrap();

    let decision = routing::route(store, "Plumbing", "Riverdale").unwrap();
    assert_eq!(decision.primary.staff_id, "A1");
    assert_eq!(decision.assigned_users, vec!["A1".to_string()]);
    assert_eq!(decision.department, Some(Department::Plumbing));
}

/// Case B: staff exist but none in the required department gets the same
/// fallback as Case A.
#[test]
fn city_without_department_staff_falls_back_to_city_admin() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&admin("A1", "Riverdale", None)).unwrap();
    store
        .insert_staff(&staff("S2", "Riverdale", Department::Electrical))
        .unwrap();

    let decision = routing::route(store, "Plumbing", "Riverdale").unwrap();
    assert_eq!(decision.primary.staff_id, "A1");
    assert_eq!(decision.assigned_users, vec!["A1".to_string()]);
}

/// Case C: department staff exist; first by list order is primary and
/// the city admin assists. Category matching is case-insensitive.
#[test]
fn department_staff_wins_with_admin_assisting() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&admin("A1", "Riverdale", None)).unwrap();
    store
        .insert_staff(&staff("S1", "Riverdale", Department::Plumbing))
        .unwrap();
    store
        .insert_staff(&staff("S2", "Riverdale", Department::Electrical))
        .unwrap();

    let decision = routing::route(store, "plumbing", "Riverdale").unwrap();
    assert_eq!(decision.primary.staff_id, "S1");
    assert_eq!(
        decision.assigned_users,
        vec!["S1".to_string(), "A1".to_string()]
    );
}

/// No city admin: the sentinel "Global" admin is the last fallback.
#[test]
fn global_admin_is_last_fallback() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&global_admin("G1")).unwrap();

    let decision = routing::route(store, "Structural", "Riverdale").unwrap();
    assert_eq!(decision.primary.staff_id, "G1");
}

/// With no admin of any kind the router reports the one hard failure.
#[test]
fn empty_directory_yields_no_responsible_party() {
    let t = tracker();
    let result = routing::route(t.engine.store(), "Plumbing", "Riverdale");
    assert!(matches!(
        result,
        Err(CoreError::NoResponsibleParty { city }) if city == "Riverdale"
    ));
}

/// An unmapped category routes city-level only: department staff never
/// match, so the admin fallback applies even when staff exist.
#[test]
fn unmapped_category_routes_to_admin() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&admin("A1", "Riverdale", None)).unwrap();
    store
        .insert_staff(&staff("S1", "Riverdale", Department::Plumbing))
        .unwrap();

    let decision = routing::route(store, "Potholes", "Riverdale").unwrap();
    assert_eq!(decision.primary.staff_id, "A1");
    assert_eq!(decision.department, None);
}

/// Identical directory state always yields the identical decision.
#[test]
fn routing_is_deterministic() {
    let t = tracker();
    let store = t.engine.store();
    store.insert_staff(&admin("A1", "Riverdale", None)).unwrap();
    for id in ["S3", "S1", "S2"] {
        store
            .insert_staff(&staff(id, "Riverdale", Department::Plumbing))
            .unwrap();
    }

    let first = routing::route(store, "Plumbing", "Riverdale").unwrap();
    let second = routing::route(store, "Plumbing", "Riverdale").unwrap();
    assert_eq!(first, second);
    // List order is staff-id ascending, regardless of insertion order.
    assert_eq!(first.primary.staff_id, "S1");
}

/// A routing dead end does not fail intake: the complaint is persisted
/// unassigned and the citizen still gets a tracking id.
#[test]
fn unroutable_complaint_is_still_created() {
    let t = tracker();
    let record = t
        .engine
        .file_complaint(new_complaint("cit-1", "Plumbing", "Riverdale"))
        .unwrap();

    assert_eq!(record.assigned_to, None);
    assert!(record.assigned_users.is_empty());
    let stored = t
        .engine
        .store()
        .complaint(&record.complaint_id)
        .unwrap()
        .expect("complaint persisted");
    assert_eq!(stored.assigned_to, None);
    assert_eq!(
        t.engine
            .store()
            .events_by_type("routing_failed")
            .unwrap()
            .len(),
        1
    );
}
