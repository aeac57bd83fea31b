//! Shared test fixtures: an in-memory tracker with a manual clock and
//! a recording notifier, plus directory record builders.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use civicfix_core::{
    clock::ManualClock,
    config::TrackerConfig,
    department::Department,
    engine::{NewComplaint, TrackerEngine},
    notify::RecordingNotifier,
    staff::{Role, StaffRecord, GLOBAL_CITY},
    store::Store,
};
use std::sync::Arc;

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

pub struct TestTracker {
    pub engine: TrackerEngine,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn tracker() -> TestTracker {
    let _ = env_logger::builder().is_test(true).try_init();
    let store = Store::in_memory().expect("in-memory store");
    store.migrate().expect("migrations");
    let clock = Arc::new(ManualClock::new(start_time()));
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = TrackerEngine::new(store, TrackerConfig::builtin())
        .with_clock(clock.clone())
        .with_notifier(notifier.clone());
    TestTracker {
        engine,
        clock,
        notifier,
    }
}

pub fn staff(id: &str, city: &str, department: Department) -> StaffRecord {
    StaffRecord {
        staff_id: id.to_string(),
        name: format!("Staff {id}"),
        role: Role::Staff,
        city: Some(city.to_string()),
        department: Some(department),
        points: 0,
        resolution_streak: 0,
        badge: "Rookie".to_string(),
    }
}

pub fn admin(id: &str, city: &str, department: Option<Department>) -> StaffRecord {
    StaffRecord {
        staff_id: id.to_string(),
        name: format!("Admin {id}"),
        role: Role::Admin,
        city: Some(city.to_string()),
        department,
        points: 0,
        resolution_streak: 0,
        badge: "Rookie".to_string(),
    }
}

pub fn global_admin(id: &str) -> StaffRecord {
    admin(id, GLOBAL_CITY, None)
}

pub fn new_complaint(citizen_id: &str, category: &str, city: &str) -> NewComplaint {
    NewComplaint {
        citizen_id: citizen_id.to_string(),
        category: category.to_string(),
        city: city.to_string(),
        description: format!("{category} issue reported in {city}"),
    }
}
