//! SLA calculator: deadline math and overdue-state refresh.
//!
//! The deadline is anchored to `created_at` and never moves on its own;
//! `refresh` only recomputes the derived fields. Idempotent: the same
//! `now` always yields the same state, and a monotonically increasing
//! `now` never un-sets `breached_at`.

use crate::{complaint::SlaState, config::SlaConfig, department::Department};
use chrono::{DateTime, Duration, Utc};

/// Outcome of one `refresh` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaRefresh {
    /// Any field of the snapshot changed (the caller persists only then).
    pub changed: bool,
    /// `is_overdue` flipped false → true in this call; `breached_at`
    /// was just set.
    pub newly_breached: bool,
}

/// Computes the initial SLA snapshot at complaint creation.
#[must_use]
pub fn initialize(
    config: &SlaConfig,
    department: Option<Department>,
    created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> SlaState {
    let mut sla = SlaState {
        deadline: created_at + Duration::hours(config.hours_for(department)),
        time_remaining_hours: 0,
        is_overdue: false,
        breached_at: None,
    };
    refresh(&mut sla, now);
    sla
}

/// Recomputes the overdue state against the current wall clock.
///
/// First-breach-wins: `breached_at` is set exactly once and never
/// overwritten. Callers must exclude terminal complaints.
pub fn refresh(sla: &mut SlaState, now: DateTime<Utc>) -> SlaRefresh {
    let is_overdue = now > sla.deadline;
    let time_remaining_hours = (sla.deadline - now).num_hours().max(0);

    let newly_breached = is_overdue && sla.breached_at.is_none();
    let changed = newly_breached
        || is_overdue != sla.is_overdue
        || time_remaining_hours != sla.time_remaining_hours;

    sla.is_overdue = is_overdue;
    sla.time_remaining_hours = time_remaining_hours;
    if newly_breached {
        sla.breached_at = Some(now);
    }

    SlaRefresh {
        changed,
        newly_breached,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn deadline_uses_department_window() {
        let config = SlaConfig::default();
        let sla = initialize(&config, Some(Department::Electrical), t0(), t0());
        assert_eq!(sla.deadline, t0() + Duration::hours(12));
        assert_eq!(sla.time_remaining_hours, 12);
        assert!(!sla.is_overdue);
        assert!(sla.breached_at.is_none());
    }

    #[test]
    fn unmapped_department_gets_default_window() {
        let config = SlaConfig::default();
        let sla = initialize(&config, None, t0(), t0());
        assert_eq!(sla.deadline, t0() + Duration::hours(24));
    }

    #[test]
    fn remaining_hours_floor_and_clamp() {
        let config = SlaConfig::default();
        let mut sla = initialize(&config, Some(Department::Sanitation), t0(), t0());

        // 90 minutes in: 22.5h remaining floors to 22.
        refresh(&mut sla, t0() + Duration::minutes(90));
        assert_eq!(sla.time_remaining_hours, 22);

        // Past the deadline: clamped to zero, never negative.
        refresh(&mut sla, t0() + Duration::hours(30));
        assert_eq!(sla.time_remaining_hours, 0);
        assert!(sla.is_overdue);
    }

    #[test]
    fn refresh_is_idempotent_for_same_now() {
        let config = SlaConfig::default();
        let mut sla = initialize(&config, Some(Department::Plumbing), t0(), t0());
        let now = t0() + Duration::hours(50);

        let first = refresh(&mut sla, now);
        assert!(first.newly_breached);
        let snapshot = sla.clone();

        let second = refresh(&mut sla, now);
        assert!(!second.changed);
        assert!(!second.newly_breached);
        assert_eq!(sla, snapshot);
    }

    #[test]
    fn first_breach_wins() {
        let config = SlaConfig::default();
        let mut sla = initialize(&config, Some(Department::Electrical), t0(), t0());

        let breach_time = t0() + Duration::hours(13);
        refresh(&mut sla, breach_time);
        assert_eq!(sla.breached_at, Some(breach_time));

        // Later refreshes keep the original breach timestamp.
        refresh(&mut sla, t0() + Duration::hours(40));
        assert_eq!(sla.breached_at, Some(breach_time));
    }
}
