//! Scoring ledger: point awards, streaks, and badge recomputation.
//!
//! Awards are pure given their inputs; the only side effect is one
//! atomic store mutation (points, streak, badge together or not at
//! all). An absent staff id earns nobody points and is never an error.

use crate::{
    complaint::ComplaintRecord,
    config::ScoringConfig,
    error::CoreResult,
    store::Store,
    types::StaffId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwardTrigger {
    Resolution,
    Feedback,
}

impl AwardTrigger {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolution => "resolution",
            Self::Feedback => "feedback",
        }
    }
}

/// Computes the point value for a trigger without touching the store.
///
/// RESOLUTION: base plus a linearly decaying speed bonus:
/// `round((1 - duration/window) * max)`, zero once the duration passes
/// the window. FEEDBACK: flat bonus iff the rating clears the bar.
#[must_use]
pub fn points_for(
    config: &ScoringConfig,
    complaint: &ComplaintRecord,
    trigger: AwardTrigger,
) -> i64 {
    match trigger {
        AwardTrigger::Resolution => {
            let Some(resolved_at) = complaint.resolved_at else {
                return 0;
            };
            let duration_secs = (resolved_at - complaint.created_at).num_seconds().max(0);
            let window_secs = config.speed_bonus_window_hours * 3600;
            let bonus = if duration_secs <= window_secs && window_secs > 0 {
                let fraction = duration_secs as f64 / window_secs as f64;
                ((1.0 - fraction) * config.speed_bonus_max as f64).round() as i64
            } else {
                0
            };
            config.resolution_base + bonus
        }
        AwardTrigger::Feedback => match complaint.feedback_rating {
            Some(rating) if rating >= config.feedback_min_rating => config.feedback_bonus,
            _ => 0,
        },
    }
}

/// Awards points to `staff_id` for a lifecycle trigger.
///
/// Returns the points awarded. Zero-point awards mutate nothing;
/// resolution awards also increment the streak; the badge is always
/// recomputed from the post-increment total inside the same store
/// transaction. A missing staff row is a soft failure: logged, `0`.
pub fn award(
    store: &Store,
    config: &ScoringConfig,
    staff_id: Option<&StaffId>,
    complaint: &ComplaintRecord,
    trigger: AwardTrigger,
) -> CoreResult<i64> {
    let Some(staff_id) = staff_id else {
        return Ok(0); // unassigned complaints earn nobody points
    };

    let points = points_for(config, complaint, trigger);
    if points == 0 {
        return Ok(0);
    }

    let streak_delta = match trigger {
        AwardTrigger::Resolution => 1,
        AwardTrigger::Feedback => 0,
    };

    match store.apply_award(staff_id, points, streak_delta)? {
        Some(new_total) => {
            log::debug!(
                "awarded {points} pts to {staff_id} for {} on {} (total {new_total})",
                trigger.as_str(),
                complaint.complaint_id
            );
            Ok(points)
        }
        None => {
            log::warn!(
                "award of {points} pts skipped: staff {staff_id} not found (complaint {})",
                complaint.complaint_id
            );
            Ok(0)
        }
    }
}
