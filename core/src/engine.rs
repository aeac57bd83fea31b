//! The tracker engine: the front door for every lifecycle mutation.
//!
//! CONTROL FLOW (fixed, documented):
//!   intake    → normalize city → route → initialize SLA → persist
//!   staff     → status transitions, resolution, manual escalation
//!   citizen   → feedback (resolved complaints only, at most once)
//!   scheduler → periodic SLA refresh + escalation over active complaints
//!
//! RULES:
//!   - Every mutation appends an event to the event log.
//!   - Preconditions are validated here; the components below assume
//!     they already hold.
//!   - Notification delivery is best-effort and never fails a call.

use crate::{
    clock::{Clock, SystemClock},
    complaint::{ComplaintRecord, ComplaintStatus, EscalationState},
    config::TrackerConfig,
    department::Department,
    error::{CoreError, CoreResult},
    escalation,
    event::{event_type_name, EventLogEntry, TrackerEvent},
    notify::{deliver, LogNotifier, Notifier},
    routing,
    scheduler::{self, BatchGuard, BatchOutcome, ScheduledBatch},
    scoring::{self, AwardTrigger},
    sla,
    store::Store,
    types::ComplaintId,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Sentinel classifier output meaning "nothing actionable": the
/// complaint is auto-closed at intake and the router never runs.
pub const SENTINEL_CATEGORY: &str = "Normal";

/// A citizen submission, after geocoding and classification.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NewComplaint {
    pub citizen_id: String,
    pub category: String,
    pub city: String,
    #[serde(default)]
    pub description: String,
}

pub struct TrackerEngine {
    store: Store,
    config: TrackerConfig,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    batch_guard: Arc<BatchGuard>,
}

impl TrackerEngine {
    pub fn new(store: Store, config: TrackerConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(LogNotifier),
            batch_guard: Arc::new(BatchGuard::default()),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    // ── Intake ─────────────────────────────────────────────────

    /// Files a citizen complaint: normalizes the city, routes it,
    /// starts the SLA clock, persists, and notifies the assignees.
    ///
    /// A routing dead end (`NoResponsibleParty`) does not fail intake;
    /// the complaint is persisted unassigned and flagged, so the
    /// citizen still gets a tracking id.
    pub fn file_complaint(&self, new: NewComplaint) -> CoreResult<ComplaintRecord> {
        let now = self.clock.now();
        let city = self.config.normalize_city(&new.city);
        if city.is_empty() {
            return Err(CoreError::MissingCity);
        }
        let complaint_id = format!("cmp-{}", Uuid::new_v4());

        // Sentinel category: auto-close with no assignment and no SLA clock.
        if new.category.trim().eq_ignore_ascii_case(SENTINEL_CATEGORY) {
            let record = ComplaintRecord {
                complaint_id: complaint_id.clone(),
                citizen_id: new.citizen_id,
                category: new.category.clone(),
                department: None,
                city,
                description: new.description,
                status: ComplaintStatus::AutoClosed,
                created_at: now,
                resolved_at: None,
                feedback_rating: None,
                feedback_comment: None,
                points_awarded: 0,
                assigned_to: None,
                assigned_users: Vec::new(),
                sla: None,
                escalation: EscalationState::default(),
            };
            self.store.insert_complaint(&record)?;
            self.append_event(
                now,
                &TrackerEvent::ComplaintAutoClosed {
                    complaint_id,
                    category: new.category,
                },
            )?;
            return Ok(record);
        }

        let department = Department::from_category(&new.category);
        let decision = match routing::route(&self.store, &new.category, &city) {
            Ok(decision) => Some(decision),
            Err(CoreError::NoResponsibleParty { .. }) => {
                log::warn!(
                    "complaint {complaint_id}: no responsible party in {city}, persisting unassigned"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let record = ComplaintRecord {
            complaint_id: complaint_id.clone(),
            citizen_id: new.citizen_id,
            category: new.category.clone(),
            department,
            city: city.clone(),
            description: new.description,
            status: ComplaintStatus::Open,
            created_at: now,
            resolved_at: None,
            feedback_rating: None,
            feedback_comment: None,
            points_awarded: 0,
            assigned_to: decision.as_ref().map(|d| d.primary.staff_id.clone()),
            assigned_users: decision
                .as_ref()
                .map(|d| d.assigned_users.clone())
                .unwrap_or_default(),
            sla: Some(sla::initialize(&self.config.sla, department, now, now)),
            escalation: EscalationState::default(),
        };
        self.store.insert_complaint(&record)?;

        self.append_event(
            now,
            &TrackerEvent::ComplaintFiled {
                complaint_id: complaint_id.clone(),
                citizen_id: record.citizen_id.clone(),
                city: city.clone(),
                category: new.category,
                department: department.map(|d| d.as_str().to_string()),
            },
        )?;

        match &decision {
            Some(decision) => {
                self.append_event(
                    now,
                    &TrackerEvent::ComplaintAssigned {
                        complaint_id: complaint_id.clone(),
                        primary: decision.primary.staff_id.clone(),
                        assigned_users: decision.assigned_users.clone(),
                    },
                )?;
                for assignee in &decision.assigned_users {
                    deliver(
                        self.notifier.as_ref(),
                        assignee,
                        &format!("New complaint {complaint_id} assigned in {city}"),
                    );
                }
            }
            None => {
                self.append_event(
                    now,
                    &TrackerEvent::RoutingFailed {
                        complaint_id: complaint_id.clone(),
                        city,
                        reason: "no responsible party".to_string(),
                    },
                )?;
            }
        }

        Ok(record)
    }

    // ── Staff actions ──────────────────────────────────────────

    /// `Open → InProgress`.
    pub fn start_progress(&self, complaint_id: &ComplaintId) -> CoreResult<()> {
        let complaint = self.load(complaint_id)?;
        complaint
            .status
            .validate_transition(ComplaintStatus::InProgress)?;
        self.store
            .update_status(complaint_id, ComplaintStatus::InProgress, None)?;
        self.append_event(
            self.clock.now(),
            &TrackerEvent::StatusChanged {
                complaint_id: complaint_id.clone(),
                from: complaint.status.as_str().to_string(),
                to: ComplaintStatus::InProgress.as_str().to_string(),
            },
        )
    }

    /// Transitions into `Resolved`, sets `resolved_at` exactly once,
    /// and awards resolution points to the primary assignee.
    ///
    /// Returns the points awarded (0 for unassigned complaints).
    pub fn resolve_complaint(&self, complaint_id: &ComplaintId) -> CoreResult<i64> {
        let mut complaint = self.load(complaint_id)?;
        complaint
            .status
            .validate_transition(ComplaintStatus::Resolved)?;

        let now = self.clock.now();
        self.store
            .update_status(complaint_id, ComplaintStatus::Resolved, Some(now))?;
        let from = complaint.status;
        complaint.status = ComplaintStatus::Resolved;
        complaint.resolved_at = Some(now);

        self.append_event(
            now,
            &TrackerEvent::StatusChanged {
                complaint_id: complaint_id.clone(),
                from: from.as_str().to_string(),
                to: ComplaintStatus::Resolved.as_str().to_string(),
            },
        )?;
        self.append_event(
            now,
            &TrackerEvent::ComplaintResolved {
                complaint_id: complaint_id.clone(),
                resolved_at: now,
                resolution_hours: (now - complaint.created_at).num_hours(),
            },
        )?;

        let points = scoring::award(
            &self.store,
            &self.config.scoring,
            complaint.assigned_to.as_ref(),
            &complaint,
            AwardTrigger::Resolution,
        )?;
        if points != 0 {
            self.store.set_points_awarded(complaint_id, points)?;
            self.append_event(
                now,
                &TrackerEvent::PointsAwarded {
                    complaint_id: complaint_id.clone(),
                    staff_id: complaint.assigned_to.clone().unwrap_or_default(),
                    points,
                    trigger: AwardTrigger::Resolution.as_str().to_string(),
                },
            )?;
        }

        deliver(
            self.notifier.as_ref(),
            &complaint.citizen_id,
            &format!("Your complaint {complaint_id} has been resolved"),
        );
        Ok(points)
    }

    // ── Citizen feedback ───────────────────────────────────────

    /// Records citizen feedback, at most once, on a resolved complaint.
    /// Ratings at or above the configured bar earn the assignee the
    /// flat feedback bonus. Returns the points awarded.
    pub fn record_feedback(
        &self,
        complaint_id: &ComplaintId,
        rating: i32,
        comment: Option<&str>,
    ) -> CoreResult<i64> {
        if !(1..=5).contains(&rating) {
            return Err(CoreError::InvalidRating { rating });
        }
        let mut complaint = self.load(complaint_id)?;
        if complaint.status != ComplaintStatus::Resolved {
            return Err(CoreError::FeedbackNotAllowed {
                status: complaint.status.as_str().to_string(),
            });
        }
        if complaint.feedback_rating.is_some() {
            return Err(CoreError::FeedbackAlreadyRecorded {
                complaint_id: complaint_id.clone(),
            });
        }

        let now = self.clock.now();
        self.store.set_feedback(complaint_id, rating, comment)?;
        complaint.feedback_rating = Some(rating);
        self.append_event(
            now,
            &TrackerEvent::FeedbackRecorded {
                complaint_id: complaint_id.clone(),
                rating,
            },
        )?;

        let points = scoring::award(
            &self.store,
            &self.config.scoring,
            complaint.assigned_to.as_ref(),
            &complaint,
            AwardTrigger::Feedback,
        )?;
        if points != 0 {
            self.store.set_points_awarded(complaint_id, points)?;
            self.append_event(
                now,
                &TrackerEvent::PointsAwarded {
                    complaint_id: complaint_id.clone(),
                    staff_id: complaint.assigned_to.clone().unwrap_or_default(),
                    points,
                    trigger: AwardTrigger::Feedback.as_str().to_string(),
                },
            )?;
        }
        Ok(points)
    }

    // ── Escalation ─────────────────────────────────────────────

    /// Administrative escalation outside the batch path: any level,
    /// explicit reason, `auto_escalated = false`.
    pub fn escalate_manual(
        &self,
        complaint_id: &ComplaintId,
        target_staff_id: &str,
        level: u8,
        reason: &str,
    ) -> CoreResult<()> {
        let mut complaint = self.load(complaint_id)?;
        if complaint.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                from: complaint.status.as_str().to_string(),
                to: complaint.status.as_str().to_string(),
                reason: "cannot escalate a terminal complaint".to_string(),
            });
        }
        let target =
            self.store
                .staff(target_staff_id)?
                .ok_or_else(|| CoreError::StaffNotFound {
                    staff_id: target_staff_id.to_string(),
                })?;

        let now = self.clock.now();
        escalation::escalate_manual(&self.store, &mut complaint, &target, level, reason, now)?;
        deliver(
            self.notifier.as_ref(),
            &target.staff_id,
            &format!("Complaint {complaint_id} escalated to you (level {level})"),
        );
        Ok(())
    }

    // ── Batch ──────────────────────────────────────────────────

    /// Administrative manual trigger. Identical to a scheduled run:
    /// same routine, same complaint set, same single-flight guard.
    /// Returns `None` when a pass is already in flight.
    pub fn run_batch_once(&self) -> CoreResult<Option<BatchOutcome>> {
        self.batch_guard.try_run(
            &self.store,
            &self.config,
            self.notifier.as_ref(),
            self.clock.now(),
        )
    }

    /// Starts the recurring background scheduler on its own store
    /// connection. File-backed databases only; `:memory:` reopens as
    /// an isolated database.
    pub fn start_scheduler(&self) -> CoreResult<ScheduledBatch> {
        Ok(scheduler::spawn(
            self.store.reopen()?,
            self.config.clone(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.clock),
            Arc::clone(&self.batch_guard),
        ))
    }

    // ── Internals ──────────────────────────────────────────────

    fn load(&self, complaint_id: &ComplaintId) -> CoreResult<ComplaintRecord> {
        self.store
            .complaint(complaint_id)?
            .ok_or_else(|| CoreError::ComplaintNotFound {
                complaint_id: complaint_id.clone(),
            })
    }

    fn append_event(&self, now: DateTime<Utc>, event: &TrackerEvent) -> CoreResult<()> {
        self.store.append_event(&EventLogEntry {
            id: None,
            occurred_at: now,
            event_type: event_type_name(event).to_string(),
            payload: serde_json::to_string(event)?,
        })
    }
}
