//! Batch scheduler: the only path that advances SLA and escalation
//! state without a direct staff action.
//!
//! One pass enumerates every non-terminal complaint and, per complaint:
//! SLA refresh first, escalation check second (the escalation decision
//! reads the overdue state just computed). A failure on one complaint
//! is caught, logged, and counted; the pass always completes with
//! accurate counts for the complaints that succeeded.
//!
//! A timer-driven run and an administrative manual trigger share the
//! same single-flight guard, so two passes never overlap the same
//! complaint set.

use crate::{
    clock::Clock,
    complaint::ComplaintRecord,
    config::TrackerConfig,
    error::CoreResult,
    escalation,
    event::{event_type_name, EventLogEntry, TrackerEvent},
    notify::{deliver, Notifier},
    sla,
    store::Store,
};
use chrono::{DateTime, Utc};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread::JoinHandle;
use std::time::Duration;

/// Counts reported by one batch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Complaints whose SLA snapshot changed this pass.
    pub updated: u64,
    /// Successful escalation level transitions.
    pub escalated: u64,
    /// Complaints whose evaluation failed (isolated, logged).
    pub failed: u64,
}

/// Runs one full evaluation pass over all active complaints.
pub fn run_batch_once(
    store: &Store,
    config: &TrackerConfig,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> CoreResult<BatchOutcome> {
    let mut outcome = BatchOutcome::default();

    for mut complaint in store.non_terminal_complaints()? {
        match evaluate_one(store, config, notifier, &mut complaint, now) {
            Ok((updated, escalated)) => {
                if updated {
                    outcome.updated += 1;
                }
                if escalated {
                    outcome.escalated += 1;
                }
            }
            Err(e) => {
                outcome.failed += 1;
                log::warn!(
                    "batch: complaint {} evaluation failed, continuing: {e}",
                    complaint.complaint_id
                );
            }
        }
    }

    let event = TrackerEvent::BatchCompleted {
        updated: outcome.updated,
        escalated: outcome.escalated,
        failed: outcome.failed,
    };
    store.append_event(&EventLogEntry {
        id: None,
        occurred_at: now,
        event_type: event_type_name(&event).to_string(),
        payload: serde_json::to_string(&event)?,
    })?;

    log::info!(
        "batch pass: updated={} escalated={} failed={}",
        outcome.updated,
        outcome.escalated,
        outcome.failed
    );
    Ok(outcome)
}

/// SLA refresh, then escalation, for a single complaint.
fn evaluate_one(
    store: &Store,
    config: &TrackerConfig,
    notifier: &dyn Notifier,
    complaint: &mut ComplaintRecord,
    now: DateTime<Utc>,
) -> CoreResult<(bool, bool)> {
    let Some(sla_state) = complaint.sla.as_mut() else {
        return Ok((false, false)); // never got an SLA clock
    };

    let refresh = sla::refresh(sla_state, now);
    if refresh.changed {
        store.update_sla(&complaint.complaint_id, sla_state)?;
    }
    if refresh.newly_breached {
        let event = TrackerEvent::SlaBreached {
            complaint_id: complaint.complaint_id.clone(),
            deadline: sla_state.deadline,
            breached_at: now,
        };
        store.append_event(&EventLogEntry {
            id: None,
            occurred_at: now,
            event_type: event_type_name(&event).to_string(),
            payload: serde_json::to_string(&event)?,
        })?;
        if let Some(assignee) = &complaint.assigned_to {
            deliver(
                notifier,
                assignee,
                &format!("Complaint {} has breached its SLA", complaint.complaint_id),
            );
        }
    }

    let mut escalated = false;
    if complaint.sla.as_ref().is_some_and(|s| s.is_overdue) {
        if let Some(decision) = escalation::evaluate(store, &config.escalation, complaint, now)? {
            let target_id = decision.target.staff_id.clone();
            let level = decision.level;
            escalation::apply(store, complaint, &decision, now)?;
            deliver(
                notifier,
                &target_id,
                &format!(
                    "Complaint {} escalated to you (level {level})",
                    complaint.complaint_id
                ),
            );
            escalated = true;
        }
    }

    Ok((refresh.changed, escalated))
}

/// Single-flight batch trigger shared by the timer and manual runs.
#[derive(Debug, Default)]
pub struct BatchGuard {
    inflight: AtomicBool,
}

impl BatchGuard {
    /// Runs a pass unless one is already in flight, in which case the
    /// trigger is skipped and `Ok(None)` returned.
    pub fn try_run(
        &self,
        store: &Store,
        config: &TrackerConfig,
        notifier: &dyn Notifier,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<BatchOutcome>> {
        if self
            .inflight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::info!("batch pass already in flight; trigger skipped");
            return Ok(None);
        }
        let result = run_batch_once(store, config, notifier, now);
        self.inflight.store(false, Ordering::SeqCst);
        result.map(Some)
    }
}

/// Handle to the recurring background scheduler thread.
pub struct ScheduledBatch {
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl ScheduledBatch {
    /// Signals the thread and waits for it to finish its current pass.
    pub fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = self.handle.join();
    }
}

/// Spawns the recurring batch thread on the configured fixed interval.
///
/// The thread owns its own store connection (`Store::reopen`) and
/// shares `guard` with manual triggers, so overlapping passes are
/// impossible regardless of which side fires first.
pub fn spawn(
    store: Store,
    config: TrackerConfig,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    guard: Arc<BatchGuard>,
) -> ScheduledBatch {
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_flag = Arc::clone(&shutdown);
    let interval = Duration::from_secs(config.scheduler.interval_secs.max(1));

    let handle = std::thread::spawn(move || {
        log::info!("batch scheduler started (interval {}s)", interval.as_secs());
        while !shutdown_flag.load(Ordering::SeqCst) {
            // Sleep in short slices so stop() is responsive.
            let mut slept = Duration::ZERO;
            while slept < interval && !shutdown_flag.load(Ordering::SeqCst) {
                let slice = Duration::from_millis(200).min(interval - slept);
                std::thread::sleep(slice);
                slept += slice;
            }
            if shutdown_flag.load(Ordering::SeqCst) {
                break;
            }
            if let Err(e) = guard.try_run(&store, &config, notifier.as_ref(), clock.now()) {
                log::error!("scheduled batch pass failed: {e}");
            }
        }
        log::info!("batch scheduler stopped");
    });

    ScheduledBatch { shutdown, handle }
}
