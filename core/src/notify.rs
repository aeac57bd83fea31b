//! Notification delivery: a best-effort external collaborator.
//!
//! Delivery is fire-and-forget: failures are logged and swallowed,
//! never propagated into the calling path.

use crate::types::StaffId;
use std::sync::Mutex;

pub trait Notifier: Send + Sync {
    /// Attempts delivery; implementations report failure via `Err`,
    /// which `deliver` turns into a warning log.
    fn notify(&self, recipient: &StaffId, message: &str) -> anyhow::Result<()>;
}

/// Sends a notification, swallowing any delivery failure.
pub fn deliver(notifier: &dyn Notifier, recipient: &StaffId, message: &str) {
    if let Err(e) = notifier.notify(recipient, message) {
        log::warn!("notification to {recipient} failed (dropped): {e}");
    }
}

/// Production default: writes deliveries to the log. A real deployment
/// swaps in an out-of-band channel behind the same trait.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, recipient: &StaffId, message: &str) -> anyhow::Result<()> {
        log::info!("notify {recipient}: {message}");
        Ok(())
    }
}

/// Test notifier: records every delivery for assertion.
///
/// The mutex lock is unwrapped: poisoning is unreachable because no
/// code panics while holding it.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(StaffId, String)>>,
}

impl RecordingNotifier {
    pub fn messages_for(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(r, _)| r == recipient)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, recipient: &StaffId, message: &str) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient.clone(), message.to_string()));
        Ok(())
    }
}
