//! Shared primitive types used across the entire tracker.

/// A stable, unique identifier for a complaint (`cmp-<uuid>`).
pub type ComplaintId = String;

/// A stable, unique identifier for a staff, admin, or citizen record.
pub type StaffId = String;
