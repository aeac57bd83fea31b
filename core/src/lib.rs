//! civicfix-core: municipal-complaint routing, SLA tracking, escalation,
//! and performance scoring over a SQLite store.
//!
//! The engine (`engine::TrackerEngine`) is the front door; the batch
//! scheduler (`scheduler`) is the only other writer. Everything else is
//! policy components the engine composes: `routing`, `sla`,
//! `escalation`, `scoring`.

pub mod clock;
pub mod complaint;
pub mod config;
pub mod department;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod event;
pub mod notify;
pub mod routing;
pub mod scheduler;
pub mod scoring;
pub mod sla;
pub mod staff;
pub mod store;
pub mod types;
