//! Loan application lifecycle, messaging, and notification engine.
//!
//! The [`portal`] module owns the domain: the entity store, the status transition rules, the
//! message threads, notification fan-out, trust scoring, and the role-scoped read projections.
//! [`config`], [`telemetry`], and [`error`] carry the ambient service concerns shared with the
//! HTTP binary.

pub mod config;
pub mod error;
pub mod portal;
pub mod telemetry;
