//! # trackr-core
//!
//! Core types, ID prefixes, domain events, and error types for trackr.
//!
//! This crate provides the foundational types shared across all trackr crates:
//! - Entity structs (issues, audit entries, projects, users, memberships)
//! - Closed enums for issue type, status, priority, roles, and audit actions
//! - ID prefix constants and issue key formatting
//! - The error taxonomy (`ErrorKind`) and domain errors
//! - Post-commit domain events and the `EventSink` seam
//! - Result envelopes returned by outward operations

pub mod entities;
pub mod enums;
pub mod errors;
pub mod events;
pub mod ids;
pub mod responses;
