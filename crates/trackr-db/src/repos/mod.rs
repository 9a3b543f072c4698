//! Repository modules for trackr entities.
//!
//! Each module adds methods to `TrackrService` via `impl TrackrService` blocks.

pub mod audit;
pub mod issue;
pub mod member;
pub mod project;
pub mod user;
