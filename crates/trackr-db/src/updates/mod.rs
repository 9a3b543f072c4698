//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only fields
//! that differ from the stored row generate SET clauses and audit entries.

pub mod issue;
