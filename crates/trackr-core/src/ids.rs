//! ID prefix constants.
//!
//! Every generated id is `"{prefix}-{8 hex chars}"`, e.g. `iss-a3f8b2c1`.

pub const PREFIX_ISSUE: &str = "iss";
pub const PREFIX_AUDIT: &str = "aud";
pub const PREFIX_PROJECT: &str = "prj";
pub const PREFIX_USER: &str = "usr";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_ISSUE, PREFIX_AUDIT, PREFIX_PROJECT, PREFIX_USER];

/// Format a human-readable issue key, e.g. `PROJ-12`.
#[must_use]
pub fn issue_key(project_key: &str, seq: i64) -> String {
    format!("{project_key}-{seq}")
}
