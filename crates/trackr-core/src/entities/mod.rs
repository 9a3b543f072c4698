//! Entity structs for trackr's persisted domain objects.
//!
//! Each entity derives `Serialize`, `Deserialize`, and `JsonSchema` so it can be
//! emitted by the CLI and validated against its generated schema in tests.

pub mod audit;
pub mod issue;
pub mod member;
pub mod project;
pub mod user;

pub use audit::AuditEntry;
pub use issue::Issue;
pub use member::Member;
pub use project::Project;
pub use user::User;
