mod audit;
mod issue;
mod member;
mod project;
mod user;

pub use audit::AuditArgs;
pub use issue::{IssueCommands, IssueCreateArgs, IssueListArgs, IssueUpdateArgs};
pub use member::MemberCommands;
pub use project::ProjectCommands;
pub use user::UserCommands;
