use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    AuditArgs, IssueCommands, MemberCommands, ProjectCommands, UserCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create the database and apply migrations.
    Init(InitArgs),
    /// Projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Users.
    User {
        #[command(subcommand)]
        action: UserCommands,
    },
    /// Project memberships.
    Member {
        #[command(subcommand)]
        action: MemberCommands,
    },
    /// Issues and the assignment workflow.
    Issue {
        #[command(subcommand)]
        action: IssueCommands,
    },
    /// Query the audit ledger across issues.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Database path (overrides `database.path`)
    #[arg(long)]
    pub database: Option<String>,
}
