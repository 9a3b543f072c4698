use clap::Subcommand;

/// Membership commands.
#[derive(Clone, Debug, Subcommand)]
pub enum MemberCommands {
    /// Add a user to a project, or reactivate them.
    Add {
        project: String,
        user: String,
        /// member or project-leader
        #[arg(long, default_value = "member")]
        role: String,
    },
    /// List a project's members.
    List { project: String },
    /// Deactivate a membership.
    Deactivate { project: String, user: String },
}
