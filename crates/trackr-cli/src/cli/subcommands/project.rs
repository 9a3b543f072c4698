use clap::Subcommand;

/// Project commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// Create a project.
    Create {
        /// Issue key prefix, e.g. PROJ
        key: String,
        #[arg(long)]
        name: String,
    },
    /// Get a project by id or key.
    Get { project: String },
    /// List projects.
    List,
    /// Set a project's status (active, on-hold, completed, archived).
    Status { project: String, status: String },
}
