use clap::Subcommand;

/// User commands.
#[derive(Clone, Debug, Subcommand)]
pub enum UserCommands {
    /// Register a user.
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Get a user by id.
    Get { id: String },
}
