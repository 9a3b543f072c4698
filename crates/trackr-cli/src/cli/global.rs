use clap::ValueEnum;

/// Shared output mode across all commands.
#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Raw,
}

/// Global flags available before or after subcommands.
#[derive(Clone, Debug)]
pub struct GlobalFlags {
    pub format: OutputFormat,
    pub actor: Option<String>,
    pub limit: Option<u32>,
    pub quiet: bool,
    pub verbose: bool,
}

impl GlobalFlags {
    /// The acting user id, required by every mutating issue command.
    pub fn require_actor(&self) -> anyhow::Result<&str> {
        self.actor
            .as_deref()
            .filter(|actor| !actor.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("--actor <USER_ID> is required for this command"))
    }
}
