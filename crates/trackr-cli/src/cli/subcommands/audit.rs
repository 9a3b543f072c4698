use clap::Args;

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Issue id or key
    #[arg(long)]
    pub issue: Option<String>,
    /// Action, e.g. reassign or status_change
    #[arg(long)]
    pub action: Option<String>,
    /// Acting user id recorded on the entry
    #[arg(long = "by")]
    pub actor_id: Option<String>,
}
