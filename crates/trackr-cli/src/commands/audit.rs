use trackr_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditArgs;
use crate::commands::shared::parse::parse_action;
use crate::context::AppContext;
use crate::output::output;

/// Handle `trackr audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let issue_id = match args.issue.as_deref() {
        Some(issue) => Some(ctx.service.resolve_issue_id(issue).await?),
        None => None,
    };
    let filter = AuditFilter {
        issue_id,
        action: args.action.as_deref().map(parse_action).transpose()?,
        actor_id: args.actor_id.clone(),
        limit: flags.limit,
    };

    output(&ctx.service.query_audit(&filter).await?, flags.format)
}
