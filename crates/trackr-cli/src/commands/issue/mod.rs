mod assign;
mod create;
mod get;
mod list;
mod update;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::IssueCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `trackr issue`.
pub async fn handle(
    action: IssueCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        IssueCommands::Create(args) => create::run(args, ctx, flags).await,
        IssueCommands::Get { issue } => get::run(&issue, ctx, flags).await,
        IssueCommands::Update(args) => update::run(args, ctx, flags).await,
        IssueCommands::Delete {
            issue,
            expected_version,
        } => {
            let actor = flags.require_actor()?;
            let id = ctx.service.resolve_issue_id(&issue).await?;
            let report = ctx
                .service
                .soft_delete_issue(actor, &id, expected_version)
                .await?;
            output(&report, flags.format)
        }
        IssueCommands::List(args) => list::run(args, ctx, flags).await,
        IssueCommands::Children { issue } => {
            let id = ctx.service.resolve_issue_id(&issue).await?;
            output(&ctx.service.get_child_issues(&id).await?, flags.format)
        }
        IssueCommands::Assign {
            issue,
            user,
            expected_version,
        } => assign::assign(&issue, &user, expected_version, ctx, flags).await,
        IssueCommands::Reassign {
            issue,
            user,
            reason,
            expected_version,
        } => {
            assign::reassign(&issue, &user, reason.as_deref(), expected_version, ctx, flags).await
        }
        IssueCommands::Unassign {
            issue,
            reason,
            expected_version,
        } => assign::unassign(&issue, reason.as_deref(), expected_version, ctx, flags).await,
        IssueCommands::History { issue } => {
            let id = ctx.service.resolve_issue_id(&issue).await?;
            output(&ctx.service.get_issue_history(&id).await?, flags.format)
        }
    }
}
