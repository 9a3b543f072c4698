use trackr_core::enums::{IssueStatus, Priority};
use trackr_db::updates::issue::IssueUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::IssueUpdateArgs;
use crate::commands::shared::parse::{parse_due_date, parse_enum};
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: IssueUpdateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = flags.require_actor()?;

    let mut builder = IssueUpdateBuilder::new();
    if let Some(title) = args.title {
        builder = builder.title(title);
    }
    if let Some(description) = args.description {
        builder = builder.description(description);
    }
    if let Some(status) = args.status.as_deref() {
        builder = builder.status(parse_enum::<IssueStatus>(status, "status")?);
    }
    if let Some(priority) = args.priority.as_deref() {
        builder = builder.priority(parse_enum::<Priority>(priority, "priority")?);
    }
    if let Some(due) = args.due.as_deref() {
        builder = builder.due_date(Some(parse_due_date(due)?));
    } else if args.clear_due {
        builder = builder.due_date(None);
    }

    let update = builder.build();
    let id = ctx.service.resolve_issue_id(&args.issue).await?;
    let updated = ctx
        .service
        .update_issue(actor, &id, update, args.expected_version)
        .await?;
    output(&updated, flags.format)
}
