use trackr_core::enums::{IssueStatus, IssueType, Priority};
use trackr_db::repos::issue::NewIssue;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::IssueCreateArgs;
use crate::commands::shared::parse::{parse_due_date, parse_enum};
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: IssueCreateArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let actor = flags.require_actor()?;
    let project = ctx.service.resolve_project(&args.project).await?;

    let parent_id = match args.parent.as_deref() {
        Some(parent) => Some(ctx.service.resolve_issue_id(parent).await?),
        None => None,
    };
    let new = NewIssue {
        title: args.title,
        description: args.description,
        issue_type: args
            .issue_type
            .as_deref()
            .map(|raw| parse_enum::<IssueType>(raw, "type"))
            .transpose()?
            .unwrap_or_default(),
        priority: args
            .priority
            .as_deref()
            .map(|raw| parse_enum::<Priority>(raw, "priority"))
            .transpose()?
            .unwrap_or_default(),
        status: args
            .status
            .as_deref()
            .map(|raw| parse_enum::<IssueStatus>(raw, "status"))
            .transpose()?
            .unwrap_or_default(),
        estimate: args.estimate,
        due_date: args.due.as_deref().map(parse_due_date).transpose()?,
        labels: args.labels,
        parent_id,
    };

    let created = ctx.service.create_issue(actor, &project.id, new).await?;
    output(&created, flags.format)
}
