use trackr_core::enums::{IssueStatus, IssueType, Priority, SortField, SortOrder};
use trackr_db::repos::issue::{IssueFilter, IssueSort, Pagination};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::IssueListArgs;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(args: IssueListArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let project = ctx.service.resolve_project(&args.project).await?;

    let filter = IssueFilter {
        status: args
            .status
            .as_deref()
            .map(|raw| parse_enum::<IssueStatus>(raw, "status"))
            .transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(|raw| parse_enum::<Priority>(raw, "priority"))
            .transpose()?,
        issue_type: args
            .issue_type
            .as_deref()
            .map(|raw| parse_enum::<IssueType>(raw, "type"))
            .transpose()?,
        assignee_id: args.assignee,
        labels: args.labels,
        search: args.search,
    };
    let sort = IssueSort {
        field: args
            .sort
            .as_deref()
            .map(|raw| parse_enum::<SortField>(raw, "sort"))
            .transpose()?
            .unwrap_or_default(),
        order: args
            .order
            .as_deref()
            .map(|raw| parse_enum::<SortOrder>(raw, "order"))
            .transpose()?
            .unwrap_or_default(),
    };
    let pagination = Pagination {
        page: args.page,
        limit: flags.limit,
    };

    let page = ctx
        .service
        .list_issues(&project.id, &filter, pagination, sort)
        .await?;
    output(&page, flags.format)
}
