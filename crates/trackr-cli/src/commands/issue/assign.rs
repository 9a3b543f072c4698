use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn assign(
    issue: &str,
    user: &str,
    expected_version: Option<i64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = flags.require_actor()?;
    let id = ctx.service.resolve_issue_id(issue).await?;
    let result = ctx
        .service
        .assign_issue(actor, &id, user, expected_version)
        .await?;
    output(&result, flags.format)
}

pub async fn reassign(
    issue: &str,
    user: &str,
    reason: Option<&str>,
    expected_version: Option<i64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = flags.require_actor()?;
    let id = ctx.service.resolve_issue_id(issue).await?;
    let result = ctx
        .service
        .reassign_issue(actor, &id, user, reason, expected_version)
        .await?;
    output(&result, flags.format)
}

pub async fn unassign(
    issue: &str,
    reason: Option<&str>,
    expected_version: Option<i64>,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let actor = flags.require_actor()?;
    let id = ctx.service.resolve_issue_id(issue).await?;
    let result = ctx
        .service
        .unassign_issue(actor, &id, reason, expected_version)
        .await?;
    output(&result, flags.format)
}
