use crate::cli::GlobalFlags;
use crate::context::AppContext;
use crate::output::output;

pub async fn run(issue: &str, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let id = ctx.service.resolve_issue_id(issue).await?;
    output(&ctx.service.get_issue(&id).await?, flags.format)
}
