use trackr_core::enums::ProjectStatus;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `trackr project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ProjectCommands::Create { key, name } => {
            output(&svc.create_project(key, name).await?, flags.format)
        }
        ProjectCommands::Get { project } => {
            output(&svc.resolve_project(project).await?, flags.format)
        }
        ProjectCommands::List => output(&svc.list_projects().await?, flags.format),
        ProjectCommands::Status { project, status } => {
            let status = parse_enum::<ProjectStatus>(status, "status")?;
            let project = svc.resolve_project(project).await?;
            output(&svc.set_project_status(&project.id, status).await?, flags.format)
        }
    }
}
