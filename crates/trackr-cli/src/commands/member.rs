use trackr_core::enums::MemberRole;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::MemberCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `trackr member`.
pub async fn handle(
    action: &MemberCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        MemberCommands::Add { project, user, role } => {
            let role = parse_enum::<MemberRole>(role, "role")?;
            let project = svc.resolve_project(project).await?;
            output(&svc.add_member(&project.id, user, role).await?, flags.format)
        }
        MemberCommands::List { project } => {
            let project = svc.resolve_project(project).await?;
            output(&svc.list_members(&project.id).await?, flags.format)
        }
        MemberCommands::Deactivate { project, user } => {
            let project = svc.resolve_project(project).await?;
            output(
                &svc.set_member_active(&project.id, user, false).await?,
                flags.format,
            )
        }
    }
}
