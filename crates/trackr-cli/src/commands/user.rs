use crate::cli::GlobalFlags;
use crate::cli::subcommands::UserCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `trackr user`.
pub async fn handle(action: &UserCommands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match action {
        UserCommands::Add { name, email } => output(
            &ctx.service.create_user(name, email.as_deref()).await?,
            flags.format,
        ),
        UserCommands::Get { id } => output(&ctx.service.get_user(id).await?, flags.format),
    }
}
