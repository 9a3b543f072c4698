use anyhow::Context;
use serde::Serialize;
use trackr_config::TrackrConfig;
use trackr_db::TrackrDb;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::ensure_parent_dir;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    database: String,
    initialized: bool,
}

/// Handle `trackr init`.
pub async fn handle(args: &InitArgs, config: &TrackrConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    ensure_parent_dir(&path)?;

    TrackrDb::open_local(&path)
        .await
        .with_context(|| format!("failed to initialize database at {path}"))?;
    tracing::info!(database = %path, "database initialized");

    output(
        &InitResponse {
            database: path,
            initialized: true,
        },
        flags.format,
    )
}
