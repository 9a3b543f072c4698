use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use trackr_config::TrackrConfig;
use trackr_db::service::TrackrService;
use trackr_notify::{Dispatcher, LogTransport};

/// Shared resources initialized once per invocation.
pub struct AppContext {
    pub service: TrackrService,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppContext {
    pub async fn init(config: TrackrConfig) -> anyhow::Result<Self> {
        ensure_parent_dir(&config.database.path)?;

        let dispatcher = Arc::new(Dispatcher::start(&config.notify, Arc::new(LogTransport)));
        let service = TrackrService::new_local(&config.database.path, dispatcher.clone())
            .await
            .with_context(|| format!("failed to open database at {}", config.database.path))?
            .with_limits(config.general);

        Ok(Self {
            service,
            dispatcher,
        })
    }

    /// Let queued notifications finish before the process exits.
    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}

pub fn ensure_parent_dir(db_path: &str) -> anyhow::Result<()> {
    if db_path == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}
