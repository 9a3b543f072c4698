use clap::Parser;
use trackr_core::responses::ErrorResponse;
use trackr_db::error::DatabaseError;

mod cli;
mod commands;
mod context;
mod output;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    let flags = cli.global_flags();

    if let Err(error) = run(cli, &flags).await {
        report(&error, &flags);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli, flags: &cli::GlobalFlags) -> anyhow::Result<()> {
    init_tracing(flags.quiet, flags.verbose)?;
    let _ = dotenvy::dotenv();

    let config = trackr_config::TrackrConfig::load()?;

    if let cli::Commands::Init(args) = &cli.command {
        return commands::init::handle(args, &config, flags).await;
    }

    let ctx = context::AppContext::init(config).await?;
    let result = commands::dispatch::dispatch(cli.command, &ctx, flags).await;
    ctx.shutdown().await;
    result
}

/// Engine errors are printed as a result object; anything else as plain text.
fn report(error: &anyhow::Error, flags: &cli::GlobalFlags) {
    if let Some(db_error) = error.downcast_ref::<DatabaseError>() {
        let response = ErrorResponse::new(db_error.kind(), db_error.to_string());
        if output::output(&response, flags.format).is_ok() {
            return;
        }
    }
    eprintln!("trackr error: {error:#}");
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TRACKR_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
