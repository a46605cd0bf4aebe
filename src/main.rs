//! regpipe - regression pipeline entry point

use clap::Parser;
use regression_pipeline::cli::{cmd_evaluate, cmd_preprocess, cmd_run, cmd_status, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "regression_pipeline=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preprocess { params } => cmd_preprocess(&params)?,
        Commands::Train { params } => cmd_train(&params)?,
        Commands::Evaluate { params } => cmd_evaluate(&params)?,
        Commands::Run { params } => cmd_run(&params)?,
        Commands::Status => cmd_status()?,
    }

    Ok(())
}
