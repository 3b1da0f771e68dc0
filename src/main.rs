use std::path::PathBuf;

use clap::Parser;
use meister::{cli, config, errors};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "warn"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(!cli.no_color)
        .init();

    debug!(
        rev = env!("MEISTER_BUILD_REV"),
        built_at = env!("MEISTER_BUILT_AT"),
        "meister starting"
    );

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let exit_code = match &e {
            errors::MeisterError::Config(_) => 2,
            errors::MeisterError::RemoteApi { .. }
            | errors::MeisterError::RemoteApiTimeout { .. }
            | errors::MeisterError::Network(_) => 3,
            errors::MeisterError::LocalIo { .. } => 4,
            _ => 1,
        };
        std::process::exit(exit_code);
    }
}

async fn run(cli: cli::Cli) -> Result<(), errors::MeisterError> {
    let config_path = cli.config.as_ref().map(PathBuf::from);
    let mut config = config::load_config(config_path.as_deref()).await?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    match cli.command {
        cli::Commands::Status(args) => cli::status::handle_status(args, &config).await,
        cli::Commands::Binaries(args) => cli::binaries::handle_binaries(args, &config).await,
        cli::Commands::Jobs(args) => cli::jobs::handle_jobs(args, &config).await,
        cli::Commands::Submit(args) => cli::submit::handle_submit(args, &config).await,
        cli::Commands::Team(command) => cli::team::handle_team(command, &config).await,
        cli::Commands::Pov(command) => cli::pov::handle_pov(command, &config).await,
        cli::Commands::Run(args) => cli::run::handle_run(args, &config).await,
    }
}
