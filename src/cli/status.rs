use crate::cgc::ScoringApi;
use crate::cli::commands::StatusArgs;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;
use tracing::info;

pub async fn handle_status(args: StatusArgs, config: &MeisterConfig) -> Result<(), MeisterError> {
    info!(url = %config.api.url, "Querying scoring service status");
    let client = super::api_client(config)?;
    let status = client.status().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        match status.round {
            Some(round) => println!("Round: {}", round),
            None => println!("Round: unknown"),
        }
        for (key, value) in &status.extra {
            println!("{}: {}", key, value);
        }
    }
    Ok(())
}
