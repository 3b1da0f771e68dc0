use crate::cli::commands::SubmitArgs;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;
use crate::scheduler::current_round;
use crate::submitters::PovSubmitter;

pub async fn handle_submit(args: SubmitArgs, config: &MeisterConfig) -> Result<(), MeisterError> {
    let client = super::api_client(config)?;
    let db = super::open_database(config)?;
    let round = match args.round {
        Some(round) => round,
        None => current_round(client.as_ref()).await?,
    };

    let concurrency = args.concurrency.unwrap_or(config.submit.concurrency);
    let report = PovSubmitter::new(client, db)
        .with_concurrency(concurrency)
        .run(round)
        .await?;

    println!(
        "Round {}: {} pairs, {} submitted, {} failed attempts",
        round, report.pairs, report.submitted, report.failed
    );
    Ok(())
}
