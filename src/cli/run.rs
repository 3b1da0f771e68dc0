use std::time::Duration;
use tokio_util::sync::CancellationToken;
use crate::cli::commands::RunArgs;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;
use crate::scheduler::Scheduler;
use tracing::info;

pub async fn handle_run(args: RunArgs, config: &MeisterConfig) -> Result<(), MeisterError> {
    let client = super::api_client(config)?;
    let db = super::open_database(config)?;

    let mut scheduler = Scheduler::new(client, db, config);
    if let Some(secs) = args.interval {
        scheduler = scheduler.with_interval(Duration::from_secs(secs.max(1)));
    }

    let cancel = CancellationToken::new();
    let stopper = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, finishing current tick");
            stopper.cancel();
        }
    });

    scheduler.run(cancel).await
}
