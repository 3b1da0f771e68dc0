use data_encoding::BASE64;
use crate::cgc::ScoringApi;
use crate::cli::commands::BinariesArgs;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;
use crate::scheduler::{current_round, ingest_binaries};

pub async fn handle_binaries(args: BinariesArgs, config: &MeisterConfig) -> Result<(), MeisterError> {
    let client = super::api_client(config)?;
    let round = match args.round {
        Some(round) => round,
        None => current_round(client.as_ref()).await?,
    };

    if args.ingest {
        let db = super::open_database(config)?;
        let new = ingest_binaries(client.as_ref(), &db, round).await?;
        println!("Ingested {} new challenge binaries for round {}", new, round);
        return Ok(());
    }

    let response = client.binaries(round).await?;
    if response.binaries.is_empty() {
        println!("No binaries staged under {}", client.binaries_path().display());
    }
    for binary in &response.binaries {
        let size = BASE64
            .decode(binary.data.as_bytes())
            .map(|bytes| bytes.len())
            .map_err(|e| MeisterError::Internal(format!("Bad encoding for {}: {}", binary.id, e)))?;
        println!("{}\t{} bytes", binary.id, size);
    }
    Ok(())
}
