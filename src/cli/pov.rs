use crate::cli::commands::PovCommand;
use crate::config::MeisterConfig;
use crate::errors::MeisterError;
use tracing::info;

pub async fn handle_pov(command: PovCommand, config: &MeisterConfig) -> Result<(), MeisterError> {
    let db = super::open_database(config)?;
    match command {
        PovCommand::Add { cbn, file } => {
            if db.get_cbn(&cbn)?.is_none() {
                return Err(MeisterError::Config(format!("Unknown challenge binary: {}", cbn)));
            }
            let blob = tokio::fs::read(&file)
                .await
                .map_err(|e| MeisterError::local_io(&file, e))?;
            let exploit = db.insert_exploit(&cbn, &blob)?;
            info!(cbn = %cbn, exploit = %exploit.id, size = blob.len(), "Stored POV");
            println!("{}", exploit.id);
        }
    }
    Ok(())
}
