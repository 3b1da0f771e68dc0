pub mod commands;
pub mod status;
pub mod binaries;
pub mod jobs;
pub mod submit;
pub mod team;
pub mod pov;
pub mod run;

pub use commands::{Cli, Commands};

use std::sync::Arc;
use crate::cgc::CgcClient;
use crate::config::MeisterConfig;
use crate::db::Database;
use crate::errors::MeisterError;

/// Scoring API client from the resolved configuration.
pub(crate) fn api_client(config: &MeisterConfig) -> Result<Arc<CgcClient>, MeisterError> {
    Ok(Arc::new(CgcClient::new(&config.api, &config.binaries_path)?))
}

pub(crate) fn open_database(config: &MeisterConfig) -> Result<Database, MeisterError> {
    Database::new(&config.database_path)
}
