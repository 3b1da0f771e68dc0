use std::path::Path;
use crate::errors::MeisterError;
use super::types::MeisterConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::{debug, warn};

/// Load configuration: defaults, then the optional YAML file, then the
/// `CGC_*` / `MEISTER_*` environment variables.
pub async fn load_config(path: Option<&Path>) -> Result<MeisterConfig, MeisterError> {
    let mut config = match path {
        Some(path) => parse_config(path).await?,
        None => {
            debug!("No config file given, using defaults");
            MeisterConfig::default()
        }
    };
    config.apply_env(|key| std::env::var(key).ok());
    validate_config(&config)?;
    Ok(config)
}

pub async fn parse_config(path: &Path) -> Result<MeisterConfig, MeisterError> {
    if !path.exists() {
        return Err(MeisterError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(MeisterError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;

    // JSON Schema validation
    validate_schema(&yaml)?;

    let mut config: MeisterConfig = serde_yaml::from_value(yaml)?;
    config.api.resolve_env_refs(|key| std::env::var(key).ok())?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), MeisterError> {
    // Convert YAML value to JSON for schema validation
    let json_value = serde_json::to_value(yaml)
        .map_err(|e| MeisterError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| MeisterError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only: typed parsing below is the hard check
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Reject values that would make the orchestrator unusable.
pub fn validate_config(config: &MeisterConfig) -> Result<(), MeisterError> {
    if config.submit.concurrency == 0 {
        return Err(MeisterError::Config("submit.concurrency must be at least 1".into()));
    }
    if config.api.timeout_secs == 0 {
        return Err(MeisterError::Config("api.timeout_secs must be at least 1".into()));
    }
    if config.scheduler.interval_secs == 0 {
        return Err(MeisterError::Config("scheduler.interval_secs must be at least 1".into()));
    }
    if config.api.user.is_empty() || config.api.password.is_empty() {
        warn!("API credentials are empty; digest authentication will fail");
    }
    Ok(())
}
