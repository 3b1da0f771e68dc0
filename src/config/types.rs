use serde::{Deserialize, Serialize};
use tracing::debug;
use crate::errors::MeisterError;
use crate::models::JobKind;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MeisterConfig {
    pub api: ApiConfig,
    pub binaries_path: String,
    pub database_path: String,
    pub submit: SubmitConfig,
    pub scheduler: SchedulerConfig,
    pub jobs: JobsConfig,
}

impl Default for MeisterConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            binaries_path: "/tmp/".to_string(),
            database_path: "./meister.db".to_string(),
            submit: SubmitConfig::default(),
            scheduler: SchedulerConfig::default(),
            jobs: JobsConfig::default(),
        }
    }
}

/// Connection settings for the scoring service.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub user: String,
    pub password: String,
    /// Per-request timeout; a request exceeding it is a `RemoteApiTimeout`.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost/".to_string(),
            user: "meister".to_string(),
            password: "meister".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    /// Replace `$NAME` credentials with the value of that environment variable.
    /// An unset variable is a configuration error.
    pub fn resolve_env_refs<F>(&mut self, lookup: F) -> Result<(), MeisterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (field, value) in [("api.user", &mut self.user), ("api.password", &mut self.password)] {
            let Some(var) = value.strip_prefix('$') else {
                continue;
            };
            let resolved = lookup(var).ok_or_else(|| {
                MeisterError::Config(format!("{} references unset environment variable {}", field, var))
            })?;
            debug!(field, var, "Credential taken from environment");
            *value = resolved;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubmitConfig {
    /// Maximum (team, binary) pairs with a submission in flight.
    pub concurrency: usize,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
    pub kinds: Vec<JobKind>,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self { kinds: vec![JobKind::Afl] }
    }
}

impl MeisterConfig {
    /// Override fields from environment variables, looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CGC_API_URL") {
            self.api.url = url;
        }
        if let Some(user) = lookup("CGC_API_USER") {
            self.api.user = user;
        }
        if let Some(password) = lookup("CGC_API_PASS") {
            self.api.password = password;
        }
        if let Some(path) = lookup("CGC_CB_PATH") {
            self.binaries_path = path;
        }
        if let Some(path) = lookup("MEISTER_DB") {
            self.database_path = path;
        }
    }
}
