use serde::{Deserialize, Serialize};
use crate::errors::MeisterError;
use super::target::ChallengeBinaryNode;

/// Resources an analysis job is allowed to use. Memory is in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    pub cpus: u32,
    pub memory: u32,
}

/// Analysis job families the creator knows how to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Coverage-guided fuzzing
    Afl,
    /// Concolic execution assisting a stuck fuzzer
    Driller,
    /// Crash triage and exploit generation
    Rex,
}

impl JobKind {
    pub const ALL: [JobKind; 3] = [JobKind::Afl, JobKind::Driller, JobKind::Rex];

    pub fn constraints(&self) -> ResourceLimits {
        match self {
            JobKind::Afl => ResourceLimits { cpus: 8, memory: 1 },
            JobKind::Driller => ResourceLimits { cpus: 1, memory: 8 },
            JobKind::Rex => ResourceLimits { cpus: 1, memory: 4 },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Afl => "afl",
            JobKind::Driller => "driller",
            JobKind::Rex => "rex",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for JobKind {
    type Err = MeisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "afl" => Ok(JobKind::Afl),
            "driller" => Ok(JobKind::Driller),
            "rex" => Ok(JobKind::Rex),
            other => Err(MeisterError::Config(format!("Unknown job kind: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Queued,
        JobStatus::Running,
        JobStatus::Done,
        JobStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Statuses that keep the creator from requesting the same work again.
    pub fn blocks_recreation(&self) -> bool {
        !matches!(self, JobStatus::Failed)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = MeisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "done" => Ok(JobStatus::Done),
            "failed" => Ok(JobStatus::Failed),
            other => Err(MeisterError::Database(format!("Unknown job status: {}", other))),
        }
    }
}

/// A request for one analysis job against one challenge binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub id: String,
    pub kind: JobKind,
    pub cbn_id: String,
    pub limits: ResourceLimits,
}

impl JobDescriptor {
    pub fn new(kind: JobKind, cbn: &ChallengeBinaryNode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            cbn_id: cbn.id.clone(),
            limits: kind.constraints(),
        }
    }
}

/// A persisted job together with its scheduling state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(flatten)]
    pub descriptor: JobDescriptor,
    pub status: JobStatus,
    pub created_at: String,
}
