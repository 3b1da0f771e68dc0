pub mod client;
pub mod digest;
pub mod types;

pub use client::CgcClient;
pub use types::{BinariesResponse, Binary, StatusInfo, SubmissionAck};

use async_trait::async_trait;
use crate::errors::MeisterError;

/// Operations the orchestrator needs from the scoring service.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// Current game status
    async fn status(&self) -> Result<StatusInfo, MeisterError>;

    /// Challenge binaries available for `round`
    async fn binaries(&self, round: u64) -> Result<BinariesResponse, MeisterError>;

    /// Submit a proof of vulnerability for challenge set `cs_id` against `team`
    async fn submit(
        &self,
        cs_id: &str,
        team: &str,
        round: u64,
        blob: &[u8],
    ) -> Result<SubmissionAck, MeisterError>;
}
