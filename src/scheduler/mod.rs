//! Periodic driver: one tick ingests the staged binaries, creates the missing
//! analysis jobs and runs a POV submission pass.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument, Span};
use crate::cgc::ScoringApi;
use crate::config::MeisterConfig;
use crate::creators::enqueue_all;
use crate::db::Database;
use crate::errors::MeisterError;
use crate::models::{ChallengeBinaryNode, JobKind};
use crate::submitters::{PovSubmitter, SubmissionReport};

/// What one scheduler tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub round: u64,
    pub new_binaries: usize,
    pub jobs_created: usize,
    pub submissions: SubmissionReport,
}

/// Ask the scoring service for the current round.
pub async fn current_round(api: &dyn ScoringApi) -> Result<u64, MeisterError> {
    api.status()
        .await?
        .round
        .ok_or_else(|| MeisterError::Internal("Status response carries no round".into()))
}

/// Register every staged binary as a root challenge binary node.
/// Returns how many were not known before.
pub async fn ingest_binaries(
    api: &dyn ScoringApi,
    db: &Database,
    round: u64,
) -> Result<usize, MeisterError> {
    let binaries = api.binaries(round).await?.binaries;
    let mut new = 0;
    for binary in &binaries {
        if db.upsert_cbn(&ChallengeBinaryNode::root(&binary.id))? {
            info!(cbn = %binary.id, "New challenge binary");
            new += 1;
        }
    }
    Ok(new)
}

pub struct Scheduler {
    api: Arc<dyn ScoringApi>,
    db: Database,
    kinds: Vec<JobKind>,
    submitter: PovSubmitter,
    interval: Duration,
    span: Span,
}

impl Scheduler {
    pub fn new(api: Arc<dyn ScoringApi>, db: Database, config: &MeisterConfig) -> Self {
        let submitter = PovSubmitter::new(api.clone(), db.clone())
            .with_concurrency(config.submit.concurrency);
        Self {
            api,
            db,
            kinds: config.jobs.kinds.clone(),
            submitter,
            interval: Duration::from_secs(config.scheduler.interval_secs),
            span: tracing::info_span!("scheduler", component = "scheduler"),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub async fn tick(&self) -> Result<TickReport, MeisterError> {
        async {
            let round = current_round(self.api.as_ref()).await?;
            let new_binaries = ingest_binaries(self.api.as_ref(), &self.db, round).await?;

            let mut jobs_created = 0;
            for kind in &self.kinds {
                jobs_created += enqueue_all(&self.db, *kind)?.len();
            }

            let submissions = self.submitter.run(round).await?;
            let report = TickReport { round, new_binaries, jobs_created, submissions };
            info!(
                round,
                new_binaries,
                jobs_created,
                submitted = report.submissions.submitted,
                failed = report.submissions.failed,
                "Tick complete"
            );
            Ok(report)
        }
        .instrument(self.span.clone())
        .await
    }

    /// Tick every interval until `cancel` fires. Remote API failures skip the
    /// tick; any other error stops the loop.
    pub async fn run(&self, cancel: CancellationToken) -> Result<(), MeisterError> {
        info!(interval_secs = self.interval.as_secs(), "Scheduler started");
        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.tick().await {
                Ok(_) => {}
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, "Tick failed, retrying next interval");
                }
                Err(e) => return Err(e),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        info!("Scheduler stopped");
        Ok(())
    }
}
