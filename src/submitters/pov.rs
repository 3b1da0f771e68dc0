use std::sync::Arc;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, error, info, Instrument, Span};
use crate::cgc::ScoringApi;
use crate::db::Database;
use crate::errors::MeisterError;
use crate::models::{ChallengeBinaryNode, Team};

/// Totals for one submission pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionReport {
    /// (team, binary) pairs visited
    pub pairs: usize,
    /// Pairs where an exploit was accepted
    pub submitted: usize,
    /// Individual submission attempts that failed and were skipped
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct PairOutcome {
    submitted: bool,
    failed: usize,
}

/// Submits every unsubmitted exploit of every root binary to every opponent.
///
/// For each (team, binary) pair exploits are tried oldest first until one is
/// accepted; the accepted exploit is recorded as submitted to that team and the
/// rest of the pair is left for a later pass. Remote API failures are logged and
/// skipped, anything else aborts the pass.
pub struct PovSubmitter {
    api: Arc<dyn ScoringApi>,
    db: Database,
    concurrency: usize,
    span: Span,
}

impl PovSubmitter {
    pub fn new(api: Arc<dyn ScoringApi>, db: Database) -> Self {
        Self {
            api,
            db,
            concurrency: 1,
            span: tracing::info_span!("povsubmitter", component = "povsubmitter"),
        }
    }

    /// Allow up to `concurrency` pairs to be worked on at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, round: u64) -> Result<SubmissionReport, MeisterError> {
        self.run_pass(round).instrument(self.span.clone()).await
    }

    async fn run_pass(&self, round: u64) -> Result<SubmissionReport, MeisterError> {
        debug!(round, "Submitting POV");
        let teams = self.db.opponents()?;
        let roots = self.db.roots()?;

        // Team-major order: every binary for the first opponent, then the next
        let pairs: Vec<(Team, ChallengeBinaryNode)> = teams
            .iter()
            .flat_map(|team| roots.iter().map(move |cbn| (team.clone(), cbn.clone())))
            .collect();

        // Each pair is owned by exactly one future, so submit-then-mark for a
        // pair never races; `buffered` keeps results in pair order.
        let outcomes: Vec<PairOutcome> = stream::iter(pairs)
            .map(|(team, cbn)| {
                let span = tracing::debug_span!("pair", team = %team.name, cbn = %cbn.id);
                self.submit_pair(team, cbn, round).instrument(span)
            })
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let report = SubmissionReport {
            pairs: outcomes.len(),
            submitted: outcomes.iter().filter(|o| o.submitted).count(),
            failed: outcomes.iter().map(|o| o.failed).sum(),
        };
        info!(
            round,
            pairs = report.pairs,
            submitted = report.submitted,
            failed = report.failed,
            "Submission pass complete"
        );
        Ok(report)
    }

    async fn submit_pair(
        &self,
        team: Team,
        cbn: ChallengeBinaryNode,
        round: u64,
    ) -> Result<PairOutcome, MeisterError> {
        let mut outcome = PairOutcome::default();

        for exploit in self.db.unsubmitted_exploits(&cbn.id, &team.name)? {
            debug!(cbn = %cbn.name, team = %team.name, exploit = %exploit.id, "Submitting POV");

            match self.api.submit(&cbn.cs_id, &team.name, round, &exploit.blob).await {
                Ok(ack) => {
                    self.db.submitted_to(&exploit.id, &team.name, round)?;
                    info!(
                        cbn = %cbn.name,
                        team = %team.name,
                        exploit = %exploit.id,
                        status = ack.status_code,
                        "POV accepted"
                    );
                    outcome.submitted = true;
                    break;
                }
                Err(e) if e.is_skippable() => {
                    error!(
                        cbn = %cbn.name,
                        team = %team.name,
                        exploit = %exploit.id,
                        error_type = e.classify().error_type,
                        error = %e,
                        "Submission POV error"
                    );
                    outcome.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;
    use crate::cgc::{BinariesResponse, StatusInfo, SubmissionAck};

    /// Scoring API double: rejects blobs listed in `reject` with a 503.
    #[derive(Default)]
    struct ScriptedApi {
        reject: Vec<Vec<u8>>,
        calls: Mutex<Vec<(String, String, u64, Vec<u8>)>>,
    }

    #[async_trait]
    impl ScoringApi for ScriptedApi {
        async fn status(&self) -> Result<StatusInfo, MeisterError> {
            Ok(StatusInfo::default())
        }

        async fn binaries(&self, _round: u64) -> Result<BinariesResponse, MeisterError> {
            Ok(BinariesResponse::default())
        }

        async fn submit(
            &self,
            cs_id: &str,
            team: &str,
            round: u64,
            blob: &[u8],
        ) -> Result<SubmissionAck, MeisterError> {
            self.calls.lock().unwrap().push((cs_id.into(), team.into(), round, blob.to_vec()));
            if self.reject.iter().any(|r| r == blob) {
                return Err(MeisterError::remote_api("POST", "/submit", 503));
            }
            Ok(SubmissionAck { status_code: 200, body: String::new() })
        }
    }

    fn seeded(teams: &[&str]) -> Database {
        let db = Database::in_memory().unwrap();
        db.insert_team("shellphish", true).unwrap();
        for team in teams {
            db.insert_team(team, false).unwrap();
        }
        db.upsert_cbn(&ChallengeBinaryNode::root("cb_t")).unwrap();
        db
    }

    #[tokio::test]
    async fn test_stops_after_first_accepted_exploit() {
        let db = seeded(&["r1"]);
        let p1 = db.insert_exploit("cb_t", b"P1").unwrap();
        let p2 = db.insert_exploit("cb_t", b"P2").unwrap();
        let api = Arc::new(ScriptedApi::default());

        let report = PovSubmitter::new(api.clone(), db.clone()).run(5).await.unwrap();

        assert_eq!(report, SubmissionReport { pairs: 1, submitted: 1, failed: 0 });
        assert!(db.is_submitted_to(&p1.id, "r1").unwrap());
        assert!(!db.is_submitted_to(&p2.id, "r1").unwrap());
        let calls = api.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], ("cb_t".to_string(), "r1".to_string(), 5, b"P1".to_vec()));
    }

    #[tokio::test]
    async fn test_rejected_exploit_falls_through_to_next() {
        let db = seeded(&["r1"]);
        let p1 = db.insert_exploit("cb_t", b"P1").unwrap();
        let p2 = db.insert_exploit("cb_t", b"P2").unwrap();
        let api = Arc::new(ScriptedApi { reject: vec![b"P1".to_vec()], ..Default::default() });

        let report = PovSubmitter::new(api.clone(), db.clone()).run(1).await.unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.submitted, 1);
        assert!(!db.is_submitted_to(&p1.id, "r1").unwrap());
        assert!(db.is_submitted_to(&p2.id, "r1").unwrap());
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_all_rejected_leaves_everything_eligible() {
        let db = seeded(&["r1"]);
        db.insert_exploit("cb_t", b"P1").unwrap();
        let api = Arc::new(ScriptedApi { reject: vec![b"P1".to_vec()], ..Default::default() });

        let report = PovSubmitter::new(api, db.clone()).run(1).await.unwrap();

        assert_eq!(report, SubmissionReport { pairs: 1, submitted: 0, failed: 1 });
        assert_eq!(db.unsubmitted_exploits("cb_t", "r1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unmodeled_error_aborts_pass() {
        struct BrokenApi;

        #[async_trait]
        impl ScoringApi for BrokenApi {
            async fn status(&self) -> Result<StatusInfo, MeisterError> {
                Ok(StatusInfo::default())
            }
            async fn binaries(&self, _round: u64) -> Result<BinariesResponse, MeisterError> {
                Ok(BinariesResponse::default())
            }
            async fn submit(&self, _: &str, _: &str, _: u64, _: &[u8]) -> Result<SubmissionAck, MeisterError> {
                Err(MeisterError::Internal("corrupt exploit record".into()))
            }
        }

        let db = seeded(&["r1"]);
        db.insert_exploit("cb_t", b"P1").unwrap();

        let err = PovSubmitter::new(Arc::new(BrokenApi), db).run(1).await.unwrap_err();
        assert!(matches!(err, MeisterError::Internal(_)));
    }

    #[tokio::test]
    async fn test_no_opponents_is_empty_pass() {
        let db = seeded(&[]);
        db.insert_exploit("cb_t", b"P1").unwrap();
        let api = Arc::new(ScriptedApi::default());

        let report = PovSubmitter::new(api.clone(), db).run(1).await.unwrap();
        assert_eq!(report, SubmissionReport::default());
        assert!(api.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_does_not_resend() {
        let db = seeded(&["r1"]);
        db.insert_exploit("cb_t", b"P1").unwrap();
        let api = Arc::new(ScriptedApi::default());
        let submitter = PovSubmitter::new(api.clone(), db);

        submitter.run(1).await.unwrap();
        let second = submitter.run(2).await.unwrap();

        assert_eq!(second.submitted, 0);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_concurrency_floor_is_one() {
        let db = Database::in_memory().unwrap();
        let submitter = PovSubmitter::new(Arc::new(ScriptedApi::default()), db).with_concurrency(0);
        assert_eq!(submitter.concurrency, 1);
    }
}
