//! Analysis job creation.
//!
//! A [`JobCreator`] walks a set of candidate challenge binaries and yields a
//! [`JobDescriptor`] for every binary that has no equivalent job in flight.
//! It never writes anything itself; [`enqueue_all`] is the step that hands the
//! descriptors to the queue.

use tracing::{debug, info, Span};
use crate::db::Database;
use crate::errors::MeisterError;
use crate::models::{ChallengeBinaryNode, JobDescriptor, JobKind};

/// Idempotency predicate provided by the job queue.
pub trait JobQueue {
    /// Whether an equivalent job (same kind, same target) is already queued,
    /// running or finished.
    fn already_queued(&self, job: &JobDescriptor) -> Result<bool, MeisterError>;
}

pub struct JobCreator {
    kind: JobKind,
    span: Span,
}

impl JobCreator {
    pub fn new(kind: JobKind) -> Self {
        Self {
            kind,
            span: tracing::info_span!("creator", component = "creator", kind = %kind),
        }
    }

    /// Lazily yield jobs for the targets that still need one.
    ///
    /// One pass over `targets`; safe to call every scheduling tick.
    pub fn jobs<'a, I, Q>(
        &'a self,
        targets: I,
        queue: &'a Q,
    ) -> impl Iterator<Item = Result<JobDescriptor, MeisterError>> + 'a
    where
        I: IntoIterator<Item = ChallengeBinaryNode>,
        I::IntoIter: 'a,
        Q: JobQueue + ?Sized,
    {
        targets.into_iter().filter_map(move |cbn| {
            let _enter = self.span.enter();
            let job = JobDescriptor::new(self.kind, &cbn);
            match queue.already_queued(&job) {
                Ok(true) => None,
                Ok(false) => {
                    debug!(cbn = %cbn.id, "Yielding job");
                    Some(Ok(job))
                }
                Err(e) => Some(Err(e)),
            }
        })
    }
}

/// Create jobs of `kind` for every known challenge binary and persist them as
/// queued. Returns the descriptors that were enqueued.
pub fn enqueue_all(db: &Database, kind: JobKind) -> Result<Vec<JobDescriptor>, MeisterError> {
    let creator = JobCreator::new(kind);
    let targets = db.all_cbns()?;

    let mut created = Vec::new();
    for job in creator.jobs(targets, db) {
        let job = job?;
        db.insert_job(&job)?;
        created.push(job);
    }

    info!(kind = %kind, count = created.len(), "Enqueued jobs");
    Ok(created)
}
