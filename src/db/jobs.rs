use chrono::Utc;
use crate::creators::JobQueue;
use crate::errors::MeisterError;
use crate::models::{JobDescriptor, JobKind, JobRecord, JobStatus, ResourceLimits};
use super::Database;

impl Database {
    /// Persist a job descriptor in the `queued` state.
    pub fn insert_job(&self, job: &JobDescriptor) -> Result<(), MeisterError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO jobs (id, kind, cbn_id, limit_cpus, limit_memory, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, 'queued', ?6)",
            rusqlite::params![
                job.id,
                job.kind.as_str(),
                job.cbn_id,
                job.limits.cpus,
                job.limits.memory,
                Utc::now().to_rfc3339(),
            ],
        ).map_err(|e| MeisterError::Database(format!("Failed to insert job: {}", e)))?;
        Ok(())
    }

    pub fn update_job_status(&self, id: &str, status: JobStatus) -> Result<bool, MeisterError> {
        let conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let affected = match status {
            JobStatus::Running => conn.execute(
                "UPDATE jobs SET status = ?2, started_at = ?3 WHERE id = ?1",
                rusqlite::params![id, status.as_str(), now],
            ),
            JobStatus::Done | JobStatus::Failed => conn.execute(
                "UPDATE jobs SET status = ?2, completed_at = ?3 WHERE id = ?1",
                rusqlite::params![id, status.as_str(), now],
            ),
            JobStatus::Queued => conn.execute(
                "UPDATE jobs SET status = ?2 WHERE id = ?1",
                rusqlite::params![id, status.as_str()],
            ),
        }.map_err(|e| MeisterError::Database(format!("Update failed: {}", e)))?;
        Ok(affected > 0)
    }

    pub fn list_jobs(&self, kind: Option<JobKind>) -> Result<Vec<JobRecord>, MeisterError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, cbn_id, limit_cpus, limit_memory, status, created_at FROM jobs
             WHERE ?1 IS NULL OR kind = ?1
             ORDER BY created_at, rowid"
        ).map_err(|e| MeisterError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![kind.map(|k| k.as_str())], |row: &rusqlite::Row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        }).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;

        let mut jobs = Vec::new();
        for row in rows {
            let (id, kind, cbn_id, cpus, memory, status, created_at) =
                row.map_err(|e| MeisterError::Database(format!("Row error: {}", e)))?;
            jobs.push(JobRecord {
                descriptor: JobDescriptor {
                    id,
                    kind: kind.parse()?,
                    cbn_id,
                    limits: ResourceLimits { cpus, memory },
                },
                status: status.parse()?,
                created_at,
            });
        }
        Ok(jobs)
    }
}

impl JobQueue for Database {
    fn already_queued(&self, job: &JobDescriptor) -> Result<bool, MeisterError> {
        let blocking: Vec<String> = JobStatus::ALL
            .iter()
            .filter(|status| status.blocks_recreation())
            .map(|status| format!("'{}'", status.as_str()))
            .collect();
        let sql = format!(
            "SELECT COUNT(*) FROM jobs WHERE kind = ?1 AND cbn_id = ?2 AND status IN ({})",
            blocking.join(", ")
        );

        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            &sql,
            rusqlite::params![job.kind.as_str(), job.cbn_id],
            |row: &rusqlite::Row| row.get(0),
        ).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }
}
