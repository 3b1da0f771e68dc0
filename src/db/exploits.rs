use chrono::Utc;
use crate::errors::MeisterError;
use crate::models::Exploit;
use super::Database;

impl Database {
    pub fn insert_exploit(&self, cbn_id: &str, blob: &[u8]) -> Result<Exploit, MeisterError> {
        let exploit = Exploit {
            id: uuid::Uuid::new_v4().to_string(),
            cbn_id: cbn_id.to_string(),
            blob: blob.to_vec(),
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO exploits (id, cbn_id, blob, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![exploit.id, exploit.cbn_id, exploit.blob, exploit.created_at],
        ).map_err(|e| MeisterError::Database(format!("Failed to insert exploit: {}", e)))?;
        Ok(exploit)
    }

    /// Exploits for `cbn_id` that have not yet been accepted by `team`, oldest first.
    pub fn unsubmitted_exploits(&self, cbn_id: &str, team: &str) -> Result<Vec<Exploit>, MeisterError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT e.id, e.cbn_id, e.blob, e.created_at FROM exploits e
             WHERE e.cbn_id = ?1
               AND NOT EXISTS (
                   SELECT 1 FROM exploit_submissions s
                   WHERE s.exploit_id = e.id AND s.team_name = ?2
               )
             ORDER BY e.created_at, e.rowid"
        ).map_err(|e| MeisterError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map(rusqlite::params![cbn_id, team], |row: &rusqlite::Row| {
            Ok(Exploit {
                id: row.get(0)?,
                cbn_id: row.get(1)?,
                blob: row.get(2)?,
                created_at: row.get(3)?,
            })
        }).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;

        let mut exploits = Vec::new();
        for row in rows {
            exploits.push(row.map_err(|e| MeisterError::Database(format!("Row error: {}", e)))?);
        }
        Ok(exploits)
    }

    /// Record that `team` accepted the exploit. Returns `false` if it was
    /// already recorded, so a second marker never double counts.
    pub fn submitted_to(&self, exploit_id: &str, team: &str, round: u64) -> Result<bool, MeisterError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "INSERT OR IGNORE INTO exploit_submissions (exploit_id, team_name, round, submitted_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![exploit_id, team, round as i64, Utc::now().to_rfc3339()],
        ).map_err(|e| MeisterError::Database(format!("Failed to record submission: {}", e)))?;
        Ok(affected > 0)
    }

    pub fn is_submitted_to(&self, exploit_id: &str, team: &str) -> Result<bool, MeisterError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exploit_submissions WHERE exploit_id = ?1 AND team_name = ?2",
            rusqlite::params![exploit_id, team],
            |row: &rusqlite::Row| row.get(0),
        ).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;
        Ok(count > 0)
    }

    /// Number of exploits for `cbn_id` marked as submitted to `team`.
    pub fn submission_count(&self, cbn_id: &str, team: &str) -> Result<usize, MeisterError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM exploit_submissions s
             JOIN exploits e ON e.id = s.exploit_id
             WHERE e.cbn_id = ?1 AND s.team_name = ?2",
            rusqlite::params![cbn_id, team],
            |row: &rusqlite::Row| row.get(0),
        ).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;
        Ok(count as usize)
    }
}
