use chrono::Utc;
use crate::errors::MeisterError;
use crate::models::ChallengeBinaryNode;
use super::Database;

fn cbn_from_row(row: &rusqlite::Row) -> rusqlite::Result<ChallengeBinaryNode> {
    Ok(ChallengeBinaryNode {
        id: row.get(0)?,
        cs_id: row.get(1)?,
        name: row.get(2)?,
        parent_id: row.get(3)?,
    })
}

impl Database {
    /// Insert a challenge binary node unless one with the same id exists.
    /// Returns `true` when the node is new.
    pub fn upsert_cbn(&self, cbn: &ChallengeBinaryNode) -> Result<bool, MeisterError> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "INSERT OR IGNORE INTO challenge_binary_nodes (id, cs_id, name, parent_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![cbn.id, cbn.cs_id, cbn.name, cbn.parent_id, Utc::now().to_rfc3339()],
        ).map_err(|e| MeisterError::Database(format!("Failed to insert challenge binary: {}", e)))?;
        Ok(affected > 0)
    }

    pub fn get_cbn(&self, id: &str) -> Result<Option<ChallengeBinaryNode>, MeisterError> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT id, cs_id, name, parent_id FROM challenge_binary_nodes WHERE id = ?1",
            rusqlite::params![id],
            cbn_from_row,
        );

        match result {
            Ok(cbn) => Ok(Some(cbn)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(MeisterError::Database(format!("Query error: {}", e))),
        }
    }

    /// Root nodes only: the binaries that can be submission targets.
    pub fn roots(&self) -> Result<Vec<ChallengeBinaryNode>, MeisterError> {
        self.query_cbns(
            "SELECT id, cs_id, name, parent_id FROM challenge_binary_nodes WHERE parent_id IS NULL ORDER BY id"
        )
    }

    pub fn all_cbns(&self) -> Result<Vec<ChallengeBinaryNode>, MeisterError> {
        self.query_cbns("SELECT id, cs_id, name, parent_id FROM challenge_binary_nodes ORDER BY id")
    }

    fn query_cbns(&self, sql: &str) -> Result<Vec<ChallengeBinaryNode>, MeisterError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)
            .map_err(|e| MeisterError::Database(format!("Query failed: {}", e)))?;
        let rows = stmt.query_map([], cbn_from_row)
            .map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;

        let mut cbns = Vec::new();
        for row in rows {
            cbns.push(row.map_err(|e| MeisterError::Database(format!("Row error: {}", e)))?);
        }
        Ok(cbns)
    }
}
