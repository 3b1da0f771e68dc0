use crate::errors::MeisterError;
use crate::models::Team;
use super::Database;

impl Database {
    /// Register a team. Re-adding an existing name leaves the roster unchanged.
    pub fn insert_team(&self, name: &str, is_self: bool) -> Result<Team, MeisterError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO teams (name, is_self) VALUES (?1, ?2)",
            rusqlite::params![name, is_self],
        ).map_err(|e| MeisterError::Database(format!("Failed to insert team: {}", e)))?;

        conn.query_row(
            "SELECT id, name, is_self FROM teams WHERE name = ?1",
            rusqlite::params![name],
            |row: &rusqlite::Row| {
                Ok(Team {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    is_self: row.get(2)?,
                })
            },
        ).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))
    }

    /// Every team except our own, in roster (registration) order.
    pub fn opponents(&self) -> Result<Vec<Team>, MeisterError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, is_self FROM teams WHERE is_self = 0 ORDER BY id"
        ).map_err(|e| MeisterError::Database(format!("Query failed: {}", e)))?;

        let rows = stmt.query_map([], |row: &rusqlite::Row| {
            Ok(Team {
                id: row.get(0)?,
                name: row.get(1)?,
                is_self: row.get(2)?,
            })
        }).map_err(|e| MeisterError::Database(format!("Query error: {}", e)))?;

        let mut teams = Vec::new();
        for row in rows {
            teams.push(row.map_err(|e| MeisterError::Database(format!("Row error: {}", e)))?);
        }
        Ok(teams)
    }
}
