use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use crate::errors::MeisterError;

pub struct Database {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(path: &str) -> Result<Self, MeisterError> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)
            .map_err(|e| MeisterError::Database(format!("Failed to open database: {}", e)))?;

        // WAL so the CLI can read while the scheduler writes
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| MeisterError::Database(format!("Failed to set pragmas: {}", e)))?;

        let db = Self { conn: Arc::new(Mutex::new(conn)) };
        db.initialize()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self, MeisterError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| MeisterError::Database(format!("Failed to open in-memory db: {}", e)))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| MeisterError::Database(format!("Failed to set pragmas: {}", e)))?;
        let db = Self { conn: Arc::new(Mutex::new(conn)) };
        db.initialize()?;
        Ok(db)
    }

    fn initialize(&self) -> Result<(), MeisterError> {
        let conn = self.lock()?;
        conn.execute_batch(super::schema::CREATE_TABLES)
            .map_err(|e| MeisterError::Database(format!("Failed to create tables: {}", e)))?;
        Ok(())
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, MeisterError> {
        self.conn
            .lock()
            .map_err(|_| MeisterError::Database("Connection mutex poisoned".into()))
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { conn: self.conn.clone() }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}
