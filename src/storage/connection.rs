//! Database connection management

use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::schema;
use crate::error::{Result, VaultError};

/// Database connection wrapper around the vault's SQLite file
pub struct Database {
    /// Path to the database file
    path: PathBuf,
    /// SQLite connection
    conn: Option<Connection>,
}

impl Database {
    /// Open an existing vault database
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VaultError::DatabaseError(format!(
                "no vault database at {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Create a new vault database with all tables
    pub fn create(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        for sql in schema::CREATE_ALL_TABLES {
            conn.execute(sql, [])?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            conn: Some(conn),
        })
    }

    /// Get a reference to the connection
    pub fn connection(&self) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or_else(|| VaultError::DatabaseError("Database not open".to_string()))
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the database connection
    pub fn close(&mut self) {
        self.conn = None;
    }

    /// Check if database is open
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Begin a transaction
    pub fn begin_transaction(&mut self) -> Result<()> {
        self.connection()?.execute("BEGIN TRANSACTION", [])?;
        Ok(())
    }

    /// Commit a transaction
    pub fn commit_transaction(&mut self) -> Result<()> {
        self.connection()?.execute("COMMIT", [])?;
        Ok(())
    }

    /// Rollback a transaction
    pub fn rollback_transaction(&mut self) -> Result<()> {
        self.connection()?.execute("ROLLBACK", [])?;
        Ok(())
    }

    /// Force a WAL checkpoint to write all data to the main database file.
    ///
    /// Uses TRUNCATE mode which checkpoints all frames and truncates the
    /// WAL file. Called after every write so a completed operation is
    /// durable in the main file.
    pub fn checkpoint(&self) -> Result<()> {
        self.connection()?
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
        Ok(())
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        self.close();
    }
}
