//! SQL query operations for vault access
//!
//! This module provides low-level query functions over an open connection.
//! For vault-level operations, use the Vault API; mutating callers are
//! responsible for checkpointing (or running inside a transaction).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::models::{RecordMetadata, SearchFilter};
use crate::constraints::ConstraintSet;
use crate::error::{Result, VaultError};

/// Timestamp format used in the database
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a DateTime for database storage
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp from the database
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    chrono::NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .map(|ndt| DateTime::from_naive_utc_and_offset(ndt, Utc))
}

/// Get current timestamp formatted for the database
pub fn now_timestamp() -> String {
    format_timestamp(&Utc::now())
}

// ============================================================================
// Properties queries
// ============================================================================

/// Insert the properties row of a freshly created vault
pub fn set_properties(conn: &Connection, database_id: &str, version: &str) -> Result<()> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO vault_properties (database_id, version, create_timestamp, update_timestamp)
         VALUES (?, ?, ?, ?)",
        params![database_id, version, now, now],
    )?;
    Ok(())
}

/// Get the store schema version, if the properties row exists
pub fn get_store_version(conn: &Connection) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT version FROM vault_properties LIMIT 1",
        [],
        |row| row.get(0),
    );
    Ok(result.ok())
}

/// Get the vault's database id, if the properties row exists
pub fn get_database_id(conn: &Connection) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT database_id FROM vault_properties LIMIT 1",
        [],
        |row| row.get(0),
    );
    Ok(result.ok())
}

// ============================================================================
// Record queries
// ============================================================================

/// Raw record row including the encrypted blob
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// Record id as stored (UUID string)
    pub record_id: String,
    /// Display label
    pub label: String,
    /// Free-form category
    pub category: Option<String>,
    /// Associated website
    pub website: Option<String>,
    /// Account username
    pub username: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Encrypted blob (nonce, ciphertext, tag)
    pub ciphertext: Vec<u8>,
    /// Creation timestamp
    pub create_timestamp: String,
    /// Last modification timestamp
    pub update_timestamp: String,
}

/// Raw record metadata row. The ciphertext column is never read.
#[derive(Debug, Clone)]
pub struct RawRecordMeta {
    /// Record id as stored (UUID string)
    pub record_id: String,
    /// Display label
    pub label: String,
    /// Free-form category
    pub category: Option<String>,
    /// Associated website
    pub website: Option<String>,
    /// Account username
    pub username: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub create_timestamp: String,
    /// Last modification timestamp
    pub update_timestamp: String,
}

/// Convert a raw metadata row into the model type
pub fn metadata_from_raw(raw: &RawRecordMeta) -> Result<RecordMetadata> {
    let id = Uuid::parse_str(&raw.record_id)
        .map_err(|_| VaultError::DatabaseError(format!("invalid record id: {}", raw.record_id)))?;
    let created_at = parse_timestamp(&raw.create_timestamp).ok_or_else(|| {
        VaultError::DatabaseError(format!("invalid timestamp: {}", raw.create_timestamp))
    })?;
    let updated_at = parse_timestamp(&raw.update_timestamp).ok_or_else(|| {
        VaultError::DatabaseError(format!("invalid timestamp: {}", raw.update_timestamp))
    })?;

    Ok(RecordMetadata {
        id,
        label: raw.label.clone(),
        category: raw.category.clone(),
        website: raw.website.clone(),
        username: raw.username.clone(),
        notes: raw.notes.clone(),
        created_at,
        updated_at,
    })
}

/// Insert a new record row
pub fn insert_record(conn: &Connection, raw: &RawRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO vault_records
         (record_id, label, category, website, username, notes, ciphertext, create_timestamp, update_timestamp)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            raw.record_id,
            raw.label,
            raw.category,
            raw.website,
            raw.username,
            raw.notes,
            raw.ciphertext,
            raw.create_timestamp,
            raw.update_timestamp,
        ],
    )?;
    Ok(())
}

/// Get a full record row by id
pub fn get_record_raw(conn: &Connection, record_id: &str) -> Result<Option<RawRecord>> {
    let result = conn.query_row(
        "SELECT record_id, label, category, website, username, notes, ciphertext, create_timestamp, update_timestamp
         FROM vault_records WHERE record_id = ?",
        params![record_id],
        |row| {
            Ok(RawRecord {
                record_id: row.get(0)?,
                label: row.get(1)?,
                category: row.get(2)?,
                website: row.get(3)?,
                username: row.get(4)?,
                notes: row.get(5)?,
                ciphertext: row.get(6)?,
                create_timestamp: row.get(7)?,
                update_timestamp: row.get(8)?,
            })
        },
    );
    Ok(result.ok())
}

/// Check whether a record id exists
pub fn record_exists(conn: &Connection, record_id: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM vault_records WHERE record_id = ?",
        params![record_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Replace all mutable columns of a record row, bumping the update timestamp
pub fn update_record_row(conn: &Connection, raw: &RawRecord) -> Result<()> {
    let rows = conn.execute(
        "UPDATE vault_records
         SET label = ?, category = ?, website = ?, username = ?, notes = ?, ciphertext = ?, update_timestamp = ?
         WHERE record_id = ?",
        params![
            raw.label,
            raw.category,
            raw.website,
            raw.username,
            raw.notes,
            raw.ciphertext,
            now_timestamp(),
            raw.record_id,
        ],
    )?;
    if rows == 0 {
        let id = Uuid::parse_str(&raw.record_id).unwrap_or(Uuid::nil());
        return Err(VaultError::RecordNotFound(id));
    }
    Ok(())
}

/// Replace only the ciphertext, without touching the timestamp (key rotation)
pub fn update_ciphertext_only(conn: &Connection, record_id: &str, ciphertext: &[u8]) -> Result<()> {
    conn.execute(
        "UPDATE vault_records SET ciphertext = ? WHERE record_id = ?",
        params![ciphertext, record_id],
    )?;
    Ok(())
}

/// Hard-delete a record (terminal, no soft-delete state)
pub fn delete_record(conn: &Connection, record_id: &str) -> Result<()> {
    let rows = conn.execute(
        "DELETE FROM vault_records WHERE record_id = ?",
        params![record_id],
    )?;
    if rows == 0 {
        let id = Uuid::parse_str(record_id).unwrap_or(Uuid::nil());
        return Err(VaultError::RecordNotFound(id));
    }
    Ok(())
}

/// Search record metadata.
///
/// The SELECT list deliberately omits the ciphertext column; listing a
/// vault never runs a decryption.
pub fn search_records(conn: &Connection, filter: &SearchFilter) -> Result<Vec<RawRecordMeta>> {
    let mut stmt = conn.prepare(
        "SELECT record_id, label, category, website, username, notes, create_timestamp, update_timestamp
         FROM vault_records
         WHERE (?1 IS NULL OR instr(lower(label), lower(?1)) > 0)
           AND (?2 IS NULL OR lower(COALESCE(category, '')) = lower(?2))
           AND (?3 IS NULL OR lower(COALESCE(website, '')) = lower(?3))
         ORDER BY label COLLATE NOCASE, record_id",
    )?;

    let rows = stmt.query_map(
        params![filter.label_contains, filter.category, filter.website],
        |row| {
            Ok(RawRecordMeta {
                record_id: row.get(0)?,
                label: row.get(1)?,
                category: row.get(2)?,
                website: row.get(3)?,
                username: row.get(4)?,
                notes: row.get(5)?,
                create_timestamp: row.get(6)?,
                update_timestamp: row.get(7)?,
            })
        },
    )?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Get every record id with its encrypted blob (key rotation, export)
pub fn get_all_ciphertexts(conn: &Connection) -> Result<Vec<(String, Vec<u8>)>> {
    let mut stmt =
        conn.prepare("SELECT record_id, ciphertext FROM vault_records ORDER BY record_id")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Get every full record row (export)
pub fn get_all_records_raw(conn: &Connection) -> Result<Vec<RawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT record_id, label, category, website, username, notes, ciphertext, create_timestamp, update_timestamp
         FROM vault_records ORDER BY record_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RawRecord {
            record_id: row.get(0)?,
            label: row.get(1)?,
            category: row.get(2)?,
            website: row.get(3)?,
            username: row.get(4)?,
            notes: row.get(5)?,
            ciphertext: row.get(6)?,
            create_timestamp: row.get(7)?,
            update_timestamp: row.get(8)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Count stored records
pub fn count_records(conn: &Connection) -> Result<u32> {
    let count: u32 = conn.query_row("SELECT COUNT(*) FROM vault_records", [], |row| row.get(0))?;
    Ok(count)
}

/// Distinct non-empty categories, sorted
pub fn distinct_categories(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM vault_records
         WHERE category IS NOT NULL AND category != ''
         ORDER BY category COLLATE NOCASE",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Distinct non-empty websites, sorted
pub fn distinct_websites(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT website FROM vault_records
         WHERE website IS NOT NULL AND website != ''
         ORDER BY website COLLATE NOCASE",
    )?;
    let rows = stmt.query_map([], |row| row.get(0))?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

// ============================================================================
// Constraint set queries
// ============================================================================

/// Raw constraint set row, character sets still JSON-encoded
#[derive(Debug, Clone)]
pub struct RawConstraintSet {
    /// Set id as stored (UUID string)
    pub set_id: String,
    /// Display name
    pub name: String,
    /// Minimum password length
    pub min_length: i64,
    /// Maximum password length
    pub max_length: i64,
    /// Require an uppercase letter
    pub require_upper: bool,
    /// Require a lowercase letter
    pub require_lower: bool,
    /// Require a digit
    pub require_digit: bool,
    /// Require a symbol
    pub require_symbol: bool,
    /// JSON array of included characters
    pub included_chars: String,
    /// JSON array of excluded characters
    pub excluded_chars: String,
    /// Maximum run of identical characters
    pub max_consecutive_repeat: i64,
}

/// Convert a raw row into a ConstraintSet
pub fn constraint_set_from_raw(raw: &RawConstraintSet) -> Result<ConstraintSet> {
    let id = Uuid::parse_str(&raw.set_id).map_err(|_| {
        VaultError::DatabaseError(format!("invalid constraint set id: {}", raw.set_id))
    })?;

    Ok(ConstraintSet {
        id,
        name: raw.name.clone(),
        min_length: raw.min_length as usize,
        max_length: raw.max_length as usize,
        require_upper: raw.require_upper,
        require_lower: raw.require_lower,
        require_digit: raw.require_digit,
        require_symbol: raw.require_symbol,
        included_chars: serde_json::from_str(&raw.included_chars)?,
        excluded_chars: serde_json::from_str(&raw.excluded_chars)?,
        max_consecutive_repeat: raw.max_consecutive_repeat as usize,
    })
}

/// Insert a constraint set
pub fn insert_constraint_set(conn: &Connection, set: &ConstraintSet) -> Result<()> {
    conn.execute(
        "INSERT INTO vault_constraint_sets
         (set_id, name, min_length, max_length, require_upper, require_lower, require_digit, require_symbol,
          included_chars, excluded_chars, max_consecutive_repeat)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            set.id.to_string(),
            set.name,
            set.min_length as i64,
            set.max_length as i64,
            set.require_upper,
            set.require_lower,
            set.require_digit,
            set.require_symbol,
            serde_json::to_string(&set.included_chars)?,
            serde_json::to_string(&set.excluded_chars)?,
            set.max_consecutive_repeat as i64,
        ],
    )?;
    Ok(())
}

/// Get a constraint set row by id
pub fn get_constraint_set_raw(conn: &Connection, set_id: &str) -> Result<Option<RawConstraintSet>> {
    let result = conn.query_row(
        "SELECT set_id, name, min_length, max_length, require_upper, require_lower, require_digit, require_symbol,
                included_chars, excluded_chars, max_consecutive_repeat
         FROM vault_constraint_sets WHERE set_id = ?",
        params![set_id],
        |row| {
            Ok(RawConstraintSet {
                set_id: row.get(0)?,
                name: row.get(1)?,
                min_length: row.get(2)?,
                max_length: row.get(3)?,
                require_upper: row.get(4)?,
                require_lower: row.get(5)?,
                require_digit: row.get(6)?,
                require_symbol: row.get(7)?,
                included_chars: row.get(8)?,
                excluded_chars: row.get(9)?,
                max_consecutive_repeat: row.get(10)?,
            })
        },
    );
    Ok(result.ok())
}

/// List all constraint set rows, ordered by name
pub fn list_constraint_sets_raw(conn: &Connection) -> Result<Vec<RawConstraintSet>> {
    let mut stmt = conn.prepare(
        "SELECT set_id, name, min_length, max_length, require_upper, require_lower, require_digit, require_symbol,
                included_chars, excluded_chars, max_consecutive_repeat
         FROM vault_constraint_sets ORDER BY name COLLATE NOCASE, set_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(RawConstraintSet {
            set_id: row.get(0)?,
            name: row.get(1)?,
            min_length: row.get(2)?,
            max_length: row.get(3)?,
            require_upper: row.get(4)?,
            require_lower: row.get(5)?,
            require_digit: row.get(6)?,
            require_symbol: row.get(7)?,
            included_chars: row.get(8)?,
            excluded_chars: row.get(9)?,
            max_consecutive_repeat: row.get(10)?,
        })
    })?;
    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Into::into)
}

/// Replace a constraint set row
pub fn update_constraint_set(conn: &Connection, set: &ConstraintSet) -> Result<()> {
    let rows = conn.execute(
        "UPDATE vault_constraint_sets
         SET name = ?, min_length = ?, max_length = ?, require_upper = ?, require_lower = ?,
             require_digit = ?, require_symbol = ?, included_chars = ?, excluded_chars = ?,
             max_consecutive_repeat = ?
         WHERE set_id = ?",
        params![
            set.name,
            set.min_length as i64,
            set.max_length as i64,
            set.require_upper,
            set.require_lower,
            set.require_digit,
            set.require_symbol,
            serde_json::to_string(&set.included_chars)?,
            serde_json::to_string(&set.excluded_chars)?,
            set.max_consecutive_repeat as i64,
            set.id.to_string(),
        ],
    )?;
    if rows == 0 {
        return Err(VaultError::ConstraintSetNotFound(set.id));
    }
    Ok(())
}

/// Delete a constraint set
pub fn delete_constraint_set(conn: &Connection, set_id: &str) -> Result<()> {
    let rows = conn.execute(
        "DELETE FROM vault_constraint_sets WHERE set_id = ?",
        params![set_id],
    )?;
    if rows == 0 {
        let id = Uuid::parse_str(set_id).unwrap_or(Uuid::nil());
        return Err(VaultError::ConstraintSetNotFound(id));
    }
    Ok(())
}
