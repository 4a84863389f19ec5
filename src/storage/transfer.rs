//! Vault export and import
//!
//! The export is a self-describing JSON document of encrypted records:
//! blobs stay encrypted (base64 of nonce, ciphertext and tag) and the key
//! is never part of it. An export is only readable by a vault holding the
//! same key.

use std::fs;
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::queries;
use super::vault::Vault;
use crate::error::{Result, VaultError};

/// Format marker of an export document
pub const EXPORT_FORMAT: &str = "passforge-export";

/// Current export document version
pub const EXPORT_VERSION: u32 = 1;

/// The whole export document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Format marker, always [`EXPORT_FORMAT`]
    pub format: String,
    /// Document version
    pub version: u32,
    /// Export timestamp
    pub exported_at: String,
    /// All records, still encrypted
    pub records: Vec<ExportRecord>,
}

/// One exported record. The ciphertext is base64 of the stored blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Record id
    pub id: String,
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
    /// Base64-encoded encrypted blob (nonce, ciphertext, tag)
    pub ciphertext: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last modification timestamp
    pub updated_at: String,
}

/// What to do when an imported record id already exists in the vault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPolicy {
    /// Keep the existing record, skip the imported one
    Skip,
    /// Import under a fresh id
    Rename,
    /// Abort the whole import with `ImportConflict`
    Fail,
}

/// Counts of what an import did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Records inserted under their original id
    pub imported: u32,
    /// Records skipped because of an id collision
    pub skipped: u32,
    /// Records inserted under a fresh id
    pub renamed: u32,
}

impl Vault {
    /// Export all records to a JSON document at `path`.
    ///
    /// The file is written atomically (temp file in the target directory,
    /// then rename). Returns the number of exported records.
    pub fn export(&self, path: &Path) -> Result<u32> {
        let rows = queries::get_all_records_raw(self.database().connection()?)?;
        let records: Vec<ExportRecord> = rows
            .into_iter()
            .map(|raw| ExportRecord {
                id: raw.record_id,
                label: raw.label,
                category: raw.category,
                website: raw.website,
                username: raw.username,
                notes: raw.notes,
                ciphertext: BASE64.encode(&raw.ciphertext),
                created_at: raw.create_timestamp,
                updated_at: raw.update_timestamp,
            })
            .collect();

        let document = ExportDocument {
            format: EXPORT_FORMAT.to_string(),
            version: EXPORT_VERSION,
            exported_at: queries::now_timestamp(),
            records,
        };
        let json = serde_json::to_string_pretty(&document)?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist(path)
            .map_err(|e| VaultError::IoError(e.error))?;

        Ok(document.records.len() as u32)
    }

    /// Import records from an export document at `path`.
    ///
    /// Blobs are copied as-is; they only decrypt later if this vault holds
    /// the key they were encrypted under. Id collisions are resolved by
    /// `policy`, deterministically. The whole import runs in one
    /// transaction, so a `Fail` abort leaves the vault untouched.
    pub fn import(&mut self, path: &Path, policy: ImportPolicy) -> Result<ImportSummary> {
        let json = fs::read_to_string(path)?;
        let document: ExportDocument = serde_json::from_str(&json)?;

        if document.format != EXPORT_FORMAT {
            return Err(VaultError::InvalidVersion(format!(
                "unrecognized export format: {}",
                document.format
            )));
        }
        if document.version > EXPORT_VERSION {
            return Err(VaultError::InvalidVersion(format!(
                "export version {} is newer than supported version {}",
                document.version, EXPORT_VERSION
            )));
        }

        self.database_mut().begin_transaction()?;
        match self.import_records(&document, policy) {
            Ok(summary) => {
                self.database_mut().commit_transaction()?;
                self.database().checkpoint()?;
                Ok(summary)
            }
            Err(err) => {
                let _ = self.database_mut().rollback_transaction();
                Err(err)
            }
        }
    }

    fn import_records(
        &self,
        document: &ExportDocument,
        policy: ImportPolicy,
    ) -> Result<ImportSummary> {
        let conn = self.database().connection()?;
        let mut summary = ImportSummary::default();

        for record in &document.records {
            let id = Uuid::parse_str(&record.id).map_err(|_| {
                VaultError::SerializationError(format!("invalid record id: {}", record.id))
            })?;
            let ciphertext = BASE64.decode(&record.ciphertext).map_err(|_| {
                VaultError::SerializationError(format!(
                    "record {} has undecodable ciphertext",
                    record.id
                ))
            })?;

            let store_id = if queries::record_exists(conn, &record.id)? {
                match policy {
                    ImportPolicy::Skip => {
                        summary.skipped += 1;
                        continue;
                    }
                    ImportPolicy::Rename => {
                        summary.renamed += 1;
                        Uuid::new_v4().to_string()
                    }
                    ImportPolicy::Fail => return Err(VaultError::ImportConflict(id)),
                }
            } else {
                summary.imported += 1;
                record.id.clone()
            };

            let now = queries::now_timestamp();
            let raw = queries::RawRecord {
                record_id: store_id,
                label: record.label.clone(),
                category: record.category.clone(),
                website: record.website.clone(),
                username: record.username.clone(),
                notes: record.notes.clone(),
                ciphertext,
                create_timestamp: valid_or(&record.created_at, &now),
                update_timestamp: valid_or(&record.updated_at, &now),
            };
            queries::insert_record(conn, &raw)?;
        }

        Ok(summary)
    }
}

/// Keep an exported timestamp only when it parses in the store format
fn valid_or(timestamp: &str, fallback: &str) -> String {
    if queries::parse_timestamp(timestamp).is_some() {
        timestamp.to_string()
    } else {
        fallback.to_string()
    }
}
