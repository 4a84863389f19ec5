//! Encrypted record store
//!
//! Handles the SQLite-backed vault:
//! - Schema creation and the properties/version row
//! - CRUD and metadata search for encrypted records
//! - Constraint-set persistence
//! - Key rotation, export and import

pub mod connection;
pub mod models;
pub mod queries;
pub mod schema;
pub mod transfer;
pub mod vault;

pub use connection::Database;
pub use models::{NewRecord, RecordMetadata, RecordUpdate, SearchFilter};
pub use schema::STORE_VERSION;
pub use transfer::{ExportDocument, ImportPolicy, ImportSummary, EXPORT_FORMAT, EXPORT_VERSION};
pub use vault::{Vault, DB_FILENAME};
