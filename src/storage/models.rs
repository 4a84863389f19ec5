//! Data models for vault records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queryable metadata of a stored password record.
///
/// Never carries the ciphertext or the plaintext; listing and searching
/// operate on this type without touching the encryption layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Unique record identifier
    pub id: Uuid,
    /// Display label (e.g. "GitHub")
    pub label: String,
    /// Free-form category (e.g. "work")
    pub category: Option<String>,
    /// Associated website
    pub website: Option<String>,
    /// Account username for the site
    pub username: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// Metadata supplied when creating a record
#[derive(Debug, Clone, Default)]
pub struct NewRecord {
    /// Display label
    pub label: String,
    /// Free-form category
    pub category: Option<String>,
    /// Associated website
    pub website: Option<String>,
    /// Account username for the site
    pub username: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl NewRecord {
    /// A record with only a label set
    pub fn with_label(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Default::default()
        }
    }
}

/// Partial update of a record.
///
/// `Some` replaces the stored value, `None` leaves it unchanged. Setting
/// `password` re-encrypts the record under a fresh nonce.
#[derive(Debug, Clone, Default)]
pub struct RecordUpdate {
    /// New display label
    pub label: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New website
    pub website: Option<String>,
    /// New username
    pub username: Option<String>,
    /// New notes
    pub notes: Option<String>,
    /// New password plaintext
    pub password: Option<String>,
}

impl RecordUpdate {
    /// True when nothing would change
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.category.is_none()
            && self.website.is_none()
            && self.username.is_none()
            && self.notes.is_none()
            && self.password.is_none()
    }
}

/// Metadata search filter.
///
/// All present conditions must match; an empty filter matches everything.
/// Label matching is a case-insensitive substring test, category and
/// website are case-insensitive equality.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Substring to look for in the label
    pub label_contains: Option<String>,
    /// Exact category
    pub category: Option<String>,
    /// Exact website
    pub website: Option<String>,
}

impl SearchFilter {
    /// A filter matching every record
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter on the label only
    pub fn by_label(substring: &str) -> Self {
        Self {
            label_contains: Some(substring.to_string()),
            ..Default::default()
        }
    }
}
