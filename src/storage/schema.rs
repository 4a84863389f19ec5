//! Vault database schema definitions

/// Current store schema version, written into the properties table
pub const STORE_VERSION: &str = "1";

/// SQL to create the properties table
pub const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vault_properties (
    database_id     CHAR(36) NOT NULL PRIMARY KEY,
    version         CHAR(10) NOT NULL,
    create_timestamp TEXT,
    update_timestamp TEXT
)
"#;

/// SQL to create the records table.
///
/// `ciphertext` holds the full encrypted blob (nonce, ciphertext, tag);
/// every other column is queryable metadata.
pub const CREATE_RECORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vault_records (
    record_id       CHAR(36) NOT NULL PRIMARY KEY,
    label           TEXT NOT NULL,
    category        TEXT,
    website         TEXT,
    username        TEXT,
    notes           TEXT,
    ciphertext      BLOB NOT NULL,
    create_timestamp TEXT NOT NULL,
    update_timestamp TEXT NOT NULL
)
"#;

/// SQL to create the constraint sets table.
///
/// Included and excluded character sets are stored as JSON arrays.
pub const CREATE_CONSTRAINT_SETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS vault_constraint_sets (
    set_id          CHAR(36) NOT NULL PRIMARY KEY,
    name            TEXT NOT NULL,
    min_length      INTEGER NOT NULL,
    max_length      INTEGER NOT NULL,
    require_upper   INTEGER NOT NULL,
    require_lower   INTEGER NOT NULL,
    require_digit   INTEGER NOT NULL,
    require_symbol  INTEGER NOT NULL,
    included_chars  TEXT NOT NULL,
    excluded_chars  TEXT NOT NULL,
    max_consecutive_repeat INTEGER NOT NULL
)
"#;

/// SQL to create the label index used by metadata search ordering
pub const CREATE_RECORDS_LABEL_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_vault_records_label ON vault_records (label)
"#;

/// All schema creation statements in order
pub const CREATE_ALL_TABLES: &[&str] = &[
    CREATE_PROPERTIES_TABLE,
    CREATE_RECORDS_TABLE,
    CREATE_CONSTRAINT_SETS_TABLE,
    CREATE_RECORDS_LABEL_INDEX,
];
