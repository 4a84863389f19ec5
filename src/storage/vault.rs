//! Vault facade
//!
//! High-level API over the encrypted record store: record CRUD, metadata
//! search, constraint-set management and key rotation. All mutating
//! operations take `&mut self`, so a vault handle has exactly one writer
//! at a time; SQLite transactions cover the multi-row operations.

use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use zeroize::Zeroizing;

use super::connection::Database;
use super::models::{NewRecord, RecordMetadata, RecordUpdate, SearchFilter};
use super::queries;
use super::schema::STORE_VERSION;
use crate::constraints::{default_sets, ConstraintSet};
use crate::crypto::{decrypt, encrypt, EncryptionKey, KEY_FILENAME};
use crate::error::{Result, VaultError};
use crate::generator::password::{generate, PasswordCandidate};

/// Database filename inside the vault directory
pub const DB_FILENAME: &str = "vault.db";

/// An open vault: record database plus its encryption key
pub struct Vault {
    dir: PathBuf,
    db: Database,
    key: EncryptionKey,
}

impl Vault {
    /// Create a new vault in `dir`.
    ///
    /// Creates the directory if needed, the record database with its
    /// schema and default constraint sets, and a fresh random key in a
    /// separate key file. Fails if a vault already exists there.
    pub fn create(dir: &Path) -> Result<Self> {
        let db_path = dir.join(DB_FILENAME);
        if db_path.exists() {
            return Err(VaultError::InvalidInput(format!(
                "a vault already exists at {}",
                dir.display()
            )));
        }
        fs::create_dir_all(dir)?;

        let db = Database::create(&db_path)?;
        let conn = db.connection()?;
        queries::set_properties(conn, &Uuid::new_v4().to_string(), STORE_VERSION)?;
        for set in default_sets() {
            queries::insert_constraint_set(conn, &set)?;
        }
        db.checkpoint()?;

        let key = EncryptionKey::generate();
        key.save(&dir.join(KEY_FILENAME))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            db,
            key,
        })
    }

    /// Open an existing vault in `dir`.
    ///
    /// Loads the database and the key file; a missing key file is
    /// `KeyUnavailable`, a key of the wrong size `MalformedKey`, and a
    /// store written by a newer schema `InvalidVersion`.
    pub fn open(dir: &Path) -> Result<Self> {
        let db = Database::open(&dir.join(DB_FILENAME))?;

        let version = queries::get_store_version(db.connection()?)?.ok_or_else(|| {
            VaultError::DatabaseError("vault database has no properties row".to_string())
        })?;
        if version != STORE_VERSION {
            return Err(VaultError::InvalidVersion(version));
        }

        let key = EncryptionKey::load(&dir.join(KEY_FILENAME))?;

        Ok(Self {
            dir: dir.to_path_buf(),
            db,
            key,
        })
    }

    /// The vault directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Encrypt `plaintext` and store it with the given metadata.
    ///
    /// Returns the id of the new record. The plaintext is encrypted under
    /// a fresh nonce before it touches the database.
    pub fn create_record(&mut self, record: NewRecord, plaintext: &str) -> Result<Uuid> {
        if record.label.trim().is_empty() {
            return Err(VaultError::InvalidInput(
                "record label must not be empty".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        let ciphertext = encrypt(plaintext, &self.key)?;
        let now = queries::now_timestamp();
        let raw = queries::RawRecord {
            record_id: id.to_string(),
            label: record.label,
            category: record.category,
            website: record.website,
            username: record.username,
            notes: record.notes,
            ciphertext,
            create_timestamp: now.clone(),
            update_timestamp: now,
        };
        queries::insert_record(self.db.connection()?, &raw)?;
        self.db.checkpoint()?;
        Ok(id)
    }

    /// Decrypt and return the password of a record.
    ///
    /// The plaintext comes back in a zeroizing buffer and never appears
    /// in any error message.
    pub fn read_record(&self, id: Uuid) -> Result<Zeroizing<String>> {
        let raw = queries::get_record_raw(self.db.connection()?, &id.to_string())?
            .ok_or(VaultError::RecordNotFound(id))?;
        decrypt(&raw.ciphertext, &self.key)
    }

    /// Get the metadata of a record without decrypting anything
    pub fn get_metadata(&self, id: Uuid) -> Result<RecordMetadata> {
        let raw = queries::get_record_raw(self.db.connection()?, &id.to_string())?
            .ok_or(VaultError::RecordNotFound(id))?;
        queries::metadata_from_raw(&queries::RawRecordMeta {
            record_id: raw.record_id,
            label: raw.label,
            category: raw.category,
            website: raw.website,
            username: raw.username,
            notes: raw.notes,
            create_timestamp: raw.create_timestamp,
            update_timestamp: raw.update_timestamp,
        })
    }

    /// Apply a partial update to a record.
    ///
    /// A new password is re-encrypted under a fresh nonce. The update
    /// timestamp is bumped whenever anything changes.
    pub fn update_record(&mut self, id: Uuid, update: RecordUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let mut raw = queries::get_record_raw(self.db.connection()?, &id.to_string())?
            .ok_or(VaultError::RecordNotFound(id))?;

        if let Some(label) = update.label {
            if label.trim().is_empty() {
                return Err(VaultError::InvalidInput(
                    "record label must not be empty".to_string(),
                ));
            }
            raw.label = label;
        }
        if let Some(category) = update.category {
            raw.category = Some(category);
        }
        if let Some(website) = update.website {
            raw.website = Some(website);
        }
        if let Some(username) = update.username {
            raw.username = Some(username);
        }
        if let Some(notes) = update.notes {
            raw.notes = Some(notes);
        }
        if let Some(password) = update.password {
            raw.ciphertext = encrypt(&password, &self.key)?;
        }

        queries::update_record_row(self.db.connection()?, &raw)?;
        self.db.checkpoint()?;
        Ok(())
    }

    /// Permanently delete a record. Deletion is terminal, there is no
    /// soft-delete state to restore from.
    pub fn delete_record(&mut self, id: Uuid) -> Result<()> {
        queries::delete_record(self.db.connection()?, &id.to_string())?;
        self.db.checkpoint()?;
        Ok(())
    }

    /// Search record metadata. Never reads or decrypts ciphertexts.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<RecordMetadata>> {
        let rows = queries::search_records(self.db.connection()?, filter)?;
        rows.iter().map(queries::metadata_from_raw).collect()
    }

    /// List every record's metadata, ordered by label
    pub fn list_records(&self) -> Result<Vec<RecordMetadata>> {
        self.search(&SearchFilter::all())
    }

    /// Distinct categories in use
    pub fn categories(&self) -> Result<Vec<String>> {
        queries::distinct_categories(self.db.connection()?)
    }

    /// Distinct websites in use
    pub fn websites(&self) -> Result<Vec<String>> {
        queries::distinct_websites(self.db.connection()?)
    }

    /// Number of stored records
    pub fn record_count(&self) -> Result<u32> {
        queries::count_records(self.db.connection()?)
    }

    // ========================================================================
    // Constraint sets
    // ========================================================================

    /// Validate and persist a constraint set
    pub fn add_constraint_set(&mut self, set: &ConstraintSet) -> Result<()> {
        set.validate()?;
        queries::insert_constraint_set(self.db.connection()?, set)?;
        self.db.checkpoint()?;
        Ok(())
    }

    /// Get a constraint set by id
    pub fn get_constraint_set(&self, id: Uuid) -> Result<ConstraintSet> {
        let raw = queries::get_constraint_set_raw(self.db.connection()?, &id.to_string())?
            .ok_or(VaultError::ConstraintSetNotFound(id))?;
        queries::constraint_set_from_raw(&raw)
    }

    /// List all constraint sets, ordered by name
    pub fn list_constraint_sets(&self) -> Result<Vec<ConstraintSet>> {
        let rows = queries::list_constraint_sets_raw(self.db.connection()?)?;
        rows.iter().map(queries::constraint_set_from_raw).collect()
    }

    /// Validate and replace a persisted constraint set
    pub fn update_constraint_set(&mut self, set: &ConstraintSet) -> Result<()> {
        set.validate()?;
        queries::update_constraint_set(self.db.connection()?, set)?;
        self.db.checkpoint()?;
        Ok(())
    }

    /// Delete a constraint set
    pub fn delete_constraint_set(&mut self, id: Uuid) -> Result<()> {
        queries::delete_constraint_set(self.db.connection()?, &id.to_string())?;
        self.db.checkpoint()?;
        Ok(())
    }

    /// Generate a password candidate against a stored constraint set
    pub fn generate_password(
        &self,
        keywords: &[String],
        set_id: Uuid,
    ) -> Result<PasswordCandidate> {
        let set = self.get_constraint_set(set_id)?;
        generate(keywords, &set)
    }

    // ========================================================================
    // Key rotation
    // ========================================================================

    /// Rotate the encryption key.
    ///
    /// Generates a fresh key, re-encrypts every record under it inside a
    /// single transaction, writes the new key file, then commits. If the
    /// commit fails the transaction is rolled back and the old key file
    /// is restored, so the key on disk always matches the ciphertexts.
    pub fn rotate_key(&mut self) -> Result<()> {
        let new_key = EncryptionKey::generate();
        let key_path = self.dir.join(KEY_FILENAME);

        self.db.begin_transaction()?;
        let result = self.reencrypt_all(&new_key);
        if let Err(err) = result {
            let _ = self.db.rollback_transaction();
            return Err(err);
        }

        if let Err(err) = new_key.save(&key_path) {
            let _ = self.db.rollback_transaction();
            return Err(err);
        }
        if let Err(err) = self.db.commit_transaction() {
            let _ = self.db.rollback_transaction();
            let _ = self.key.save(&key_path);
            return Err(err);
        }

        self.db.checkpoint()?;
        self.key = new_key;
        Ok(())
    }

    fn reencrypt_all(&self, new_key: &EncryptionKey) -> Result<()> {
        let conn = self.db.connection()?;
        for (record_id, ciphertext) in queries::get_all_ciphertexts(conn)? {
            let plaintext = decrypt(&ciphertext, &self.key)?;
            let reencrypted = encrypt(&plaintext, new_key)?;
            queries::update_ciphertext_only(conn, &record_id, &reencrypted)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault").field("dir", &self.dir).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_vault() -> (TempDir, Vault) {
        let temp_dir = TempDir::new().unwrap();
        let vault = Vault::create(&temp_dir.path().join("vault")).unwrap();
        (temp_dir, vault)
    }

    #[test]
    fn test_create_seeds_defaults_and_key() {
        let (_dir, vault) = test_vault();

        let sets = vault.list_constraint_sets().unwrap();
        let names: Vec<&str> = sets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Simple", "Standard", "Strong"]);

        assert!(vault.dir().join(DB_FILENAME).exists());
        assert!(vault.dir().join(KEY_FILENAME).exists());
    }

    #[test]
    fn test_create_twice_fails() {
        let (_dir, vault) = test_vault();
        let result = Vault::create(vault.dir());
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_open_missing_key_file() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vault");
        {
            Vault::create(&dir).unwrap();
        }
        std::fs::remove_file(dir.join(KEY_FILENAME)).unwrap();

        let result = Vault::open(&dir);
        assert!(matches!(result, Err(VaultError::KeyUnavailable(_))));
    }

    #[test]
    fn test_record_lifecycle() {
        let (_dir, mut vault) = test_vault();

        let id = vault
            .create_record(
                NewRecord {
                    label: "GitHub".to_string(),
                    category: Some("work".to_string()),
                    website: Some("github.com".to_string()),
                    username: Some("octocat".to_string()),
                    notes: None,
                },
                "Tr0ut-R1ver!77",
            )
            .unwrap();

        assert_eq!(vault.read_record(id).unwrap().as_str(), "Tr0ut-R1ver!77");

        let meta = vault.get_metadata(id).unwrap();
        assert_eq!(meta.label, "GitHub");
        assert_eq!(meta.username.as_deref(), Some("octocat"));

        vault
            .update_record(
                id,
                RecordUpdate {
                    password: Some("N3w-Secret!9".to_string()),
                    notes: Some("rotated".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(vault.read_record(id).unwrap().as_str(), "N3w-Secret!9");
        assert_eq!(
            vault.get_metadata(id).unwrap().notes.as_deref(),
            Some("rotated")
        );

        vault.delete_record(id).unwrap();
        assert!(matches!(
            vault.read_record(id),
            Err(VaultError::RecordNotFound(_))
        ));
        assert!(matches!(
            vault.delete_record(id),
            Err(VaultError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_empty_label_rejected() {
        let (_dir, mut vault) = test_vault();
        let result = vault.create_record(NewRecord::with_label("   "), "pw");
        assert!(matches!(result, Err(VaultError::InvalidInput(_))));
    }

    #[test]
    fn test_reopen_reads_existing_records() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vault");

        let id = {
            let mut vault = Vault::create(&dir).unwrap();
            vault
                .create_record(NewRecord::with_label("GitHub"), "s3cret!A9")
                .unwrap()
        };

        let vault = Vault::open(&dir).unwrap();
        assert_eq!(vault.read_record(id).unwrap().as_str(), "s3cret!A9");
    }

    #[test]
    fn test_search_without_decryption_after_key_loss() {
        // Metadata listing must keep working even when the key is gone:
        // search never touches the encryption layer.
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vault");
        let id = {
            let mut vault = Vault::create(&dir).unwrap();
            vault
                .create_record(NewRecord::with_label("GitHub"), "s3cret!A9")
                .unwrap()
        };

        std::fs::remove_file(dir.join(KEY_FILENAME)).unwrap();
        let other = EncryptionKey::generate();
        other.save(&dir.join(KEY_FILENAME)).unwrap();

        let vault = Vault::open(&dir).unwrap();
        let results = vault.search(&SearchFilter::by_label("git")).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, id);

        // Reading the password itself now fails authentication
        assert!(matches!(
            vault.read_record(id),
            Err(VaultError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn test_constraint_set_crud() {
        let (_dir, mut vault) = test_vault();

        let mut set = ConstraintSet::new("Banking");
        set.min_length = 10;
        vault.add_constraint_set(&set).unwrap();

        let fetched = vault.get_constraint_set(set.id).unwrap();
        assert_eq!(fetched, set);

        set.max_length = 14;
        vault.update_constraint_set(&set).unwrap();
        assert_eq!(vault.get_constraint_set(set.id).unwrap().max_length, 14);

        vault.delete_constraint_set(set.id).unwrap();
        assert!(matches!(
            vault.get_constraint_set(set.id),
            Err(VaultError::ConstraintSetNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_constraint_set_never_persisted() {
        let (_dir, mut vault) = test_vault();
        let before = vault.list_constraint_sets().unwrap().len();

        let mut set = ConstraintSet::new("Broken");
        set.min_length = 30;
        set.max_length = 10;
        assert!(vault.add_constraint_set(&set).is_err());
        assert_eq!(vault.list_constraint_sets().unwrap().len(), before);
    }

    #[test]
    fn test_generate_password_against_stored_set() {
        let (_dir, vault) = test_vault();
        let sets = vault.list_constraint_sets().unwrap();
        let standard = sets.iter().find(|s| s.name == "Standard").unwrap();

        let candidate = vault
            .generate_password(&["river".to_string()], standard.id)
            .unwrap();
        assert!(standard.is_satisfied_by(&candidate.raw_value));

        let missing = Uuid::new_v4();
        assert!(matches!(
            vault.generate_password(&[], missing),
            Err(VaultError::ConstraintSetNotFound(_))
        ));
    }

    #[test]
    fn test_rotate_key_preserves_plaintexts() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vault");
        let mut vault = Vault::create(&dir).unwrap();

        let a = vault
            .create_record(NewRecord::with_label("A"), "first-secret!1A")
            .unwrap();
        let b = vault
            .create_record(NewRecord::with_label("B"), "second-secret!2B")
            .unwrap();

        let blob_before = {
            let conn = vault.database().connection().unwrap();
            queries::get_record_raw(conn, &a.to_string())
                .unwrap()
                .unwrap()
                .ciphertext
        };

        vault.rotate_key().unwrap();

        // Same plaintexts, different ciphertexts, both through the live
        // handle and after reopening with the new key file
        assert_eq!(vault.read_record(a).unwrap().as_str(), "first-secret!1A");
        assert_eq!(vault.read_record(b).unwrap().as_str(), "second-secret!2B");

        let blob_after = {
            let conn = vault.database().connection().unwrap();
            queries::get_record_raw(conn, &a.to_string())
                .unwrap()
                .unwrap()
                .ciphertext
        };
        assert_ne!(blob_before, blob_after);

        drop(vault);
        let reopened = Vault::open(&dir).unwrap();
        assert_eq!(reopened.read_record(a).unwrap().as_str(), "first-secret!1A");
    }

    #[test]
    fn test_listings() {
        let (_dir, mut vault) = test_vault();
        for (label, category, website) in [
            ("A", Some("work"), Some("github.com")),
            ("B", Some("personal"), None),
            ("C", Some("work"), Some("example.org")),
        ] {
            vault
                .create_record(
                    NewRecord {
                        label: label.to_string(),
                        category: category.map(String::from),
                        website: website.map(String::from),
                        username: None,
                        notes: None,
                    },
                    "pw",
                )
                .unwrap();
        }

        assert_eq!(vault.categories().unwrap(), vec!["personal", "work"]);
        assert_eq!(
            vault.websites().unwrap(),
            vec!["example.org", "github.com"]
        );
        assert_eq!(vault.record_count().unwrap(), 3);
    }
}
