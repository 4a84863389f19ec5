//! Integration tests for passforge
//!
//! Cross-module flows: generation against stored constraint sets,
//! encrypted storage round-trips, tamper detection on the store file,
//! and export/import between vaults.

use std::fs;
use std::path::Path;

use passforge::{
    analyze, generate, ConstraintSet, ImportPolicy, NewRecord, RecordUpdate, SearchFilter, Vault,
    VaultError, DB_FILENAME, KEY_FILENAME,
};
use tempfile::TempDir;

fn create_vault(dir: &Path) -> Vault {
    Vault::create(dir).expect("Failed to create vault")
}

#[test]
fn test_generate_store_read_workflow() {
    let temp_dir = TempDir::new().unwrap();
    let mut vault = create_vault(&temp_dir.path().join("vault"));

    // Generate against the seeded "Strong" set
    let sets = vault.list_constraint_sets().unwrap();
    let strong = sets.iter().find(|s| s.name == "Strong").unwrap();
    let keywords = vec!["river".to_string(), "otter".to_string()];
    let candidate = vault.generate_password(&keywords, strong.id).unwrap();
    assert!(strong.is_satisfied_by(&candidate.raw_value));

    // A 12+ character four-class password should score well
    let report = analyze(&candidate.raw_value);
    println!(
        "generated {} chars, score {}",
        candidate.raw_value.chars().count(),
        report.score
    );
    assert!(report.score >= 50, "score {} too low", report.score);

    // Store it and read it back
    let id = vault
        .create_record(
            NewRecord {
                label: "GitHub".to_string(),
                category: Some("work".to_string()),
                website: Some("github.com".to_string()),
                username: Some("octocat".to_string()),
                notes: None,
            },
            &candidate.raw_value,
        )
        .unwrap();

    let plaintext = vault.read_record(id).unwrap();
    assert_eq!(plaintext.as_str(), candidate.raw_value);
}

#[test]
fn test_fixed_length_generation_example() {
    // min=max=12 with all four classes: always 12 chars, all classes present
    let mut set = ConstraintSet::new("Exact");
    set.min_length = 12;
    set.max_length = 12;

    for _ in 0..25 {
        let candidate = generate(&["river".to_string(), "otter7".to_string()], &set).unwrap();
        assert_eq!(candidate.raw_value.chars().count(), 12);
        assert!(set.is_satisfied_by(&candidate.raw_value));
    }
}

#[test]
fn test_analyzer_is_deterministic() {
    let password = "Tr0ut-R1ver!77";
    let first = analyze(password);
    for _ in 0..10 {
        let report = analyze(password);
        assert_eq!(report.score, first.score);
        assert_eq!(report.entropy_bits, first.entropy_bits);
        assert_eq!(report.penalties.len(), first.penalties.len());
    }
}

#[test]
fn test_vault_persists_across_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");

    let id = {
        let mut vault = create_vault(&dir);
        let id = vault
            .create_record(NewRecord::with_label("Bank"), "Vr9!kq-Mail2")
            .unwrap();
        vault
            .update_record(
                id,
                RecordUpdate {
                    category: Some("finance".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        id
    };

    let vault = Vault::open(&dir).unwrap();
    assert_eq!(vault.read_record(id).unwrap().as_str(), "Vr9!kq-Mail2");
    let meta = vault.get_metadata(id).unwrap();
    assert_eq!(meta.category.as_deref(), Some("finance"));
}

#[test]
fn test_key_file_is_separate_from_store() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");
    create_vault(&dir);

    let db_path = dir.join(DB_FILENAME);
    let key_path = dir.join(KEY_FILENAME);
    assert!(db_path.exists());
    assert!(key_path.exists());

    // The store file never contains the raw key bytes
    let key_bytes = fs::read(&key_path).unwrap();
    assert_eq!(key_bytes.len(), 32);
    let db_bytes = fs::read(&db_path).unwrap();
    assert!(!db_bytes
        .windows(key_bytes.len())
        .any(|window| window == key_bytes.as_slice()));
}

#[test]
fn test_tampered_store_blob_fails_authentication() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");
    let mut vault = create_vault(&dir);
    let id = vault
        .create_record(NewRecord::with_label("GitHub"), "a fairly long secret!1A")
        .unwrap();
    drop(vault);

    // Flip one byte in the stored ciphertext, behind the library's back
    let conn = rusqlite::Connection::open(dir.join(DB_FILENAME)).unwrap();
    let mut blob: Vec<u8> = conn
        .query_row(
            "SELECT ciphertext FROM vault_records WHERE record_id = ?",
            [id.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    conn.execute(
        "UPDATE vault_records SET ciphertext = ? WHERE record_id = ?",
        rusqlite::params![blob, id.to_string()],
    )
    .unwrap();
    drop(conn);

    let vault = Vault::open(&dir).unwrap();
    let result = vault.read_record(id);
    assert!(matches!(result, Err(VaultError::AuthenticationFailed(_))));
    // The error is explicit about being a decryption failure, and the
    // message never carries the plaintext
    let err = result.unwrap_err();
    assert!(err.is_decryption_error());
    assert!(!err.to_string().contains("a fairly long secret"));
}

#[test]
fn test_search_does_not_need_the_key() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");
    {
        let mut vault = create_vault(&dir);
        vault
            .create_record(
                NewRecord {
                    label: "GitHub".to_string(),
                    category: Some("work".to_string()),
                    website: Some("github.com".to_string()),
                    username: None,
                    notes: None,
                },
                "s3cret!A9",
            )
            .unwrap();
        vault
            .create_record(NewRecord::with_label("Bank"), "s3cret!B8")
            .unwrap();
    }

    // Swap in a completely different key; metadata operations still work
    fs::remove_file(dir.join(KEY_FILENAME)).unwrap();
    passforge::EncryptionKey::generate()
        .save(&dir.join(KEY_FILENAME))
        .unwrap();

    let vault = Vault::open(&dir).unwrap();
    let results = vault
        .search(&SearchFilter {
            category: Some("work".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].label, "GitHub");
    assert_eq!(vault.record_count().unwrap(), 2);
}

#[test]
fn test_export_import_between_vaults() {
    let temp_dir = TempDir::new().unwrap();
    let source_dir = temp_dir.path().join("source");
    let mut source = create_vault(&source_dir);

    let mut ids = Vec::new();
    for (label, secret) in [
        ("GitHub", "gh-Secret!1A"),
        ("Bank", "bk-Secret!2B"),
        ("Mail", "ml-Secret!3C"),
    ] {
        ids.push(
            source
                .create_record(NewRecord::with_label(label), secret)
                .unwrap(),
        );
    }

    let export_path = temp_dir.path().join("backup.json");
    let exported = source.export(&export_path).unwrap();
    assert_eq!(exported, 3);

    // Target vault shares the key, so the blobs decrypt after import
    let target_dir = temp_dir.path().join("target");
    create_vault(&target_dir);
    fs::copy(source_dir.join(KEY_FILENAME), target_dir.join(KEY_FILENAME)).unwrap();
    let mut target = Vault::open(&target_dir).unwrap();

    let summary = target.import(&export_path, ImportPolicy::Fail).unwrap();
    assert_eq!(summary.imported, 3);

    for (id, secret) in ids.iter().zip(["gh-Secret!1A", "bk-Secret!2B", "ml-Secret!3C"]) {
        assert_eq!(target.read_record(*id).unwrap().as_str(), secret);
    }

    // Same metadata on both sides
    let source_labels: Vec<String> = source
        .list_records()
        .unwrap()
        .into_iter()
        .map(|m| m.label)
        .collect();
    let target_labels: Vec<String> = target
        .list_records()
        .unwrap()
        .into_iter()
        .map(|m| m.label)
        .collect();
    assert_eq!(source_labels, target_labels);
}

#[test]
fn test_rotate_key_then_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");
    let mut vault = create_vault(&dir);
    let id = vault
        .create_record(NewRecord::with_label("GitHub"), "keep-me-Safe!7")
        .unwrap();

    let key_before = fs::read(dir.join(KEY_FILENAME)).unwrap();
    vault.rotate_key().unwrap();
    let key_after = fs::read(dir.join(KEY_FILENAME)).unwrap();
    assert_ne!(key_before, key_after);

    drop(vault);
    let vault = Vault::open(&dir).unwrap();
    assert_eq!(vault.read_record(id).unwrap().as_str(), "keep-me-Safe!7");
}

#[test]
fn test_constraint_sets_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("vault");

    let custom_id = {
        let mut vault = create_vault(&dir);
        let mut set = ConstraintSet::new("Banking");
        set.min_length = 10;
        set.max_length = 14;
        set.excluded_chars = ['l', 'I', '1', 'O', '0'].into_iter().collect();
        vault.add_constraint_set(&set).unwrap();
        set.id
    };

    let vault = Vault::open(&dir).unwrap();
    let fetched = vault.get_constraint_set(custom_id).unwrap();
    assert_eq!(fetched.name, "Banking");
    assert!(fetched.excluded_chars.contains(&'O'));

    let candidate = vault
        .generate_password(&["salmon".to_string()], custom_id)
        .unwrap();
    assert!(fetched.is_satisfied_by(&candidate.raw_value));
    for c in candidate.raw_value.chars() {
        assert!(!fetched.excluded_chars.contains(&c));
    }
}
