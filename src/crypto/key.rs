//! Encryption key management
//!
//! The symmetric key lives in its own file, separate from the record
//! store. Losing the key invalidates every record; the key is never
//! written into the store, an export, or an error message.

use std::fs;
use std::path::Path;

use aes_gcm::aead::OsRng;
use aes_gcm::{Aes256Gcm, KeyInit};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, VaultError};

/// AES-256 key length in bytes
pub const KEY_LENGTH: usize = 32;

/// Key filename inside the vault directory
pub const KEY_FILENAME: &str = "vault.key";

/// A process-wide symmetric encryption key, zeroed on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_LENGTH],
}

impl EncryptionKey {
    /// Generate a fresh random key from the OS entropy source
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(&mut OsRng);
        Self { bytes: key.into() }
    }

    /// Wrap existing key bytes
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    /// Load the key from its file.
    ///
    /// A missing or unreadable file is `KeyUnavailable`; a file of the
    /// wrong size is `MalformedKey`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(VaultError::KeyUnavailable(path.display().to_string()));
        }
        let mut data = fs::read(path)
            .map_err(|e| VaultError::KeyUnavailable(format!("{}: {}", path.display(), e)))?;
        if data.len() != KEY_LENGTH {
            data.zeroize();
            return Err(VaultError::MalformedKey(format!(
                "expected {} bytes, found {}",
                KEY_LENGTH,
                fs::metadata(path).map(|m| m.len()).unwrap_or(0)
            )));
        }
        let mut bytes = [0u8; KEY_LENGTH];
        bytes.copy_from_slice(&data);
        data.zeroize();
        Ok(Self { bytes })
    }

    /// Write the key to its file, atomically replacing any previous key.
    ///
    /// On unix the file is restricted to the owner.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path.parent().ok_or_else(|| {
            VaultError::KeyUnavailable(format!("{} has no parent directory", path.display()))
        })?;

        let mut temp = tempfile::NamedTempFile::new_in(dir)?;
        use std::io::Write;
        temp.write_all(&self.bytes)?;
        temp.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = temp.as_file().metadata()?.permissions();
            perms.set_mode(0o600);
            temp.as_file().set_permissions(perms)?;
        }

        temp.as_file().sync_all()?;
        temp.persist(path)
            .map_err(|e| VaultError::IoError(e.error))?;
        Ok(())
    }

    /// Raw key bytes, for cipher construction only
    pub(crate) fn bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.bytes
    }
}

// Key material must never leak through Debug formatting
impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}
