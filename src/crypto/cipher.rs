//! Record encryption and decryption
//!
//! AES-256-GCM with a fresh random 96-bit nonce per encryption. The nonce
//! is prepended to the ciphertext, so a stored blob is
//! `nonce || ciphertext || tag`. Nonces are never reused with the same key;
//! every re-encryption draws a new one.

use aes_gcm::aead::{Aead, AeadCore, OsRng};
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};
use zeroize::Zeroizing;

use super::key::EncryptionKey;
use crate::error::{Result, VaultError};

/// AES-GCM nonce length in bytes
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LENGTH: usize = 16;

/// Encrypt a plaintext, returning `nonce || ciphertext || tag`
pub fn encrypt(plaintext: &str, key: &EncryptionKey) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| VaultError::EncryptionError("AEAD encryption failed".to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt a `nonce || ciphertext || tag` blob.
///
/// A blob too short to contain a nonce and tag is `CorruptedCiphertext`;
/// an authentication failure (wrong key or tampered bytes) is
/// `AuthenticationFailed`. The two are never conflated.
pub fn decrypt(blob: &[u8], key: &EncryptionKey) -> Result<Zeroizing<String>> {
    if blob.len() < NONCE_LENGTH + TAG_LENGTH {
        return Err(VaultError::CorruptedCiphertext(format!(
            "blob of {} bytes is shorter than nonce and tag",
            blob.len()
        )));
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LENGTH);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.bytes()));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|_| {
            VaultError::AuthenticationFailed(
                "authentication tag mismatch (wrong key or tampered data)".to_string(),
            )
        })?;

    let plaintext = Zeroizing::new(plaintext);
    match std::str::from_utf8(&plaintext) {
        Ok(s) => Ok(Zeroizing::new(s.to_string())),
        Err(_) => Err(VaultError::CorruptedCiphertext(
            "decrypted bytes are not valid UTF-8".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = EncryptionKey::generate();
        let plaintext = "correct horse battery staple";

        let blob = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&blob, &key).unwrap();
        assert_eq!(decrypted.as_str(), plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_utf8() {
        let key = EncryptionKey::generate();
        let plaintext = "Пароль! 密码 🔐";

        let blob = encrypt(plaintext, &key).unwrap();
        let decrypted = decrypt(&blob, &key).unwrap();
        assert_eq!(decrypted.as_str(), plaintext);
    }

    #[test]
    fn test_encrypt_decrypt_empty() {
        let key = EncryptionKey::generate();
        let blob = encrypt("", &key).unwrap();
        assert_eq!(blob.len(), NONCE_LENGTH + TAG_LENGTH);
        let decrypted = decrypt(&blob, &key).unwrap();
        assert_eq!(decrypted.as_str(), "");
    }

    #[test]
    fn test_same_plaintext_different_ciphertext() {
        let key = EncryptionKey::generate();
        let a = encrypt("secret", &key).unwrap();
        let b = encrypt("secret", &key).unwrap();
        // Fresh nonce per call: whole blob and nonce prefix both differ
        assert_ne!(a, b);
        assert_ne!(a[..NONCE_LENGTH], b[..NONCE_LENGTH]);
    }

    #[test]
    fn test_wrong_key_fails_authentication() {
        let key = EncryptionKey::generate();
        let other = EncryptionKey::generate();
        let blob = encrypt("secret", &key).unwrap();

        let result = decrypt(&blob, &other);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed(_))));
    }

    #[test]
    fn test_tampered_byte_fails_authentication() {
        let key = EncryptionKey::generate();
        let blob = encrypt("a fairly long secret value", &key).unwrap();

        // Flip a single byte anywhere in the blob
        for pos in [0, NONCE_LENGTH, blob.len() - 1] {
            let mut tampered = blob.clone();
            tampered[pos] ^= 0x01;
            let result = decrypt(&tampered, &key);
            assert!(
                matches!(result, Err(VaultError::AuthenticationFailed(_))),
                "tampering at {pos} not detected"
            );
        }
    }

    #[test]
    fn test_truncated_blob_is_corrupted_not_wrong_key() {
        let key = EncryptionKey::generate();
        let result = decrypt(&[0u8; NONCE_LENGTH + TAG_LENGTH - 1], &key);
        assert!(matches!(result, Err(VaultError::CorruptedCiphertext(_))));

        let result = decrypt(&[], &key);
        assert!(matches!(result, Err(VaultError::CorruptedCiphertext(_))));
    }
}
