//! AES-256-GCM authenticated encryption with a caller-supplied 96-bit IV.
//!
//! No associated data is used. The 16-byte authentication tag is appended to
//! the ciphertext, so a valid ciphertext is never shorter than [`TAG_LEN`].

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit, Nonce};

use crate::kdf::NoteKey;

/// IV (nonce) length for AES-GCM.
pub const IV_LEN: usize = 12;
/// GCM authentication tag length.
pub const TAG_LEN: usize = 16;

/// Cipher failures. Decryption never says why it failed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption failed")]
    Encrypt,
    #[error("decryption failed")]
    Decrypt,
}

fn cipher_for(key: &NoteKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt `plaintext` under `key` and `iv`.
///
/// The (key, iv) pair must never be reused.
///
/// # Errors
///
/// Returns [`CipherError::Encrypt`] if the plaintext exceeds the GCM length limit.
pub fn encrypt(key: &NoteKey, iv: &[u8; IV_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    cipher_for(key)
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| CipherError::Encrypt)
}

/// Decrypt and authenticate `ciphertext` (tag appended).
///
/// # Errors
///
/// Returns [`CipherError::Decrypt`] on a wrong key, wrong IV, truncated
/// input, or any tampering.
pub fn decrypt(
    key: &NoteKey,
    iv: &[u8; IV_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CipherError> {
    if ciphertext.len() < TAG_LEN {
        return Err(CipherError::Decrypt);
    }
    cipher_for(key)
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| CipherError::Decrypt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KEY_LEN;

    fn key(byte: u8) -> NoteKey {
        NoteKey::from_bytes([byte; KEY_LEN])
    }

    #[test]
    fn roundtrip() {
        let iv = [9u8; IV_LEN];
        let ct = encrypt(&key(1), &iv, b"hello world").expect("encrypt");
        assert_eq!(ct.len(), b"hello world".len() + TAG_LEN);
        let pt = decrypt(&key(1), &iv, &ct).expect("decrypt");
        assert_eq!(pt, b"hello world");
    }

    #[test]
    fn empty_plaintext_still_authenticates() {
        let iv = [0u8; IV_LEN];
        let ct = encrypt(&key(1), &iv, b"").expect("encrypt");
        assert_eq!(ct.len(), TAG_LEN);
        assert_eq!(decrypt(&key(1), &iv, &ct).expect("decrypt"), b"");
    }

    #[test]
    fn wrong_key_fails() {
        let iv = [9u8; IV_LEN];
        let ct = encrypt(&key(1), &iv, b"secret").expect("encrypt");
        assert_eq!(decrypt(&key(2), &iv, &ct), Err(CipherError::Decrypt));
    }

    #[test]
    fn wrong_iv_fails() {
        let ct = encrypt(&key(1), &[1u8; IV_LEN], b"secret").expect("encrypt");
        assert_eq!(
            decrypt(&key(1), &[2u8; IV_LEN], &ct),
            Err(CipherError::Decrypt)
        );
    }

    #[test]
    fn every_flipped_byte_is_detected() {
        let iv = [4u8; IV_LEN];
        let ct = encrypt(&key(5), &iv, b"tamper me").expect("encrypt");
        for i in 0..ct.len() {
            let mut bad = ct.clone();
            bad[i] ^= 0x01;
            assert_eq!(
                decrypt(&key(5), &iv, &bad),
                Err(CipherError::Decrypt),
                "flip at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn truncated_input_fails() {
        assert_eq!(
            decrypt(&key(1), &[0u8; IV_LEN], &[0u8; TAG_LEN - 1]),
            Err(CipherError::Decrypt)
        );
    }
}
