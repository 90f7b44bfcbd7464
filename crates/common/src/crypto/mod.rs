//! Encryption for stored Scopus API keys
//!
//! Keys are sealed with AES-256-GCM. The 32-byte key is the SHA-256 digest of
//! the configured secret; each value is stored as base64(nonce || ciphertext).

use crate::errors::{AppError, Result};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use sha2::{Digest, Sha256};

const NONCE_SIZE: usize = 12;

/// Symmetric cipher for credentials at rest
#[derive(Clone)]
pub struct CredentialCipher {
    key: [u8; 32],
}

impl CredentialCipher {
    /// Derive the cipher key from a configured secret
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let nonce_bytes: [u8; NONCE_SIZE] = rand::random();
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Internal {
                message: format!("Failed to encrypt API key: {}", e),
            })?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(&combined))
    }

    /// Open a stored value. Tampered data or a different secret yields `Decryption`.
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let combined = BASE64.decode(encoded).map_err(|e| AppError::Decryption {
            message: e.to_string(),
        })?;
        if combined.len() <= NONCE_SIZE {
            return Err(AppError::Decryption {
                message: "ciphertext too short".to_string(),
            });
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Decryption {
                message: e.to_string(),
            })?;

        String::from_utf8(plaintext).map_err(|e| AppError::Decryption {
            message: e.to_string(),
        })
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| AppError::Configuration {
            message: format!("Invalid encryption key: {}", e),
        })
    }
}

/// Non-secret hint shown in key listings: the last four characters.
pub fn key_hint(api_key: &str) -> String {
    let chars: Vec<char> = api_key.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = CredentialCipher::new("server-secret");
        let sealed = cipher.encrypt("0123456789abcdef0123").unwrap();

        assert_ne!(sealed, "0123456789abcdef0123");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "0123456789abcdef0123");
    }

    #[test]
    fn test_nonce_makes_ciphertexts_differ() {
        let cipher = CredentialCipher::new("server-secret");
        let a = cipher.encrypt("same-key-material-000").unwrap();
        let b = cipher.encrypt("same-key-material-000").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_wrong_secret_fails_with_decryption_error() {
        let sealed = CredentialCipher::new("secret-a").encrypt("key-material").unwrap();
        let result = CredentialCipher::new("secret-b").decrypt(&sealed);
        assert!(matches!(result, Err(AppError::Decryption { .. })));
    }

    #[test]
    fn test_garbage_input_fails_with_decryption_error() {
        let cipher = CredentialCipher::new("secret");
        assert!(matches!(cipher.decrypt("%%%"), Err(AppError::Decryption { .. })));
        assert!(matches!(cipher.decrypt("AAAA"), Err(AppError::Decryption { .. })));
    }

    #[test]
    fn test_key_hint() {
        assert_eq!(key_hint("abcdefghijklmnopqrstuvwx"), "****uvwx");
        assert_eq!(key_hint("ab"), "****ab");
    }
}
