use aes_gcm::{ aead::{ Aead, AeadCore, KeyInit, OsRng }, Aes256Gcm, Nonce };

use crate::error::{ AppError, Result };

const NONCE_LEN: usize = 12;

/// AES-256-GCM for identity data at rest (BVN). Output is
/// `hex(nonce || ciphertext)`.
pub struct Encryptor {
    cipher: Aes256Gcm,
}

impl Encryptor {
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != 32 {
            return Err(AppError::Encryption("Encryption key must be 32 bytes".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(key).map_err(|e|
            AppError::Encryption(e.to_string())
        )?;

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        let ciphertext = self.cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Encryption(e.to_string()))?;

        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        Ok(hex::encode(combined))
    }

    pub fn decrypt(&self, encrypted_hex: &str) -> Result<String> {
        let combined = hex
            ::decode(encrypted_hex)
            .map_err(|e| AppError::Encryption(format!("Invalid hex: {}", e)))?;

        if combined.len() <= NONCE_LEN {
            return Err(AppError::Encryption("Encrypted data too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| AppError::Encryption(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e|
            AppError::Encryption(format!("Invalid UTF-8: {}", e))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let encryptor = Encryptor::new(&[7u8; 32]).unwrap();

        let encrypted = encryptor.encrypt("22212345678").unwrap();
        assert!(!encrypted.contains("22212345678"));
        assert_eq!(encryptor.decrypt(&encrypted).unwrap(), "22212345678");
    }

    #[test]
    fn test_different_nonces() {
        let encryptor = Encryptor::new(&[7u8; 32]).unwrap();

        let first = encryptor.encrypt("22212345678").unwrap();
        let second = encryptor.encrypt("22212345678").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = Encryptor::new(&[7u8; 32]).unwrap().encrypt("22212345678").unwrap();
        let other = Encryptor::new(&[8u8; 32]).unwrap();

        assert!(matches!(other.decrypt(&encrypted), Err(AppError::Encryption(_))));
    }

    #[test]
    fn test_short_key_rejected() {
        assert!(Encryptor::new(&[0u8; 16]).is_err());
    }
}
