//! Crypto collaborator contract.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Errors raised by a [`CryptoService`].
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),

    #[error("invalid encoding: {0}")]
    Encoding(String),
}

/// Encrypts and decrypts individual secret fields.
///
/// Key management lives entirely behind this trait. Calls are made one field at a time.
#[async_trait]
pub trait CryptoService: Send + Sync {
    async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;

    fn encode_base64(&self, plaintext: &str) -> String {
        STANDARD.encode(plaintext.as_bytes())
    }

    fn decode_base64(&self, encoded: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| CryptoError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopCrypto;

    #[async_trait]
    impl CryptoService for NoopCrypto {
        async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
            Ok(plaintext.to_string())
        }

        async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
            Ok(ciphertext.to_string())
        }
    }

    #[test]
    fn test_base64_helpers() {
        let crypto = NoopCrypto;
        assert_eq!(crypto.encode_base64("alice:secret"), "YWxpY2U6c2VjcmV0");
        assert_eq!(
            crypto.decode_base64("YWxpY2U6c2VjcmV0").unwrap(),
            "alice:secret"
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = NoopCrypto.decode_base64("not base64!").unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }
}
