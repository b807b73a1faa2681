//! Credential marker codec.
//!
//! Moves secret fields between their at-rest states and the transient plaintext used for a
//! single resolution. All crypto goes through the injected [`CryptoService`], one field at a
//! time.

use std::sync::Arc;

use secrecy::ExposeSecret;

use super::secret::{SecretField, SecretValue};
use crate::services::{CryptoError, CryptoService};
use crate::{Error, Result};

/// Stateless codec over the three secret states.
#[derive(Clone)]
pub struct MarkerCodec {
    crypto: Arc<dyn CryptoService>,
}

impl std::fmt::Debug for MarkerCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerCodec").finish_non_exhaustive()
    }
}

fn resolution_error(field: &'static str, operation: &str, err: CryptoError) -> Error {
    tracing::error!(field, operation, error = %err, "secret field resolution failed");
    Error::AuthResolution {
        field: field.to_string(),
        message: err.to_string(),
    }
}

impl MarkerCodec {
    pub fn new(crypto: Arc<dyn CryptoService>) -> Self {
        Self { crypto }
    }

    pub fn crypto(&self) -> &Arc<dyn CryptoService> {
        &self.crypto
    }

    /// Wraps freshly imported plaintext as pending encryption. Empty input stays empty.
    pub fn wrap_pending(&self, plaintext: &str) -> SecretValue {
        if plaintext.is_empty() {
            return SecretValue::empty();
        }
        SecretValue::pending(self.crypto.encode_base64(plaintext))
    }

    /// Pending → plaintext. No-op for any other state.
    pub fn decode_if_pending(&self, field: SecretField<'_>) -> Result<()> {
        let SecretValue::PendingEncryption(encoded) = &*field.value else {
            return Ok(());
        };
        let plaintext = self
            .crypto
            .decode_base64(encoded)
            .map_err(|e| resolution_error(field.name, "decode", e))?;
        *field.value = SecretValue::plain(plaintext);
        Ok(())
    }

    /// Ciphertext → plaintext. No-op for any other state.
    ///
    /// A crypto failure is fatal; the ciphertext is never handed back as if it were usable.
    pub async fn decrypt_if_cipher(&self, field: SecretField<'_>) -> Result<()> {
        let SecretValue::Ciphertext(cipher) = &*field.value else {
            return Ok(());
        };
        let plaintext = self
            .crypto
            .decrypt(cipher)
            .await
            .map_err(|e| resolution_error(field.name, "decrypt", e))?;
        *field.value = SecretValue::plain(plaintext);
        Ok(())
    }

    /// Pending → ciphertext. No-op unless the field is pending encryption.
    pub async fn encrypt_to_cipher(&self, field: SecretField<'_>) -> Result<()> {
        if !field.value.is_pending() {
            return Ok(());
        }
        let name = field.name;
        self.decode_if_pending(SecretField::new(name, &mut *field.value))?;

        let ciphertext = match &*field.value {
            SecretValue::Plain(plain) => self
                .crypto
                .encrypt(plain.expose_secret())
                .await
                .map_err(|e| resolution_error(name, "encrypt", e))?,
            _ => return Ok(()),
        };
        *field.value = SecretValue::ciphertext(ciphertext);
        Ok(())
    }

    /// Ciphertext then pending, leaving every field as plaintext.
    pub async fn reveal(&self, field: SecretField<'_>) -> Result<()> {
        let name = field.name;
        self.decrypt_if_cipher(SecretField::new(name, &mut *field.value))
            .await?;
        self.decode_if_pending(field)
    }

    pub async fn decrypt_all(&self, fields: Vec<SecretField<'_>>) -> Result<()> {
        for field in fields {
            self.decrypt_if_cipher(field).await?;
        }
        Ok(())
    }

    pub fn decode_all(&self, fields: Vec<SecretField<'_>>) -> Result<()> {
        for field in fields {
            self.decode_if_pending(field)?;
        }
        Ok(())
    }

    pub async fn encrypt_all(&self, fields: Vec<SecretField<'_>>) -> Result<()> {
        for field in fields {
            self.encrypt_to_cipher(field).await?;
        }
        Ok(())
    }

    pub async fn reveal_all(&self, fields: Vec<SecretField<'_>>) -> Result<()> {
        for field in fields {
            self.reveal(field).await?;
        }
        Ok(())
    }

    /// Re-wraps resolved plaintext as pending so a copy gets its own ciphertext on save.
    pub fn rewrap_all(&self, fields: Vec<SecretField<'_>>) {
        for field in fields {
            if let Some(plain) = field.value.expose() {
                let wrapped = self.wrap_pending(plain);
                *field.value = wrapped;
            }
        }
    }
}

/// Plaintext of a field the codec has already resolved.
pub(crate) fn revealed<'a>(name: &'static str, value: &'a SecretValue) -> Result<&'a str> {
    value.expose().ok_or_else(|| {
        tracing::error!(field = name, state = ?value.state(), "secret field was not resolved");
        Error::AuthResolution {
            field: name.to_string(),
            message: "secret field is still encoded".to_string(),
        }
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::{FailingCrypto, ReversingCrypto};
    use super::*;

    fn codec() -> MarkerCodec {
        MarkerCodec::new(Arc::new(ReversingCrypto::default()))
    }

    #[test]
    fn test_decode_if_pending() {
        let codec = codec();
        let mut value = SecretValue::pending("c2VjcmV0");
        codec
            .decode_if_pending(SecretField::new("password", &mut value))
            .unwrap();
        assert_eq!(value.expose(), Some("secret"));
    }

    #[tokio::test]
    async fn test_encrypt_then_decrypt_round_trip() {
        let codec = codec();
        let mut value = codec.wrap_pending("p@ss:word");

        codec
            .encrypt_to_cipher(SecretField::new("password", &mut value))
            .await
            .unwrap();
        assert!(value.is_ciphertext());

        codec
            .decrypt_if_cipher(SecretField::new("password", &mut value))
            .await
            .unwrap();
        assert_eq!(value.expose(), Some("p@ss:word"));
    }

    #[tokio::test]
    async fn test_unmarked_values_are_untouched() {
        let codec = codec();
        let mut value = SecretValue::plain("already-plain");

        codec
            .encrypt_to_cipher(SecretField::new("password", &mut value))
            .await
            .unwrap();
        codec
            .decrypt_if_cipher(SecretField::new("password", &mut value))
            .await
            .unwrap();
        codec
            .decode_if_pending(SecretField::new("password", &mut value))
            .unwrap();

        assert_eq!(value, SecretValue::plain("already-plain"));
    }

    #[tokio::test]
    async fn test_decrypt_failure_is_fatal() {
        let codec = MarkerCodec::new(Arc::new(FailingCrypto));
        let mut value = SecretValue::ciphertext("opaque");

        let err = codec
            .decrypt_if_cipher(SecretField::new("clientSecret", &mut value))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AuthResolution { ref field, .. } if field == "clientSecret"));
        assert_eq!(value, SecretValue::ciphertext("opaque"));
    }

    #[tokio::test]
    async fn test_encrypt_failure_is_fatal() {
        let codec = MarkerCodec::new(Arc::new(FailingCrypto));
        let mut value = codec.wrap_pending("secret");
        let err = codec
            .encrypt_to_cipher(SecretField::new("password", &mut value))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthResolution { .. }));
    }

    #[tokio::test]
    async fn test_reveal_handles_either_state() {
        let codec = codec();
        let mut cipher = SecretValue::ciphertext(ReversingCrypto::seal("one"));
        let mut pending = codec.wrap_pending("two");

        codec
            .reveal_all(vec![
                SecretField::new("a", &mut cipher),
                SecretField::new("b", &mut pending),
            ])
            .await
            .unwrap();

        assert_eq!(cipher.expose(), Some("one"));
        assert_eq!(pending.expose(), Some("two"));
    }

    #[test]
    fn test_wrap_pending_keeps_empty_values_empty() {
        assert!(codec().wrap_pending("").is_empty());
    }

    #[test]
    fn test_revealed_rejects_encoded_values() {
        let value = SecretValue::ciphertext("x");
        assert!(revealed("password", &value).is_err());
        assert_eq!(revealed("password", &SecretValue::plain("p")).unwrap(), "p");
    }
}
