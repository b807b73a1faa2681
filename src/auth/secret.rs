//! Tri-state secret field values.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::de::{self, Deserializer, Visitor};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};

const PENDING_MARKER: &str = "$ENC_PENDING$";
const CIPHER_MARKER: &str = "$ENC_CIPHER$";

/// State of a secret-bearing configuration field.
///
/// At rest a secret is either pending encryption (base64 of the plaintext) or ciphertext.
/// `Plain` only ever lives in memory for the duration of a single resolution; serializing a
/// non-empty `Plain` value is refused.
#[derive(Clone)]
pub enum SecretValue {
    Plain(SecretString),
    PendingEncryption(String),
    Ciphertext(String),
}

/// Discriminant of a [`SecretValue`], safe to log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretState {
    Plain,
    PendingEncryption,
    Ciphertext,
}

impl SecretValue {
    pub fn plain(value: impl Into<String>) -> Self {
        Self::Plain(SecretString::from(value.into()))
    }

    pub fn pending(encoded: impl Into<String>) -> Self {
        Self::PendingEncryption(encoded.into())
    }

    pub fn ciphertext(value: impl Into<String>) -> Self {
        Self::Ciphertext(value.into())
    }

    pub fn empty() -> Self {
        Self::plain(String::new())
    }

    pub fn state(&self) -> SecretState {
        match self {
            Self::Plain(_) => SecretState::Plain,
            Self::PendingEncryption(_) => SecretState::PendingEncryption,
            Self::Ciphertext(_) => SecretState::Ciphertext,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self, Self::Plain(_))
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::PendingEncryption(_))
    }

    pub fn is_ciphertext(&self) -> bool {
        matches!(self, Self::Ciphertext(_))
    }

    /// True when the field carries no payload in any state.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Plain(s) => s.expose_secret().is_empty(),
            Self::PendingEncryption(s) | Self::Ciphertext(s) => s.is_empty(),
        }
    }

    /// The plaintext, if the value has been resolved.
    pub fn expose(&self) -> Option<&str> {
        match self {
            Self::Plain(s) => Some(s.expose_secret()),
            _ => None,
        }
    }

    fn to_wire(&self) -> Option<String> {
        match self {
            Self::Plain(s) if s.expose_secret().is_empty() => Some(String::new()),
            Self::Plain(_) => None,
            Self::PendingEncryption(s) => Some(format!("{}{}", PENDING_MARKER, s)),
            Self::Ciphertext(s) => Some(format!("{}{}", CIPHER_MARKER, s)),
        }
    }

    fn from_wire(raw: String) -> Self {
        if let Some(payload) = raw.strip_prefix(PENDING_MARKER) {
            Self::pending(payload)
        } else if let Some(payload) = raw.strip_prefix(CIPHER_MARKER) {
            Self::ciphertext(payload)
        } else {
            Self::plain(raw)
        }
    }
}

impl Default for SecretValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for SecretValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Plain(a), Self::Plain(b)) => a.expose_secret() == b.expose_secret(),
            (Self::PendingEncryption(a), Self::PendingEncryption(b)) => a == b,
            (Self::Ciphertext(a), Self::Ciphertext(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for SecretValue {}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("Plain([redacted])"),
            Self::PendingEncryption(_) => f.write_str("PendingEncryption([redacted])"),
            Self::Ciphertext(c) => f.debug_tuple("Ciphertext").field(c).finish(),
        }
    }
}

impl Serialize for SecretValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.to_wire() {
            Some(wire) => serializer.serialize_str(&wire),
            None => Err(ser::Error::custom(
                "refusing to serialize an unencrypted secret value",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for SecretValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SecretVisitor;

        impl Visitor<'_> for SecretVisitor {
            type Value = SecretValue;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a marker-prefixed secret string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(SecretValue::from_wire(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(SecretValue::from_wire(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(SecretValue::empty())
            }
        }

        deserializer.deserialize_any(SecretVisitor)
    }
}

/// A named, mutable view of one secret field of a configuration.
#[derive(Debug)]
pub struct SecretField<'a> {
    pub name: &'static str,
    pub value: &'a mut SecretValue,
}

impl<'a> SecretField<'a> {
    pub fn new(name: &'static str, value: &'a mut SecretValue) -> Self {
        Self { name, value }
    }
}
