//! Time and nonce sources for request signing.

use std::fmt::Debug;

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;

const NONCE_LENGTH: usize = 32;

/// Wall-clock seam.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn from_timestamp(secs: i64) -> Self {
        Self(DateTime::from_timestamp(secs, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Produces the `oauth_nonce` value for one signature.
pub trait NonceGenerator: Send + Sync + Debug {
    fn nonce(&self, now: DateTime<Utc>) -> String;
}

/// 32 random alphanumeric characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNonce;

impl NonceGenerator for RandomNonce {
    fn nonce(&self, _now: DateTime<Utc>) -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect()
    }
}

/// Milliseconds since the epoch; matches nonces issued by older clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNonce;

impl NonceGenerator for TimestampNonce {
    fn nonce(&self, now: DateTime<Utc>) -> String {
        now.timestamp_millis().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct FixedNonce(pub String);

impl FixedNonce {
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }
}

impl NonceGenerator for FixedNonce {
    fn nonce(&self, _now: DateTime<Utc>) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_nonce_shape() {
        let a = RandomNonce.nonce(Utc::now());
        let b = RandomNonce.nonce(Utc::now());
        assert_eq!(a.len(), NONCE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_nonce_uses_millis() {
        let clock = FixedClock::from_timestamp(1_318_622_958);
        assert_eq!(TimestampNonce.nonce(clock.now()), "1318622958000");
    }

    #[test]
    fn test_fixed_sources() {
        let clock = FixedClock::from_timestamp(42);
        assert_eq!(clock.now().timestamp(), 42);
        assert_eq!(FixedNonce::new("abc").nonce(clock.now()), "abc");
    }
}
