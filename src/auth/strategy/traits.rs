//! Authorization strategy trait.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;

use crate::Result;
use crate::auth::{
    AuthorizationConfig, AuthorizationStrategyRequest, AuthorizationStrategyResponse, Header,
    Param, Scheme,
};

/// One authorization scheme.
///
/// Implementations are stateless and shared across callers; every call works on its own
/// copy of the configuration.
#[async_trait]
pub trait AuthorizationStrategy: Send + Sync + Debug {
    /// The scheme this strategy is registered under.
    fn scheme(&self) -> Scheme;

    /// Computes the value to attach to the outbound request.
    ///
    /// `Ok(None)` is not an error: there is simply nothing to attach yet.
    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>>;

    /// Decrypts ciphertext secret fields in place.
    async fn decrypt_fields(&self, _config: &mut AuthorizationConfig) -> Result<()> {
        Ok(())
    }

    /// Moves pending secret fields to ciphertext in place.
    async fn encrypt_fields(&self, _config: &mut AuthorizationConfig) -> Result<()> {
        Ok(())
    }

    /// Builds a stored configuration from a foreign flat key/value auth block.
    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>>;

    /// Header shown to the user. Never carries a live secret.
    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>>;

    /// Query parameters shown to the user.
    async fn render_display_params(&self, _config: &AuthorizationConfig) -> Result<Vec<Param>> {
        Ok(Vec::new())
    }

    /// Returns the strategy name for logging/debugging.
    fn name(&self) -> &'static str;
}

/// Fails with a configuration error when `config` belongs to another scheme.
pub(crate) fn ensure_scheme(config: &AuthorizationConfig, expected: Scheme) -> Result<()> {
    if config.scheme() == expected {
        Ok(())
    } else {
        Err(crate::Error::scheme_mismatch(expected, config.scheme()))
    }
}

/// First non-empty value among `keys`.
pub(crate) fn flat_value<'a>(map: &'a HashMap<String, String>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| map.get(*key))
        .map(|v| v.as_str())
        .find(|v| !v.is_empty())
}
