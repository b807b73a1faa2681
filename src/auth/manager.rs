//! Authorization lifecycle entry points.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::codec::MarkerCodec;
use super::config::AuthorizationConfig;
use super::registry::StrategyRegistry;
use super::request::{AuthorizationStrategyRequest, AuthorizationStrategyResponse, Header, Param};
use super::strategy::AuthorizationStrategy;
use crate::{Error, Result};

/// Resolves, stores, imports and copies authorization configurations through the registry.
#[derive(Debug, Clone)]
pub struct AuthorizationManager {
    registry: Arc<StrategyRegistry>,
    codec: MarkerCodec,
}

impl AuthorizationManager {
    /// Manager over a registry from [`StrategyRegistry::builder`], sharing its codec.
    pub fn new(registry: Arc<StrategyRegistry>) -> Result<Self> {
        let codec = registry.codec().cloned().ok_or_else(|| {
            Error::Configuration("strategy registry has no marker codec".to_string())
        })?;
        Ok(Self { registry, codec })
    }

    pub fn registry(&self) -> &Arc<StrategyRegistry> {
        &self.registry
    }

    fn strategy_for(&self, config: &AuthorizationConfig) -> Result<Arc<dyn AuthorizationStrategy>> {
        self.registry.lookup(Some(config.scheme()))
    }

    /// Computes the value to attach to the outbound request.
    #[instrument(
        skip(self, request),
        fields(scheme = %request.unsafe_config.scheme(), project_id = %request.project_id)
    )]
    pub async fn resolve(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let strategy = self.strategy_for(&request.unsafe_config)?;
        debug!(strategy = strategy.name(), "resolving authorization");
        strategy.resolve_auth_value(request).await
    }

    /// Moves every secret to ciphertext so the configuration can be persisted.
    ///
    /// Plaintext left in the configuration is wrapped first, so nothing is stored unmarked.
    #[instrument(skip(self, config), fields(scheme = %config.scheme()))]
    pub async fn prepare_for_save(
        &self,
        mut config: AuthorizationConfig,
    ) -> Result<AuthorizationConfig> {
        let strategy = self.strategy_for(&config)?;
        self.codec.rewrap_all(config.secret_fields_mut());
        strategy.encrypt_fields(&mut config).await?;
        Ok(config)
    }

    /// Parses a foreign flat key/value block for the scheme named by `tag`.
    #[instrument(skip(self, map), fields(scheme = %tag))]
    pub fn import_flat_map(
        &self,
        tag: &str,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        let strategy = self.registry.lookup_tag(tag)?;
        let config = strategy.parse_from_flat_map(map)?;
        debug!(imported = config.is_some(), "flat authorization block parsed");
        Ok(config)
    }

    /// Deep copy of a stored configuration with freshly derived ciphertext.
    #[instrument(skip(self, config), fields(scheme = %config.scheme()))]
    pub async fn duplicate(&self, config: &AuthorizationConfig) -> Result<AuthorizationConfig> {
        let strategy = self.strategy_for(config)?;
        let mut copy = config.clone();
        strategy.decrypt_fields(&mut copy).await?;
        self.codec.rewrap_all(copy.secret_fields_mut());
        strategy.encrypt_fields(&mut copy).await?;
        Ok(copy)
    }

    #[instrument(skip(self, config), fields(scheme = %config.scheme()))]
    pub async fn display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        self.strategy_for(config)?
            .render_display_header(config)
            .await
    }

    #[instrument(skip(self, config), fields(scheme = %config.scheme()))]
    pub async fn display_params(&self, config: &AuthorizationConfig) -> Result<Vec<Param>> {
        self.strategy_for(config)?
            .render_display_params(config)
            .await
    }
}
