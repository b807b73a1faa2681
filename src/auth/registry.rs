//! Strategy registry and builder.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use super::clock::{Clock, NonceGenerator, RandomNonce, SystemClock};
use super::codec::MarkerCodec;
use super::scheme::Scheme;
use super::settings::AuthorizationSettings;
use super::strategy::{
    AuthorizationStrategy, BasicStrategy, BearerStrategy, InheritFromParentStrategy,
    OAuth1Strategy, OAuth2Strategy,
};
use crate::services::{CryptoService, FolderLookup, HttpTokenClient, TokenEndpointClient};
use crate::{Error, Result};

/// Maps each scheme to the strategy that handles it.
#[derive(Debug, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<Scheme, Arc<dyn AuthorizationStrategy>>,
    codec: Option<MarkerCodec>,
}

impl StrategyRegistry {
    pub fn new(strategies: impl IntoIterator<Item = Arc<dyn AuthorizationStrategy>>) -> Self {
        let mut registry = Self::default();
        for strategy in strategies {
            registry.register(strategy);
        }
        registry
    }

    pub fn builder() -> StrategyRegistryBuilder {
        StrategyRegistryBuilder::default()
    }

    /// Register a strategy, replacing any existing one for the same scheme.
    pub fn register(&mut self, strategy: Arc<dyn AuthorizationStrategy>) {
        self.strategies.insert(strategy.scheme(), strategy);
    }

    /// The codec the built-in strategies share. `None` for hand-assembled registries.
    pub fn codec(&self) -> Option<&MarkerCodec> {
        self.codec.as_ref()
    }

    pub fn get(&self, scheme: Scheme) -> Option<&Arc<dyn AuthorizationStrategy>> {
        self.strategies.get(&scheme)
    }

    /// Strategy for `scheme`. A missing scheme or an unregistered one is a configuration error.
    pub fn lookup(&self, scheme: Option<Scheme>) -> Result<Arc<dyn AuthorizationStrategy>> {
        let scheme = scheme
            .ok_or_else(|| Error::Configuration("authorization type is missing".to_string()))?;
        self.get(scheme).cloned().ok_or_else(|| {
            Error::Configuration(format!("no strategy registered for {}", scheme))
        })
    }

    /// Strategy for a stored type tag such as `"OAUTH2"`.
    pub fn lookup_tag(&self, tag: &str) -> Result<Arc<dyn AuthorizationStrategy>> {
        self.lookup(Some(tag.parse()?))
    }

    /// Registered schemes in declaration order.
    pub fn schemes(&self) -> Vec<Scheme> {
        Scheme::ALL
            .into_iter()
            .filter(|s| self.strategies.contains_key(s))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

/// Non-owning handle to a registry, for strategies that delegate to other strategies.
#[derive(Debug, Clone, Default)]
pub struct StrategyLookup(Weak<StrategyRegistry>);

impl StrategyLookup {
    pub fn new(registry: &Arc<StrategyRegistry>) -> Self {
        Self(Arc::downgrade(registry))
    }

    pub fn lookup(&self, scheme: Scheme) -> Result<Arc<dyn AuthorizationStrategy>> {
        let registry = self
            .0
            .upgrade()
            .ok_or_else(|| Error::Configuration("strategy registry was dropped".to_string()))?;
        registry.lookup(Some(scheme))
    }
}

/// Wires every built-in strategy around shared collaborators.
#[derive(Default)]
pub struct StrategyRegistryBuilder {
    crypto: Option<Arc<dyn CryptoService>>,
    folders: Option<Arc<dyn FolderLookup>>,
    token_client: Option<Arc<dyn TokenEndpointClient>>,
    settings: Option<AuthorizationSettings>,
    clock: Option<Arc<dyn Clock>>,
    nonce: Option<Arc<dyn NonceGenerator>>,
}

impl StrategyRegistryBuilder {
    pub fn crypto(mut self, crypto: Arc<dyn CryptoService>) -> Self {
        self.crypto = Some(crypto);
        self
    }

    pub fn folders(mut self, folders: Arc<dyn FolderLookup>) -> Self {
        self.folders = Some(folders);
        self
    }

    pub fn token_client(mut self, client: Arc<dyn TokenEndpointClient>) -> Self {
        self.token_client = Some(client);
        self
    }

    pub fn settings(mut self, settings: AuthorizationSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn nonce(mut self, nonce: Arc<dyn NonceGenerator>) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn build(self) -> Result<Arc<StrategyRegistry>> {
        let crypto = self
            .crypto
            .ok_or_else(|| Error::Configuration("crypto service is required".to_string()))?;
        let folders = self
            .folders
            .ok_or_else(|| Error::Configuration("folder lookup is required".to_string()))?;
        let token_client: Arc<dyn TokenEndpointClient> = match self.token_client {
            Some(client) => client,
            None => Arc::new(HttpTokenClient::new()?),
        };
        let settings = Arc::new(self.settings.unwrap_or_default());
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let nonce = self.nonce.unwrap_or_else(|| Arc::new(RandomNonce));
        let codec = MarkerCodec::new(crypto);

        let registry = Arc::new_cyclic(|weak: &Weak<StrategyRegistry>| {
            let strategies: Vec<Arc<dyn AuthorizationStrategy>> = vec![
                Arc::new(BasicStrategy::new(codec.clone(), Arc::clone(&settings))),
                Arc::new(BearerStrategy::new()),
                Arc::new(OAuth1Strategy::new(
                    codec.clone(),
                    Arc::clone(&settings),
                    clock,
                    nonce,
                )),
                Arc::new(OAuth2Strategy::new(
                    codec.clone(),
                    Arc::clone(&settings),
                    token_client,
                )),
                Arc::new(InheritFromParentStrategy::new(
                    folders,
                    StrategyLookup(weak.clone()),
                    Arc::clone(&settings),
                )),
            ];
            let mut registry = StrategyRegistry::new(strategies);
            registry.codec = Some(codec);
            registry
        });

        tracing::debug!(schemes = ?registry.schemes(), "strategy registry built");
        Ok(registry)
    }
}
