//! HTTP Basic authorization strategy.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::AuthorizationStrategy;
use super::traits::{ensure_scheme, flat_value};
use crate::Result;
use crate::auth::codec::{MarkerCodec, revealed};
use crate::auth::{
    AuthorizationConfig, AuthorizationSettings, AuthorizationStrategyRequest,
    AuthorizationStrategyResponse, BasicAuthorization, Header, Scheme,
};

/// `Authorization: Basic base64(username:password)`.
#[derive(Debug, Clone)]
pub struct BasicStrategy {
    codec: MarkerCodec,
    settings: Arc<AuthorizationSettings>,
}

impl BasicStrategy {
    pub fn new(codec: MarkerCodec, settings: Arc<AuthorizationSettings>) -> Self {
        Self { codec, settings }
    }
}

#[async_trait]
impl AuthorizationStrategy for BasicStrategy {
    fn scheme(&self) -> Scheme {
        Scheme::Basic
    }

    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let mut config = request.unsafe_config.clone();
        ensure_scheme(&config, Scheme::Basic)?;
        self.codec.reveal_all(config.secret_fields_mut()).await?;

        let Some(basic) = config.as_basic() else {
            return Ok(None);
        };
        let password = revealed("password", &basic.password)?;
        let credentials = format!("{}:{}", basic.username, password);
        let value = format!("Basic {}", self.codec.crypto().encode_base64(&credentials));

        Ok(Some(AuthorizationStrategyResponse::header(
            value,
            format!("Basic {}", self.settings.mask),
        )))
    }

    async fn decrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::Basic)?;
        self.codec.decrypt_all(config.secret_fields_mut()).await
    }

    async fn encrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::Basic)?;
        self.codec.encrypt_all(config.secret_fields_mut()).await
    }

    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        let username = flat_value(map, &["username"]).unwrap_or_default();
        let password = flat_value(map, &["password"]).unwrap_or_default();
        Ok(Some(
            BasicAuthorization::new(username, self.codec.wrap_pending(password)).into(),
        ))
    }

    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        ensure_scheme(config, Scheme::Basic)?;
        Ok(Some(Header::authorization(
            self.settings.computed_placeholder.clone(),
        )))
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}
