//! Bearer token authorization strategy.

use std::collections::HashMap;

use async_trait::async_trait;

use super::AuthorizationStrategy;
use super::traits::{ensure_scheme, flat_value};
use crate::Result;
use crate::auth::{
    AuthorizationConfig, AuthorizationStrategyRequest, AuthorizationStrategyResponse,
    BearerAuthorization, Header, Scheme,
};

/// `Authorization: Bearer <token>`. The token is not a managed secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct BearerStrategy;

impl BearerStrategy {
    pub fn new() -> Self {
        Self
    }
}

fn bearer_token(config: &AuthorizationConfig) -> Result<Option<&str>> {
    ensure_scheme(config, Scheme::Bearer)?;
    Ok(config
        .as_bearer()
        .and_then(|c| c.token.as_deref())
        .filter(|t| !t.is_empty()))
}

#[async_trait]
impl AuthorizationStrategy for BearerStrategy {
    fn scheme(&self) -> Scheme {
        Scheme::Bearer
    }

    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let Some(token) = bearer_token(&request.unsafe_config)? else {
            return Ok(None);
        };
        let masked = bearer_token(&request.safe_config)?.unwrap_or_default();
        Ok(Some(AuthorizationStrategyResponse::header(
            format!("Bearer {}", token),
            format!("Bearer {}", masked),
        )))
    }

    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        Ok(flat_value(map, &["token", "accessToken"])
            .map(|token| BearerAuthorization::new(token).into()))
    }

    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        Ok(bearer_token(config)?.map(|token| Header::authorization(format!("Bearer {}", token))))
    }

    fn name(&self) -> &'static str {
        "bearer"
    }
}
