//! OAuth2 authorization strategy.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::AuthorizationStrategy;
use super::traits::{ensure_scheme, flat_value};
use crate::auth::codec::{MarkerCodec, revealed};
use crate::auth::{
    AuthorizationConfig, AuthorizationSettings, AuthorizationStrategyRequest,
    AuthorizationStrategyResponse, GrantType, Header, OAuth2Authorization, Scheme,
};
use crate::services::TokenEndpointClient;
use crate::{Error, Result};

/// Obtains an access token for credential grants; reuses the stored token for
/// authorization-code grants.
#[derive(Clone)]
pub struct OAuth2Strategy {
    codec: MarkerCodec,
    settings: Arc<AuthorizationSettings>,
    token_client: Arc<dyn TokenEndpointClient>,
}

impl fmt::Debug for OAuth2Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth2Strategy")
            .field("codec", &self.codec)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn oauth2_config(config: &AuthorizationConfig) -> Result<&OAuth2Authorization> {
    config
        .as_oauth2()
        .ok_or_else(|| Error::scheme_mismatch(Scheme::OAuth2, config.scheme()))
}

fn pair(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

impl OAuth2Strategy {
    pub fn new(
        codec: MarkerCodec,
        settings: Arc<AuthorizationSettings>,
        token_client: Arc<dyn TokenEndpointClient>,
    ) -> Self {
        Self {
            codec,
            settings,
            token_client,
        }
    }

    /// Form body for a credential grant. Missing username or password are sent empty.
    fn token_form(&self, config: &OAuth2Authorization) -> Result<Vec<(String, String)>> {
        let mut form = vec![
            pair("client_id", &config.client_id),
            pair("grant_type", config.grant_type.wire_name()),
        ];
        match config.grant_type {
            GrantType::ClientCredentials => {
                form.push(pair(
                    "client_secret",
                    revealed("clientSecret", &config.client_secret)?,
                ));
            }
            GrantType::PasswordCredentials => {
                form.push(pair("username", config.username.as_deref().unwrap_or_default()));
                form.push(pair("password", revealed("password", &config.password)?));
            }
            GrantType::AuthorizationCode => {
                return Err(Error::IllegalGrantType(
                    config.grant_type.wire_name().to_string(),
                ));
            }
        }
        if let Some(scope) = config.scope.as_deref().filter(|s| !s.is_empty()) {
            form.push(pair("scope", scope));
        }
        Ok(form)
    }

    fn masked(&self, config: &OAuth2Authorization) -> String {
        config.format_token(&self.settings.mask)
    }
}

#[async_trait]
impl AuthorizationStrategy for OAuth2Strategy {
    fn scheme(&self) -> Scheme {
        Scheme::OAuth2
    }

    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let mut config = request.unsafe_config.clone();
        ensure_scheme(&config, Scheme::OAuth2)?;
        self.codec.reveal_all(config.secret_fields_mut()).await?;
        let oauth2 = oauth2_config(&config)?;

        if oauth2.grant_type == GrantType::AuthorizationCode {
            let Some(token) = oauth2.token.as_deref().filter(|t| !t.is_empty()) else {
                tracing::debug!(
                    project_id = %request.project_id,
                    "authorization code not exchanged yet, nothing to attach"
                );
                return Ok(None);
            };
            return Ok(Some(AuthorizationStrategyResponse::header(
                oauth2.format_token(token),
                self.masked(oauth2),
            )));
        }

        let form = self.token_form(oauth2)?;
        tracing::debug!(
            project_id = %request.project_id,
            grant_type = oauth2.grant_type.wire_name(),
            "requesting oauth2 token"
        );
        let token = self
            .token_client
            .post_form(&request.project_id, &oauth2.url, &form)
            .await?;

        Ok(Some(AuthorizationStrategyResponse::header(
            oauth2.format_token(&token.access_token),
            self.masked(oauth2),
        )))
    }

    async fn decrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::OAuth2)?;
        self.codec.decrypt_all(config.secret_fields_mut()).await
    }

    async fn encrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::OAuth2)?;
        self.codec.encrypt_all(config.secret_fields_mut()).await
    }

    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        let grant_type = match flat_value(map, &["grantType"]) {
            Some(value) => value.parse()?,
            None => GrantType::PasswordCredentials,
        };
        let text = |keys: &[&str]| flat_value(map, keys).map(str::to_string);
        let secret = |keys: &[&str]| self.codec.wrap_pending(flat_value(map, keys).unwrap_or_default());

        let config = OAuth2Authorization {
            grant_type,
            username: text(&["username"]),
            password: secret(&["password"]),
            client_id: text(&["clientId"]).unwrap_or_default(),
            client_secret: secret(&["clientSecret"]),
            url: text(&["url", "accessTokenUrl"]).unwrap_or_default(),
            header_prefix: text(&["headerPrefix"]),
            token: text(&["token", "accessToken"]),
            scope: text(&["scope"]),
        };
        Ok(Some(config.into()))
    }

    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        let oauth2 = oauth2_config(config)?;
        if oauth2.grant_type.uses_token_endpoint() {
            return Ok(Some(Header::authorization(
                self.settings.computed_placeholder.clone(),
            )));
        }
        Ok(oauth2
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|token| Header::authorization(oauth2.format_token(token))))
    }

    fn name(&self) -> &'static str {
        "oauth2"
    }
}
