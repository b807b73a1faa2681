//! OAuth2 token endpoint collaborator.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_TOKEN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("request-auth/", env!("CARGO_PKG_VERSION"));

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Successful token endpoint response.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("Bearer".to_string()),
            expires_in: None,
            refresh_token: None,
            scope: None,
        }
    }
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// Posts form-encoded credentials to a token endpoint.
///
/// Implementations fail on any non-success HTTP status. No retry happens at this layer.
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    async fn post_form(
        &self,
        project_id: &str,
        url: &str,
        form: &[(String, String)],
    ) -> Result<TokenResponse>;
}

/// Transport settings for [`HttpTokenClient`].
#[derive(Debug, Clone)]
pub struct TokenClientConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TokenClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TOKEN_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl TokenClientConfig {
    /// Defaults with `REQUEST_AUTH_TOKEN_TIMEOUT_SECS` and `REQUEST_AUTH_USER_AGENT` applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = std::env::var("REQUEST_AUTH_TOKEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(ua) = std::env::var("REQUEST_AUTH_USER_AGENT") {
            config.user_agent = ua;
        }

        config
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// `reqwest`-backed token endpoint client.
#[derive(Debug, Clone)]
pub struct HttpTokenClient {
    http: reqwest::Client,
}

impl HttpTokenClient {
    pub fn new() -> Result<Self> {
        Self::with_config(TokenClientConfig::from_env())
    }

    pub fn with_config(config: TokenClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;
        Ok(Self { http })
    }

    pub fn with_http(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn encode_form(form: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}

#[async_trait]
impl TokenEndpointClient for HttpTokenClient {
    async fn post_form(
        &self,
        project_id: &str,
        url: &str,
        form: &[(String, String)],
    ) -> Result<TokenResponse> {
        tracing::debug!(project_id, url, "requesting oauth2 access token");

        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .header(ACCEPT, "application/json")
            .body(encode_form(form))
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).trim().to_string();
            tracing::warn!(project_id, url, status = status.as_u16(), "token endpoint rejected request");
            return Err(Error::TokenEndpoint {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_encode_form_escapes_values() {
        let body = encode_form(&form(&[("client_id", "my app"), ("client_secret", "a&b=c")]));
        assert_eq!(body, "client_id=my+app&client_secret=a%26b%3Dc");
    }

    #[test]
    fn test_debug_redacts_token() {
        let debug = format!("{:?}", TokenResponse::bearer("tok-123"));
        assert!(!debug.contains("tok-123"));
    }

    #[test]
    fn test_config_builder() {
        let config = TokenClientConfig::default()
            .timeout(Duration::from_secs(5))
            .user_agent("custom/1.0");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "custom/1.0");
    }

    #[tokio::test]
    async fn test_post_form_parses_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", FORM_CONTENT_TYPE))
            .and(body_string("grant_type=client_credentials&client_id=cid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpTokenClient::with_config(TokenClientConfig::default()).unwrap();
        let token = client
            .post_form(
                "p1",
                &format!("{}/token", server.uri()),
                &form(&[("grant_type", "client_credentials"), ("client_id", "cid")]),
            )
            .await
            .unwrap();

        assert_eq!(token.access_token, "tok-1");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid_client"))
            .mount(&server)
            .await;

        let client = HttpTokenClient::with_config(TokenClientConfig::default()).unwrap();
        let err = client
            .post_form("p1", &format!("{}/token", server.uri()), &[])
            .await
            .unwrap_err();

        match err {
            Error::TokenEndpoint { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "invalid_client");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
