//! Authorization configuration model.
//!
//! [`AuthorizationConfig`] is both the at-rest shape (secret fields marked) and the working
//! copy a strategy resolves in memory (secret fields plain). Which one a value is depends only
//! on the state of its [`SecretValue`] fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::scheme::Scheme;
use super::secret::{SecretField, SecretValue};
use crate::services::{TemplateEvaluator, VariableContext};
use crate::{Error, Result};

/// Authorization settings attached to a request or folder, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthorizationConfig {
    #[serde(rename = "BASIC")]
    Basic(BasicAuthorization),
    #[serde(rename = "BEARER")]
    Bearer(BearerAuthorization),
    #[serde(rename = "OAUTH1")]
    OAuth1(OAuth1Authorization),
    #[serde(rename = "OAUTH2")]
    OAuth2(OAuth2Authorization),
    #[serde(rename = "INHERIT_FROM_PARENT")]
    InheritFromParent(InheritFromParentAuthorization),
}

impl AuthorizationConfig {
    /// Parses a stored configuration.
    ///
    /// Well-formed JSON carrying an unknown scheme, grant type or other enum value is a
    /// configuration error; malformed JSON stays [`Error::Json`].
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            if e.is_data() {
                Error::Configuration(format!("invalid stored authorization: {}", e))
            } else {
                Error::Json(e)
            }
        })
    }

    pub fn scheme(&self) -> Scheme {
        match self {
            Self::Basic(_) => Scheme::Basic,
            Self::Bearer(_) => Scheme::Bearer,
            Self::OAuth1(_) => Scheme::OAuth1,
            Self::OAuth2(_) => Scheme::OAuth2,
            Self::InheritFromParent(_) => Scheme::InheritFromParent,
        }
    }

    /// Every secret-bearing field of this configuration, named.
    pub fn secret_fields_mut(&mut self) -> Vec<SecretField<'_>> {
        match self {
            Self::Basic(c) => vec![SecretField::new("password", &mut c.password)],
            Self::OAuth1(c) => vec![
                SecretField::new("consumerSecret", &mut c.consumer_secret),
                SecretField::new("accessToken", &mut c.access_token),
                SecretField::new("tokenSecret", &mut c.token_secret),
            ],
            Self::OAuth2(c) => vec![
                SecretField::new("password", &mut c.password),
                SecretField::new("clientSecret", &mut c.client_secret),
            ],
            Self::Bearer(_) | Self::InheritFromParent(_) => Vec::new(),
        }
    }

    /// Runs `evaluator` over every non-secret string field.
    pub fn evaluate_templates(
        &mut self,
        evaluator: &dyn TemplateEvaluator,
        variables: &VariableContext,
    ) -> Result<()> {
        let eval = |value: &mut String| -> Result<()> {
            *value = evaluator.evaluate(value, variables)?;
            Ok(())
        };
        let eval_opt = |value: &mut Option<String>| -> Result<()> {
            if let Some(v) = value.as_mut() {
                *v = evaluator.evaluate(v, variables)?;
            }
            Ok(())
        };

        match self {
            Self::Basic(c) => eval(&mut c.username)?,
            Self::Bearer(c) => eval_opt(&mut c.token)?,
            Self::OAuth1(c) => {
                eval(&mut c.consumer_key)?;
                eval_opt(&mut c.url)?;
                eval_opt(&mut c.http_method)?;
            }
            Self::OAuth2(c) => {
                eval(&mut c.client_id)?;
                eval(&mut c.url)?;
                eval_opt(&mut c.username)?;
                eval_opt(&mut c.header_prefix)?;
                eval_opt(&mut c.token)?;
                eval_opt(&mut c.scope)?;
            }
            Self::InheritFromParent(_) => {}
        }
        Ok(())
    }

    pub fn as_basic(&self) -> Option<&BasicAuthorization> {
        match self {
            Self::Basic(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_bearer(&self) -> Option<&BearerAuthorization> {
        match self {
            Self::Bearer(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_oauth1(&self) -> Option<&OAuth1Authorization> {
        match self {
            Self::OAuth1(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_oauth2(&self) -> Option<&OAuth2Authorization> {
        match self {
            Self::OAuth2(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_inherit_from_parent(&self) -> Option<&InheritFromParentAuthorization> {
        match self {
            Self::InheritFromParent(c) => Some(c),
            _ => None,
        }
    }
}

impl From<BasicAuthorization> for AuthorizationConfig {
    fn from(c: BasicAuthorization) -> Self {
        Self::Basic(c)
    }
}

impl From<BearerAuthorization> for AuthorizationConfig {
    fn from(c: BearerAuthorization) -> Self {
        Self::Bearer(c)
    }
}

impl From<OAuth1Authorization> for AuthorizationConfig {
    fn from(c: OAuth1Authorization) -> Self {
        Self::OAuth1(c)
    }
}

impl From<OAuth2Authorization> for AuthorizationConfig {
    fn from(c: OAuth2Authorization) -> Self {
        Self::OAuth2(c)
    }
}

impl From<InheritFromParentAuthorization> for AuthorizationConfig {
    fn from(c: InheritFromParentAuthorization) -> Self {
        Self::InheritFromParent(c)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicAuthorization {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: SecretValue,
}

impl BasicAuthorization {
    pub fn new(username: impl Into<String>, password: SecretValue) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BearerAuthorization {
    #[serde(default)]
    pub token: Option<String>,
}

impl BearerAuthorization {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }
}

/// OAuth1 signature algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SignatureMethod {
    #[default]
    #[serde(rename = "HMAC-SHA1")]
    HmacSha1,
    #[serde(rename = "HMAC-SHA256")]
    HmacSha256,
    #[serde(rename = "HMAC-SHA512")]
    HmacSha512,
    #[serde(rename = "PLAINTEXT")]
    Plaintext,
}

impl SignatureMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HmacSha1 => "HMAC-SHA1",
            Self::HmacSha256 => "HMAC-SHA256",
            Self::HmacSha512 => "HMAC-SHA512",
            Self::Plaintext => "PLAINTEXT",
        }
    }
}

impl fmt::Display for SignatureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HMAC-SHA1" => Ok(Self::HmacSha1),
            "HMAC-SHA256" => Ok(Self::HmacSha256),
            "HMAC-SHA512" => Ok(Self::HmacSha512),
            "PLAINTEXT" => Ok(Self::Plaintext),
            _ => Err(Error::unsupported("signature method", s)),
        }
    }
}

impl TryFrom<String> for SignatureMethod {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Where OAuth1 output is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum AddDataType {
    #[default]
    #[serde(rename = "HEADER")]
    Header,
    #[serde(rename = "URL")]
    Url,
}

impl FromStr for AddDataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HEADER" | "REQUEST_HEADERS" => Ok(Self::Header),
            "URL" | "REQUEST_URL" => Ok(Self::Url),
            _ => Err(Error::unsupported("add data type", s)),
        }
    }
}

impl TryFrom<String> for AddDataType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth1Authorization {
    #[serde(default)]
    pub consumer_key: String,
    #[serde(default)]
    pub consumer_secret: SecretValue,
    #[serde(default)]
    pub access_token: SecretValue,
    #[serde(default)]
    pub token_secret: SecretValue,
    #[serde(default)]
    pub signature_method: SignatureMethod,
    #[serde(default)]
    pub add_data_type: AddDataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
}

impl OAuth1Authorization {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: SecretValue) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret,
            ..Default::default()
        }
    }

    pub fn with_access_token(mut self, access_token: SecretValue, token_secret: SecretValue) -> Self {
        self.access_token = access_token;
        self.token_secret = token_secret;
        self
    }

    pub fn with_signature_method(mut self, method: SignatureMethod) -> Self {
        self.signature_method = method;
        self
    }

    pub fn with_add_data_type(mut self, add_data_type: AddDataType) -> Self {
        self.add_data_type = add_data_type;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_http_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    /// Whether `oauth_token` participates in the signature.
    pub fn has_token(&self) -> bool {
        !self.access_token.is_empty() && !self.token_secret.is_empty()
    }
}

/// OAuth2 flow selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
pub enum GrantType {
    ClientCredentials,
    #[default]
    PasswordCredentials,
    AuthorizationCode,
}

impl GrantType {
    /// The `grant_type` form value sent to the token endpoint.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::PasswordCredentials => "password",
            Self::AuthorizationCode => "authorization_code",
        }
    }

    /// Whether the flow calls the token endpoint at resolution time.
    pub fn uses_token_endpoint(&self) -> bool {
        !matches!(self, Self::AuthorizationCode)
    }
}

impl FromStr for GrantType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client_credentials" => Ok(Self::ClientCredentials),
            "password" | "password_credentials" => Ok(Self::PasswordCredentials),
            "authorization_code" => Ok(Self::AuthorizationCode),
            _ => Err(Error::IllegalGrantType(s.to_string())),
        }
    }
}

impl TryFrom<String> for GrantType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Authorization {
    #[serde(default)]
    pub grant_type: GrantType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: SecretValue,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: SecretValue,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl OAuth2Authorization {
    pub fn client_credentials(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: SecretValue,
    ) -> Self {
        Self {
            grant_type: GrantType::ClientCredentials,
            url: url.into(),
            client_id: client_id.into(),
            client_secret,
            ..Default::default()
        }
    }

    pub fn password(
        url: impl Into<String>,
        client_id: impl Into<String>,
        username: impl Into<String>,
        password: SecretValue,
    ) -> Self {
        Self {
            grant_type: GrantType::PasswordCredentials,
            url: url.into(),
            client_id: client_id.into(),
            username: Some(username.into()),
            password,
            ..Default::default()
        }
    }

    pub fn authorization_code(url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            grant_type: GrantType::AuthorizationCode,
            url: url.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_header_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.header_prefix = Some(prefix.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// `prefix + " " + token` when a non-empty prefix is configured, else the bare token.
    pub fn format_token(&self, token: &str) -> String {
        match self.header_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => format!("{} {}", prefix, token),
            _ => token.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritFromParentAuthorization {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_folder_id: Option<String>,
}

impl InheritFromParentAuthorization {
    pub fn new(folder_id: impl Into<String>) -> Self {
        Self {
            authorization_folder_id: Some(folder_id.into()),
        }
    }
}
