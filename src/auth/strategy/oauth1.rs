//! OAuth 1.0a request signing strategy.
//!
//! Parameters are kept in a `BTreeMap`, so the signature base string always lists keys in
//! ascending order regardless of how they were inserted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use super::AuthorizationStrategy;
use super::traits::{ensure_scheme, flat_value};
use crate::auth::clock::{Clock, NonceGenerator};
use crate::auth::codec::{MarkerCodec, revealed};
use crate::auth::{
    AddDataType, AuthorizationConfig, AuthorizationSettings, AuthorizationStrategyRequest,
    AuthorizationStrategyResponse, Header, OAuth1Authorization, Param, Scheme, SignatureMethod,
};
use crate::{Error, Result};

pub const OAUTH_VERSION: &str = "1.0";

pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
pub const OAUTH_NONCE: &str = "oauth_nonce";
pub const OAUTH_SIGNATURE: &str = "oauth_signature";
pub const OAUTH_SIGNATURE_METHOD: &str = "oauth_signature_method";
pub const OAUTH_TIMESTAMP: &str = "oauth_timestamp";
pub const OAUTH_TOKEN: &str = "oauth_token";
pub const OAUTH_VERSION_KEY: &str = "oauth_version";

/// RFC 3986 percent-encoding: everything but `A-Z a-z 0-9 - . _ ~`.
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// `METHOD&enc(url)&enc(k1=v1&k2=v2...)` with keys in ascending order.
pub fn signature_base_string(
    http_method: &str,
    url: &str,
    params: &BTreeMap<String, String>,
) -> String {
    let normalized = params
        .iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        http_method.trim().to_ascii_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

pub fn signing_key(consumer_secret: &str, token_secret: &str) -> String {
    format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    )
}

fn hmac_base64<M: Mac + KeyInit>(key: &str, base_string: &str) -> Result<String> {
    let mut mac = <M as KeyInit>::new_from_slice(key.as_bytes()).map_err(|e| {
        tracing::error!(error = %e, "invalid signing key");
        Error::AuthResolution {
            field: OAUTH_SIGNATURE.to_string(),
            message: e.to_string(),
        }
    })?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Signs `base_string` with the algorithm `method` maps to.
pub fn sign(method: SignatureMethod, key: &str, base_string: &str) -> Result<String> {
    match method {
        SignatureMethod::HmacSha1 => hmac_base64::<Hmac<Sha1>>(key, base_string),
        SignatureMethod::HmacSha256 => hmac_base64::<Hmac<Sha256>>(key, base_string),
        SignatureMethod::HmacSha512 => hmac_base64::<Hmac<Sha512>>(key, base_string),
        SignatureMethod::Plaintext => Ok(key.to_string()),
    }
}

fn header_value(params: &BTreeMap<String, String>) -> String {
    let pairs = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join(", ");
    format!("OAuth {}", pairs)
}

/// Signs requests with consumer credentials and an optional access token.
#[derive(Debug, Clone)]
pub struct OAuth1Strategy {
    codec: MarkerCodec,
    settings: Arc<AuthorizationSettings>,
    clock: Arc<dyn Clock>,
    nonce: Arc<dyn NonceGenerator>,
}

impl OAuth1Strategy {
    pub fn new(
        codec: MarkerCodec,
        settings: Arc<AuthorizationSettings>,
        clock: Arc<dyn Clock>,
        nonce: Arc<dyn NonceGenerator>,
    ) -> Self {
        Self {
            codec,
            settings,
            clock,
            nonce,
        }
    }

    /// The full signed parameter set for one request.
    pub fn signed_params(
        &self,
        config: &OAuth1Authorization,
        http_method: &str,
        url: &str,
    ) -> Result<BTreeMap<String, String>> {
        let consumer_secret = revealed("consumerSecret", &config.consumer_secret)?;
        let now = self.clock.now();

        let mut params = BTreeMap::new();
        params.insert(OAUTH_CONSUMER_KEY.to_string(), config.consumer_key.clone());
        params.insert(OAUTH_NONCE.to_string(), self.nonce.nonce(now));
        params.insert(
            OAUTH_SIGNATURE_METHOD.to_string(),
            config.signature_method.as_str().to_string(),
        );
        params.insert(OAUTH_TIMESTAMP.to_string(), now.timestamp().to_string());
        params.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());

        let token_secret = if config.has_token() {
            let token = revealed("accessToken", &config.access_token)?;
            params.insert(OAUTH_TOKEN.to_string(), token.to_string());
            revealed("tokenSecret", &config.token_secret)?
        } else {
            ""
        };

        let base_string = signature_base_string(http_method, url, &params);
        let key = signing_key(consumer_secret, token_secret);
        let signature = sign(config.signature_method, &key, &base_string)?;
        params.insert(OAUTH_SIGNATURE.to_string(), signature);

        Ok(params)
    }

    fn masked_params(&self, params: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        params
            .iter()
            .map(|(k, v)| {
                let value = if k == OAUTH_SIGNATURE || k == OAUTH_TOKEN {
                    self.settings.mask.clone()
                } else {
                    v.clone()
                };
                (k.clone(), value)
            })
            .collect()
    }
}

fn oauth1_config(config: &AuthorizationConfig) -> Result<&OAuth1Authorization> {
    config
        .as_oauth1()
        .ok_or_else(|| Error::scheme_mismatch(Scheme::OAuth1, config.scheme()))
}

fn parse_add_data_type(map: &HashMap<String, String>) -> Result<AddDataType> {
    if let Some(value) = flat_value(map, &["addDataType"]) {
        return value.parse();
    }
    match flat_value(map, &["addParamsToHeader"]) {
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(AddDataType::Url),
        _ => Ok(AddDataType::Header),
    }
}

#[async_trait]
impl AuthorizationStrategy for OAuth1Strategy {
    fn scheme(&self) -> Scheme {
        Scheme::OAuth1
    }

    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let mut config = request.unsafe_config.clone();
        ensure_scheme(&config, Scheme::OAuth1)?;
        self.codec.reveal_all(config.secret_fields_mut()).await?;
        let oauth1 = oauth1_config(&config)?;

        let context = &request.resolving_context;
        let url = oauth1
            .url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(context.url.as_str());
        let http_method = oauth1
            .http_method
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(context.http_method.as_str());

        let params = self.signed_params(oauth1, http_method, url)?;

        Ok(Some(match oauth1.add_data_type {
            AddDataType::Header => AuthorizationStrategyResponse::header(
                header_value(&params),
                header_value(&self.masked_params(&params)),
            ),
            AddDataType::Url => AuthorizationStrategyResponse::params(params),
        }))
    }

    async fn decrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::OAuth1)?;
        self.codec.decrypt_all(config.secret_fields_mut()).await
    }

    async fn encrypt_fields(&self, config: &mut AuthorizationConfig) -> Result<()> {
        ensure_scheme(config, Scheme::OAuth1)?;
        self.codec.encrypt_all(config.secret_fields_mut()).await
    }

    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        let signature_method = match flat_value(map, &["signatureMethod"]) {
            Some(method) => method.parse()?,
            None => SignatureMethod::default(),
        };
        let secret = |keys: &[&str]| self.codec.wrap_pending(flat_value(map, keys).unwrap_or_default());

        let config = OAuth1Authorization {
            consumer_key: flat_value(map, &["consumerKey"]).unwrap_or_default().to_string(),
            consumer_secret: secret(&["consumerSecret"]),
            access_token: secret(&["accessToken", "token"]),
            token_secret: secret(&["tokenSecret"]),
            signature_method,
            add_data_type: parse_add_data_type(map)?,
            url: flat_value(map, &["url"]).map(str::to_string),
            http_method: flat_value(map, &["httpMethod"]).map(str::to_string),
        };
        Ok(Some(config.into()))
    }

    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        let oauth1 = oauth1_config(config)?;
        Ok(match oauth1.add_data_type {
            AddDataType::Header => Some(Header::authorization(
                self.settings.computed_placeholder.clone(),
            )),
            AddDataType::Url => None,
        })
    }

    async fn render_display_params(&self, config: &AuthorizationConfig) -> Result<Vec<Param>> {
        let oauth1 = oauth1_config(config)?;
        if oauth1.add_data_type != AddDataType::Url {
            return Ok(Vec::new());
        }

        let mut names = vec![
            OAUTH_CONSUMER_KEY,
            OAUTH_NONCE,
            OAUTH_SIGNATURE,
            OAUTH_SIGNATURE_METHOD,
            OAUTH_TIMESTAMP,
            OAUTH_VERSION_KEY,
        ];
        if oauth1.has_token() {
            names.push(OAUTH_TOKEN);
        }
        names.sort_unstable();

        Ok(names
            .into_iter()
            .map(|name| Param::new(name, self.settings.mask.clone()))
            .collect())
    }

    fn name(&self) -> &'static str {
        "oauth1"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::{FixedClock, FixedNonce};
    use crate::auth::codec::test_support::ReversingCrypto;
    use crate::auth::{ResolvingContext, SecretValue};

    const URL: &str = "https://api.example.com/photos";

    fn strategy() -> OAuth1Strategy {
        OAuth1Strategy::new(
            MarkerCodec::new(Arc::new(ReversingCrypto::default())),
            Arc::new(AuthorizationSettings::default()),
            Arc::new(FixedClock::from_timestamp(1_700_000_000)),
            Arc::new(FixedNonce::new("abc")),
        )
    }

    fn request(config: OAuth1Authorization, method: &str) -> AuthorizationStrategyRequest {
        AuthorizationStrategyRequest::for_config(
            config.into(),
            ResolvingContext::new(URL, method),
            "p1",
        )
    }

    #[test]
    fn test_reference_hmac_vectors() {
        let data = "The quick brown fox jumps over the lazy dog";
        assert_eq!(
            sign(SignatureMethod::HmacSha1, "key", data).unwrap(),
            "3nybhbi3iqa8ino29wqQcBydtNk="
        );
        assert_eq!(
            sign(SignatureMethod::HmacSha256, "key", data).unwrap(),
            "97yD9DBThCSxMpjmqm+xQ+9NWaFJRhdZl0edvC0aPNg="
        );
        assert_eq!(
            sign(SignatureMethod::HmacSha512, "key", data).unwrap(),
            "tCrwkFe6weLUFwjkipAuCbX/fxKrQopP6GZTxz3SSPuC+UilSfe3kaW0GRXuTR7Dk1NX5OIxclDQNyr6Lr7rOg=="
        );
        assert_eq!(sign(SignatureMethod::Plaintext, "a&b", data).unwrap(), "a&b");
    }

    #[test]
    fn test_base_string_orders_keys() {
        let mut params = BTreeMap::new();
        params.insert("oauth_version".to_string(), "1.0".to_string());
        params.insert("oauth_consumer_key".to_string(), "ck".to_string());
        params.insert("oauth_timestamp".to_string(), "1700000000".to_string());
        params.insert("oauth_nonce".to_string(), "abc".to_string());
        params.insert("oauth_signature_method".to_string(), "HMAC-SHA1".to_string());

        assert_eq!(
            signature_base_string("get", URL, &params),
            "GET&https%3A%2F%2Fapi.example.com%2Fphotos&oauth_consumer_key%3Dck%26oauth_nonce%3Dabc%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1700000000%26oauth_version%3D1.0"
        );
    }

    #[test]
    fn test_percent_encoding_is_rfc3986() {
        assert_eq!(percent_encode("a b+c/~-._"), "a%20b%2Bc%2F~-._");
        assert_eq!(signing_key("c s", ""), "c%20s&");
    }

    #[tokio::test]
    async fn test_deterministic_signature_without_token() {
        let config = OAuth1Authorization::new("ck", SecretValue::plain("cs"));
        let response = strategy()
            .resolve_auth_value(&request(config.with_add_data_type(AddDataType::Url), "GET"))
            .await
            .unwrap()
            .unwrap();
        let params = response.query_params().unwrap();

        let reference_base = "GET&https%3A%2F%2Fapi.example.com%2Fphotos&oauth_consumer_key%3Dck%26oauth_nonce%3Dabc%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D1700000000%26oauth_version%3D1.0";
        let mut mac = <Hmac<Sha1> as KeyInit>::new_from_slice(b"cs&").unwrap();
        Mac::update(&mut mac, reference_base.as_bytes());
        let reference = STANDARD.encode(mac.finalize().into_bytes());

        assert_eq!(params[OAUTH_SIGNATURE], reference);
        assert_eq!(params[OAUTH_SIGNATURE], "mbXwXaxGMseAovC6OMv3wVNtxiw=");
        assert_eq!(params[OAUTH_NONCE], "abc");
        assert_eq!(params[OAUTH_TIMESTAMP], "1700000000");
        assert!(!params.contains_key(OAUTH_TOKEN));
    }

    #[tokio::test]
    async fn test_header_mode_with_token() {
        let config = OAuth1Authorization::new("ck", SecretValue::pending("YyBz"))
            .with_access_token(
                SecretValue::ciphertext(ReversingCrypto::seal("tok")),
                SecretValue::plain("t+s"),
            );
        let response = strategy()
            .resolve_auth_value(&request(config, "post"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            response.header_value(),
            Some(
                "OAuth oauth_consumer_key=\"ck\", oauth_nonce=\"abc\", \
                 oauth_signature=\"Hok4uVx9cGauZiQQ2mNrmrgtUnY%3D\", \
                 oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1700000000\", \
                 oauth_token=\"tok\", oauth_version=\"1.0\""
            )
        );
        let masked = response.masked_value().unwrap();
        assert!(masked.contains("oauth_signature=\"%2A%2A%2A%2A%2A%2A\""));
        assert!(!masked.contains("tok\""));
    }

    #[tokio::test]
    async fn test_config_url_overrides_context() {
        let config = OAuth1Authorization::new("ck", SecretValue::plain("cs"))
            .with_url(URL)
            .with_http_method("GET")
            .with_add_data_type(AddDataType::Url);
        let req = AuthorizationStrategyRequest::for_config(
            config.into(),
            ResolvingContext::new("https://other.example.com", "DELETE"),
            "p1",
        );
        let response = strategy().resolve_auth_value(&req).await.unwrap().unwrap();
        assert_eq!(
            response.query_params().unwrap()[OAUTH_SIGNATURE],
            "mbXwXaxGMseAovC6OMv3wVNtxiw="
        );
    }

    #[tokio::test]
    async fn test_blank_stored_url_and_method_fall_back_to_request() {
        let config: AuthorizationConfig = serde_json::from_str(
            r#"{"type":"OAUTH1","consumerKey":"ck","consumerSecret":"cs","addDataType":"URL","url":"","httpMethod":" "}"#,
        )
        .unwrap();
        let req = AuthorizationStrategyRequest::for_config(
            config,
            ResolvingContext::new(URL, "GET"),
            "p1",
        );
        let response = strategy().resolve_auth_value(&req).await.unwrap().unwrap();
        assert_eq!(
            response.query_params().unwrap()[OAUTH_SIGNATURE],
            "mbXwXaxGMseAovC6OMv3wVNtxiw="
        );
    }

    #[tokio::test]
    async fn test_hmac_sha512_with_timestamp_nonce() {
        let strategy = OAuth1Strategy::new(
            MarkerCodec::new(Arc::new(ReversingCrypto::default())),
            Arc::new(AuthorizationSettings::default()),
            Arc::new(FixedClock::from_timestamp(1_700_000_000)),
            Arc::new(crate::auth::clock::TimestampNonce),
        );
        let config = OAuth1Authorization::new("ck", SecretValue::plain("cs"))
            .with_add_data_type(AddDataType::Url);
        let response = strategy
            .resolve_auth_value(&request(config.clone(), "GET"))
            .await
            .unwrap()
            .unwrap();
        let params = response.query_params().unwrap();
        assert_eq!(params[OAUTH_NONCE], "1700000000000");
        assert_eq!(params[OAUTH_SIGNATURE], "69YFmwvk1R5jVORN4A6+QQTjdRk=");

        let sha512 = config.with_signature_method(SignatureMethod::HmacSha512);
        let response = self::strategy()
            .resolve_auth_value(&request(sha512, "GET"))
            .await
            .unwrap()
            .unwrap();
        let params = response.query_params().unwrap();
        assert_eq!(params[OAUTH_SIGNATURE_METHOD], "HMAC-SHA512");
        assert_eq!(
            params[OAUTH_SIGNATURE],
            "Tjbuc26aTAqeFI2gP3ARPJK+/Ejnw7HTXdyVD22MiLtOK+DZfhyZrGRQxfwbY4G3w166WLUFV+Awo9qij5SQvA=="
        );
    }

    #[tokio::test]
    async fn test_display_params_in_url_mode() {
        let strategy = strategy();
        let config: AuthorizationConfig = OAuth1Authorization::new("ck", SecretValue::ciphertext("x"))
            .with_add_data_type(AddDataType::Url)
            .into();

        let params = strategy.render_display_params(&config).await.unwrap();
        let names: Vec<_> = params.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(
            names,
            [
                OAUTH_CONSUMER_KEY,
                OAUTH_NONCE,
                OAUTH_SIGNATURE,
                OAUTH_SIGNATURE_METHOD,
                OAUTH_TIMESTAMP,
                OAUTH_VERSION_KEY
            ]
        );
        assert!(params.iter().all(|p| p.value == "******"));
        assert!(strategy.render_display_header(&config).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_display_params_include_token_when_configured() {
        let config: AuthorizationConfig = OAuth1Authorization::new("ck", SecretValue::ciphertext("x"))
            .with_access_token(SecretValue::ciphertext("t"), SecretValue::ciphertext("s"))
            .with_add_data_type(AddDataType::Url)
            .into();
        let params = strategy().render_display_params(&config).await.unwrap();
        assert!(params.iter().any(|p| p.key == OAUTH_TOKEN));
    }

    #[tokio::test]
    async fn test_header_mode_has_no_display_params() {
        let config: AuthorizationConfig =
            OAuth1Authorization::new("ck", SecretValue::ciphertext("x")).into();
        let strategy = strategy();
        assert!(strategy.render_display_params(&config).await.unwrap().is_empty());
        let header = strategy.render_display_header(&config).await.unwrap().unwrap();
        assert_eq!(header.value, "<calculated at request time>");
    }

    #[tokio::test]
    async fn test_encrypt_fields_covers_all_secrets() {
        let strategy = strategy();
        let codec = MarkerCodec::new(Arc::new(ReversingCrypto::default()));
        let mut config: AuthorizationConfig = OAuth1Authorization::new("ck", codec.wrap_pending("cs"))
            .with_access_token(codec.wrap_pending("tok"), codec.wrap_pending("ts"))
            .into();

        strategy.encrypt_fields(&mut config).await.unwrap();
        let oauth1 = config.as_oauth1().unwrap();
        assert!(oauth1.consumer_secret.is_ciphertext());
        assert!(oauth1.access_token.is_ciphertext());
        assert!(oauth1.token_secret.is_ciphertext());
    }

    #[test]
    fn test_parse_from_flat_map() {
        let map = HashMap::from([
            ("consumerKey".to_string(), "ck".to_string()),
            ("consumerSecret".to_string(), "cs".to_string()),
            ("token".to_string(), "tok".to_string()),
            ("tokenSecret".to_string(), "ts".to_string()),
            ("signatureMethod".to_string(), "HMAC-SHA256".to_string()),
            ("addParamsToHeader".to_string(), "false".to_string()),
        ]);
        let config = strategy().parse_from_flat_map(&map).unwrap().unwrap();
        let oauth1 = config.as_oauth1().unwrap();
        assert_eq!(oauth1.consumer_key, "ck");
        assert!(oauth1.consumer_secret.is_pending());
        assert!(oauth1.access_token.is_pending());
        assert_eq!(oauth1.signature_method, SignatureMethod::HmacSha256);
        assert_eq!(oauth1.add_data_type, AddDataType::Url);
    }

    #[test]
    fn test_parse_rejects_unknown_signature_method() {
        let map = HashMap::from([("signatureMethod".to_string(), "RSA-SHA1".to_string())]);
        let err = strategy().parse_from_flat_map(&map).unwrap_err();
        assert!(matches!(err, Error::UnsupportedValue { .. }));
    }
}
