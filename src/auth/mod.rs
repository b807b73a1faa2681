//! Request authorization engine.
//!
//! Computes the authentication material for an outbound request:
//! - **Basic**: `Authorization: Basic base64(username:password)`
//! - **Bearer**: a static token
//! - **OAuth1**: HMAC or plaintext signatures, as a header or as query parameters
//! - **OAuth2**: client-credentials and password grants against a token endpoint, or a
//!   stored authorization-code token
//! - **InheritFromParent**: delegates to the authorization of a referenced folder
//!
//! Stored secrets stay encrypted; they are revealed only on a per-call working copy.

mod clock;
mod codec;
mod config;
mod manager;
mod registry;
mod request;
mod scheme;
mod secret;
mod settings;
mod strategy;

pub use clock::{Clock, FixedClock, FixedNonce, NonceGenerator, RandomNonce, SystemClock, TimestampNonce};
pub use codec::MarkerCodec;
pub use config::{
    AddDataType, AuthorizationConfig, BasicAuthorization, BearerAuthorization, GrantType,
    InheritFromParentAuthorization, OAuth1Authorization, OAuth2Authorization, SignatureMethod,
};
pub use manager::AuthorizationManager;
pub use registry::{StrategyLookup, StrategyRegistry, StrategyRegistryBuilder};
pub use request::{
    AUTHORIZATION_HEADER, AuthorizationStrategyRequest, AuthorizationStrategyResponse, Header,
    Param, ResolvingContext,
};
pub use scheme::Scheme;
pub use secret::{SecretField, SecretState, SecretValue};
pub use settings::{
    AuthorizationSettings, AuthorizationSettingsBuilder, DEFAULT_COMPUTED_PLACEHOLDER,
    DEFAULT_MASK, DEFAULT_MAX_INHERITANCE_DEPTH,
};
pub use strategy::{
    AuthorizationStrategy, BasicStrategy, BearerStrategy, InheritFromParentStrategy,
    OAuth1Strategy, OAuth2Strategy, percent_encode, sign, signature_base_string, signing_key,
};
