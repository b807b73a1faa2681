//! # request-auth
//!
//! Request authorization engine for API-testing backends.
//!
//! Computes the header value or query parameters to attach to an outbound request for Basic,
//! Bearer, OAuth1, OAuth2 and folder-inherited authorization, while keeping stored
//! credentials encrypted and only revealing them on a per-call working copy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use request_auth::auth::{
//!     AuthorizationManager, AuthorizationStrategyRequest, BasicAuthorization, ResolvingContext,
//!     SecretValue, StrategyRegistry,
//! };
//! use request_auth::services::{CryptoError, CryptoService, MemoryFolderStore};
//!
//! struct Vault;
//!
//! #[async_trait]
//! impl CryptoService for Vault {
//!     async fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
//!         Ok(plaintext.chars().rev().collect())
//!     }
//!
//!     async fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
//!         Ok(ciphertext.chars().rev().collect())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), request_auth::Error> {
//!     let crypto: Arc<dyn CryptoService> = Arc::new(Vault);
//!     let registry = StrategyRegistry::builder()
//!         .crypto(crypto)
//!         .folders(Arc::new(MemoryFolderStore::new()))
//!         .build()?;
//!     let manager = AuthorizationManager::new(registry)?;
//!
//!     let config = BasicAuthorization::new("alice", SecretValue::ciphertext("terces")).into();
//!     let request = AuthorizationStrategyRequest::for_config(
//!         config,
//!         ResolvingContext::new("https://api.example.com/users", "GET"),
//!         "project-1",
//!     );
//!
//!     if let Some(response) = manager.resolve(&request).await? {
//!         println!("{:?}", response.masked_value());
//!     }
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod auth;
pub mod services;

// Re-exports for convenience
pub use auth::{
    AuthorizationConfig, AuthorizationManager, AuthorizationSettings, AuthorizationStrategy,
    AuthorizationStrategyRequest, AuthorizationStrategyResponse, Header, Param,
    ResolvingContext, Scheme, SecretValue, StrategyRegistry,
};
pub use services::{
    CryptoError, CryptoService, Folder, FolderLookup, HttpTokenClient, MemoryFolderStore,
    TemplateEvaluator, TokenEndpointClient, TokenResponse, VariableContext,
};

/// Error type for request-auth operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A secret field could not be decrypted, encrypted or decoded.
    #[error("Authorization could not be resolved ({field}): {message}")]
    AuthResolution { field: String, message: String },

    /// Invalid wiring or a configuration handed to the wrong strategy.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A value outside the supported vocabulary.
    #[error("Unsupported {kind}: {value}")]
    UnsupportedValue { kind: &'static str, value: String },

    #[error("Illegal OAuth2 grant type: {0}")]
    IllegalGrantType(String),

    /// Raised by lookup collaborators.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The OAuth2 token endpoint answered with a non-success status.
    #[error("Token endpoint error (HTTP {status}): {message}")]
    TokenEndpoint { status: u16, message: String },

    /// Folder inheritance revisited a folder or went too deep.
    #[error("Authorization inheritance cycle at folder {folder_id}")]
    InheritanceCycle { folder_id: String },

    #[error("Template evaluation failed: {0}")]
    Template(String),

    /// Network connectivity or request failed.
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials could not be turned into an authorization value
    Authorization,
    /// Configuration, parsing, or setup errors
    Configuration,
    /// Network or upstream errors that may succeed on retry
    Transient,
    /// Internal errors (JSON, unexpected states)
    Internal,
}

impl Error {
    pub fn unsupported(kind: &'static str, value: impl Into<String>) -> Self {
        Error::UnsupportedValue {
            kind,
            value: value.into(),
        }
    }

    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn scheme_mismatch(expected: auth::Scheme, actual: auth::Scheme) -> Self {
        Error::Configuration(format!(
            "{} strategy cannot handle a {} configuration",
            expected, actual
        ))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::AuthResolution { .. } => ErrorCategory::Authorization,
            Error::TokenEndpoint {
                status: 401 | 403,
                ..
            } => ErrorCategory::Authorization,

            Error::Configuration(_)
            | Error::UnsupportedValue { .. }
            | Error::IllegalGrantType(_)
            | Error::NotFound { .. }
            | Error::InheritanceCycle { .. }
            | Error::Template(_) => ErrorCategory::Configuration,

            Error::Network(_) => ErrorCategory::Transient,
            Error::TokenEndpoint {
                status: 429 | 500..=599,
                ..
            } => ErrorCategory::Transient,

            Error::Json(_) | Error::TokenEndpoint { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_authorization_error(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_configuration_error(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::TokenEndpoint { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for request-auth operations.
pub type Result<T> = std::result::Result<T, Error>;
