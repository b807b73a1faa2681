//! Request and response envelopes for a single strategy invocation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::config::AuthorizationConfig;
use crate::services::{PlaceholderEvaluator, TemplateEvaluator, VariableContext};

/// Header name every header-mode scheme writes to.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// The outbound request an authorization value is computed for.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvingContext {
    pub url: String,
    pub http_method: String,
}

impl ResolvingContext {
    pub fn new(url: impl Into<String>, http_method: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http_method: http_method.into(),
        }
    }
}

/// Input to [`AuthorizationStrategy::resolve_auth_value`](super::AuthorizationStrategy::resolve_auth_value).
///
/// `unsafe_config` is resolved to real values for signing. `safe_config` is a structurally
/// identical copy whose secrets stay marked; it is only used to build masked output.
#[derive(Clone)]
pub struct AuthorizationStrategyRequest {
    pub unsafe_config: AuthorizationConfig,
    pub safe_config: AuthorizationConfig,
    pub resolving_context: ResolvingContext,
    pub project_id: String,
    pub environment_id: Option<String>,
    pub template_evaluator: Arc<dyn TemplateEvaluator>,
    pub variables: VariableContext,
    inheritance_chain: Vec<String>,
}

impl AuthorizationStrategyRequest {
    pub fn new(
        unsafe_config: AuthorizationConfig,
        safe_config: AuthorizationConfig,
        resolving_context: ResolvingContext,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            unsafe_config,
            safe_config,
            resolving_context,
            project_id: project_id.into(),
            environment_id: None,
            template_evaluator: Arc::new(PlaceholderEvaluator),
            variables: VariableContext::default(),
            inheritance_chain: Vec::new(),
        }
    }

    /// Both copies taken from one stored configuration.
    pub fn for_config(
        config: AuthorizationConfig,
        resolving_context: ResolvingContext,
        project_id: impl Into<String>,
    ) -> Self {
        Self::new(config.clone(), config, resolving_context, project_id)
    }

    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    pub fn with_template_evaluator(mut self, evaluator: Arc<dyn TemplateEvaluator>) -> Self {
        self.template_evaluator = evaluator;
        self
    }

    pub fn with_variables(mut self, variables: VariableContext) -> Self {
        self.variables = variables;
        self
    }

    /// Folder ids already visited through inheritance, outermost first.
    pub fn inheritance_chain(&self) -> &[String] {
        &self.inheritance_chain
    }

    /// A request for a parent configuration that keeps this request's context.
    pub fn nested(
        &self,
        unsafe_config: AuthorizationConfig,
        safe_config: AuthorizationConfig,
        folder_id: impl Into<String>,
    ) -> Self {
        let mut inheritance_chain = self.inheritance_chain.clone();
        inheritance_chain.push(folder_id.into());
        Self {
            unsafe_config,
            safe_config,
            resolving_context: self.resolving_context.clone(),
            project_id: self.project_id.clone(),
            environment_id: self.environment_id.clone(),
            template_evaluator: Arc::clone(&self.template_evaluator),
            variables: self.variables.clone(),
            inheritance_chain,
        }
    }
}

impl fmt::Debug for AuthorizationStrategyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationStrategyRequest")
            .field("scheme", &self.unsafe_config.scheme())
            .field("resolving_context", &self.resolving_context)
            .field("project_id", &self.project_id)
            .field("environment_id", &self.environment_id)
            .field("inheritance_chain", &self.inheritance_chain)
            .finish_non_exhaustive()
    }
}

/// Output of a successful resolution.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AuthorizationStrategyResponse {
    /// Value for the `Authorization` header, with a copy safe to echo.
    #[serde(rename_all = "camelCase")]
    Header { value: String, masked_value: String },
    /// Query parameters to merge into the request URL.
    Params { params: BTreeMap<String, String> },
}

impl AuthorizationStrategyResponse {
    pub fn header(value: impl Into<String>, masked_value: impl Into<String>) -> Self {
        Self::Header {
            value: value.into(),
            masked_value: masked_value.into(),
        }
    }

    pub fn params(params: BTreeMap<String, String>) -> Self {
        Self::Params { params }
    }

    pub fn header_value(&self) -> Option<&str> {
        match self {
            Self::Header { value, .. } => Some(value),
            Self::Params { .. } => None,
        }
    }

    pub fn masked_value(&self) -> Option<&str> {
        match self {
            Self::Header { masked_value, .. } => Some(masked_value),
            Self::Params { .. } => None,
        }
    }

    pub fn query_params(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Params { params } => Some(params),
            Self::Header { .. } => None,
        }
    }
}

impl fmt::Debug for AuthorizationStrategyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header { masked_value, .. } => f
                .debug_struct("Header")
                .field("value", &"[redacted]")
                .field("masked_value", masked_value)
                .finish(),
            Self::Params { params } => f
                .debug_struct("Params")
                .field("keys", &params.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}

/// A header rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn authorization(value: impl Into<String>) -> Self {
        Self::new(AUTHORIZATION_HEADER, value)
    }
}

/// A query parameter rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub key: String,
    pub value: String,
}

impl Param {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::BearerAuthorization;

    #[test]
    fn test_nested_keeps_context_and_extends_chain() {
        let config: AuthorizationConfig = BearerAuthorization::new("t").into();
        let outer = AuthorizationStrategyRequest::for_config(
            config.clone(),
            ResolvingContext::new("https://api.example.com", "GET"),
            "p1",
        )
        .with_environment("dev")
        .with_variables(VariableContext::new().with("a", "b"));

        let inner = outer.nested(config.clone(), config, "folder-1");
        let inner = inner.nested(inner.unsafe_config.clone(), inner.safe_config.clone(), "folder-2");

        assert_eq!(inner.project_id, "p1");
        assert_eq!(inner.environment_id.as_deref(), Some("dev"));
        assert_eq!(inner.resolving_context.http_method, "GET");
        assert_eq!(inner.variables.get("a"), Some("b"));
        assert_eq!(inner.inheritance_chain(), ["folder-1", "folder-2"]);
        assert!(outer.inheritance_chain().is_empty());
    }

    #[test]
    fn test_response_debug_hides_value() {
        let response = AuthorizationStrategyResponse::header("Bearer secret", "Bearer ******");
        let debug = format!("{:?}", response);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("******"));
    }

    #[test]
    fn test_response_accessors() {
        let header = AuthorizationStrategyResponse::header("v", "m");
        assert_eq!(header.header_value(), Some("v"));
        assert!(header.query_params().is_none());

        let params = AuthorizationStrategyResponse::params(BTreeMap::from([(
            "oauth_nonce".to_string(),
            "n".to_string(),
        )]));
        assert!(params.header_value().is_none());
        assert_eq!(params.query_params().unwrap().len(), 1);
    }
}
