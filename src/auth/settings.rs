//! Engine-wide authorization settings.

/// Placeholder shown in place of any secret value.
pub const DEFAULT_MASK: &str = "******";

/// UI hint for values that only exist once the request is sent.
pub const DEFAULT_COMPUTED_PLACEHOLDER: &str = "<calculated at request time>";

/// Upper bound on chained folder inheritance.
pub const DEFAULT_MAX_INHERITANCE_DEPTH: usize = 16;

/// Settings shared by every strategy in a registry.
/// Defaults can be overridden via environment variables or the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationSettings {
    /// Replaces secrets in masked and display output.
    pub mask: String,
    /// Display value for headers computed at send time.
    pub computed_placeholder: String,
    /// Maximum number of folder hops before inheritance is treated as a cycle.
    pub max_inheritance_depth: usize,
}

impl Default for AuthorizationSettings {
    fn default() -> Self {
        Self {
            mask: DEFAULT_MASK.to_string(),
            computed_placeholder: DEFAULT_COMPUTED_PLACEHOLDER.to_string(),
            max_inheritance_depth: DEFAULT_MAX_INHERITANCE_DEPTH,
        }
    }
}

impl AuthorizationSettings {
    /// Create settings with defaults, then apply environment variable overrides.
    pub fn from_env() -> Self {
        let mut settings = Self::default();

        if let Ok(mask) = std::env::var("REQUEST_AUTH_MASK") {
            settings.mask = mask;
        }
        if let Ok(placeholder) = std::env::var("REQUEST_AUTH_COMPUTED_PLACEHOLDER") {
            settings.computed_placeholder = placeholder;
        }
        if let Some(depth) = std::env::var("REQUEST_AUTH_MAX_INHERITANCE_DEPTH")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            settings.max_inheritance_depth = depth;
        }

        settings
    }

    pub fn builder() -> AuthorizationSettingsBuilder {
        AuthorizationSettingsBuilder::default()
    }
}

/// Builder for AuthorizationSettings.
#[derive(Debug, Default)]
pub struct AuthorizationSettingsBuilder {
    settings: AuthorizationSettings,
}

impl AuthorizationSettingsBuilder {
    pub fn mask(mut self, mask: impl Into<String>) -> Self {
        self.settings.mask = mask.into();
        self
    }

    pub fn computed_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.settings.computed_placeholder = placeholder.into();
        self
    }

    pub fn max_inheritance_depth(mut self, depth: usize) -> Self {
        self.settings.max_inheritance_depth = depth;
        self
    }

    pub fn build(self) -> AuthorizationSettings {
        self.settings
    }
}
