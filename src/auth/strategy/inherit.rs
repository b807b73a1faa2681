//! Folder inheritance strategy.
//!
//! Resolves one hop to the referenced folder and delegates to the strategy for the folder's
//! own scheme. A parent that itself inherits is followed through the registry, guarded by the
//! request's inheritance chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::AuthorizationStrategy;
use super::traits::{ensure_scheme, flat_value};
use crate::auth::registry::StrategyLookup;
use crate::auth::{
    AuthorizationConfig, AuthorizationSettings, AuthorizationStrategyRequest,
    AuthorizationStrategyResponse, Header, InheritFromParentAuthorization, Param, Scheme,
};
use crate::services::FolderLookup;
use crate::{Error, Result};

#[derive(Clone)]
pub struct InheritFromParentStrategy {
    folders: Arc<dyn FolderLookup>,
    lookup: StrategyLookup,
    settings: Arc<AuthorizationSettings>,
}

impl fmt::Debug for InheritFromParentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InheritFromParentStrategy")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn folder_reference(config: &AuthorizationConfig) -> Result<Option<&str>> {
    let inherit = config
        .as_inherit_from_parent()
        .ok_or_else(|| Error::scheme_mismatch(Scheme::InheritFromParent, config.scheme()))?;
    Ok(inherit
        .authorization_folder_id
        .as_deref()
        .filter(|id| !id.is_empty()))
}

impl InheritFromParentStrategy {
    pub fn new(
        folders: Arc<dyn FolderLookup>,
        lookup: StrategyLookup,
        settings: Arc<AuthorizationSettings>,
    ) -> Self {
        Self {
            folders,
            lookup,
            settings,
        }
    }

    fn check_chain(&self, chain: &[String], folder_id: &str) -> Result<()> {
        if chain.iter().any(|visited| visited == folder_id)
            || chain.len() >= self.settings.max_inheritance_depth
        {
            tracing::error!(folder_id, chain = ?chain, "authorization inheritance cycle");
            return Err(Error::InheritanceCycle {
                folder_id: folder_id.to_string(),
            });
        }
        Ok(())
    }

    /// Follows inheritance from `config` to the first non-inheriting configuration.
    ///
    /// `Ok(None)` when a reference is missing or a folder has no authorization.
    async fn effective_parent(
        &self,
        config: &AuthorizationConfig,
    ) -> Result<Option<AuthorizationConfig>> {
        let mut chain: Vec<String> = Vec::new();
        let mut current = config.clone();

        while current.scheme() == Scheme::InheritFromParent {
            let Some(folder_id) = folder_reference(&current)? else {
                return Ok(None);
            };
            self.check_chain(&chain, folder_id)?;
            let folder = self.folders.get_folder(folder_id).await?;
            let Some(parent) = folder.authorization else {
                tracing::debug!(folder_id, "parent folder has no authorization to display");
                return Ok(None);
            };
            chain.push(folder.id);
            current = parent;
        }

        Ok(Some(current))
    }
}

#[async_trait]
impl AuthorizationStrategy for InheritFromParentStrategy {
    fn scheme(&self) -> Scheme {
        Scheme::InheritFromParent
    }

    async fn resolve_auth_value(
        &self,
        request: &AuthorizationStrategyRequest,
    ) -> Result<Option<AuthorizationStrategyResponse>> {
        let Some(folder_id) = folder_reference(&request.unsafe_config)? else {
            tracing::debug!("no parent folder referenced, nothing to inherit");
            return Ok(None);
        };
        self.check_chain(request.inheritance_chain(), folder_id)?;

        let folder = self.folders.get_folder(folder_id).await?;
        let Some(parent) = folder.authorization else {
            tracing::warn!(
                folder_id,
                project_id = %request.project_id,
                "parent folder has no authorization configured"
            );
            return Ok(None);
        };

        let safe_config = parent.clone();
        let mut unsafe_config = parent;
        unsafe_config.evaluate_templates(request.template_evaluator.as_ref(), &request.variables)?;

        let scheme = unsafe_config.scheme();
        let nested = request.nested(unsafe_config, safe_config, folder.id);
        tracing::debug!(
            folder_id,
            scheme = %scheme,
            depth = nested.inheritance_chain().len(),
            "delegating to parent folder authorization"
        );

        let strategy = self.lookup.lookup(scheme)?;
        strategy.resolve_auth_value(&nested).await
    }

    fn parse_from_flat_map(
        &self,
        map: &HashMap<String, String>,
    ) -> Result<Option<AuthorizationConfig>> {
        let config = InheritFromParentAuthorization {
            authorization_folder_id: flat_value(map, &["authorizationFolderId"])
                .map(str::to_string),
        };
        Ok(Some(config.into()))
    }

    async fn render_display_header(&self, config: &AuthorizationConfig) -> Result<Option<Header>> {
        ensure_scheme(config, Scheme::InheritFromParent)?;
        let Some(parent) = self.effective_parent(config).await? else {
            return Ok(None);
        };
        self.lookup
            .lookup(parent.scheme())?
            .render_display_header(&parent)
            .await
    }

    async fn render_display_params(&self, config: &AuthorizationConfig) -> Result<Vec<Param>> {
        ensure_scheme(config, Scheme::InheritFromParent)?;
        let Some(parent) = self.effective_parent(config).await? else {
            return Ok(Vec::new());
        };
        self.lookup
            .lookup(parent.scheme())?
            .render_display_params(&parent)
            .await
    }

    fn name(&self) -> &'static str {
        "inherit_from_parent"
    }
}
