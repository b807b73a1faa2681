//! Folder lookup collaborator.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::auth::AuthorizationConfig;
use crate::{Error, Result};

/// The slice of a stored folder the engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<AuthorizationConfig>,
}

impl Folder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            authorization: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_authorization(mut self, authorization: AuthorizationConfig) -> Self {
        self.authorization = Some(authorization);
        self
    }
}

/// Resolves a folder by id. Fails with [`Error::NotFound`] for unknown ids.
#[async_trait]
pub trait FolderLookup: Send + Sync {
    async fn get_folder(&self, id: &str) -> Result<Folder>;
}

/// In-memory folder store.
#[derive(Debug, Default, Clone)]
pub struct MemoryFolderStore {
    folders: Arc<RwLock<HashMap<String, Folder>>>,
}

impl MemoryFolderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_folders(folders: impl IntoIterator<Item = Folder>) -> Self {
        let folders = folders.into_iter().map(|f| (f.id.clone(), f)).collect();
        Self {
            folders: Arc::new(RwLock::new(folders)),
        }
    }

    pub async fn insert(&self, folder: Folder) {
        self.folders.write().await.insert(folder.id.clone(), folder);
    }

    pub async fn remove(&self, id: &str) -> Option<Folder> {
        self.folders.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.folders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.folders.read().await.is_empty()
    }
}

#[async_trait]
impl FolderLookup for MemoryFolderStore {
    async fn get_folder(&self, id: &str) -> Result<Folder> {
        self.folders
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found("folder", id))
    }
}
