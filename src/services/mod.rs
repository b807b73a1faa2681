//! Collaborator contracts consumed by the authorization engine.
//!
//! The engine never owns keys, storage or the outbound request; it reaches those through
//! the traits defined here:
//!
//! - [`CryptoService`]: encrypts and decrypts stored secret fields
//! - [`FolderLookup`]: fetches the folder an inheriting request points at
//! - [`TokenEndpointClient`]: posts form credentials to an OAuth2 token endpoint
//! - [`TemplateEvaluator`]: resolves `${variable}` placeholders

mod crypto;
mod folder;
mod template;
mod token;

pub use crypto::{CryptoError, CryptoService};
pub use folder::{Folder, FolderLookup, MemoryFolderStore};
pub use template::{PlaceholderEvaluator, TemplateEvaluator, VariableContext};
pub use token::{HttpTokenClient, TokenClientConfig, TokenEndpointClient, TokenResponse};
