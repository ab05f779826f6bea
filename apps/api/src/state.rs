use std::sync::Arc;

use crate::auth::password::{PasswordHasher, PasswordPolicy};
use crate::auth::tokens::TokenIssuer;
use crate::config::Config;
use crate::storage::BlobStore;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owner-scoped persistence. `PgStore` in production.
    pub store: Arc<dyn Store>,
    /// Resume and avatar bytes. Local filesystem or S3, chosen by `STORAGE_BACKEND`.
    pub blobs: Arc<dyn BlobStore>,
    pub tokens: TokenIssuer,
    pub passwords: PasswordHasher,
    /// Pluggable strength rules for new passwords.
    pub password_policy: Arc<dyn PasswordPolicy>,
    pub config: Config,
}
