//! Fixtures shared by the unit tests.

use std::sync::Arc;

use bytes::Bytes;
use tempfile::TempDir;

use crate::auth::password::{PasswordHasher, StandardPasswordPolicy};
use crate::auth::tokens::TokenIssuer;
use crate::auth::Principal;
use crate::config::Config;
use crate::models::user::{NewUser, User};
use crate::state::AppState;
use crate::storage::{LocalBlobStore, UploadedFile};
use crate::store::memory::MemoryStore;
use crate::store::UserStore;

/// Registers a user straight through the store. The stored hash is not a real
/// digest, so these users cannot log in; use the auth service for that.
pub async fn user(store: &MemoryStore, username: &str) -> (User, Principal) {
    let user = store
        .create_user_with_profile(&NewUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "unusable".to_string(),
        })
        .await
        .unwrap();
    let principal = Principal { user_id: user.id };
    (user, principal)
}

pub fn blobs() -> (TempDir, LocalBlobStore) {
    let dir = TempDir::new().unwrap();
    let blobs = LocalBlobStore::new(dir.path());
    (dir, blobs)
}

pub fn upload(file_name: &str, bytes: &'static [u8]) -> UploadedFile {
    UploadedFile {
        file_name: file_name.to_string(),
        bytes: Bytes::from_static(bytes),
    }
}

/// Application state over a fresh `MemoryStore` and a temporary media root.
/// The directory is removed when the returned `TempDir` drops.
pub fn app_state() -> (TempDir, AppState, Arc<MemoryStore>) {
    let dir = TempDir::new().unwrap();
    let config = Config::for_tests(dir.path().to_path_buf());
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone(),
        blobs: Arc::new(LocalBlobStore::new(dir.path())),
        tokens: TokenIssuer::new(
            &config.jwt_secret,
            config.access_token_ttl_secs,
            config.refresh_token_ttl_secs,
        ),
        passwords: PasswordHasher::new(config.bcrypt_cost),
        password_policy: Arc::new(StandardPasswordPolicy::new(config.password_min_length)),
        config,
    };
    (dir, state, store)
}
