//! Login by username or email.

use thiserror::Error;
use tracing::warn;

use crate::auth::password::{PasswordError, PasswordHasher};
use crate::errors::AppError;
use crate::models::user::User;
use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum AuthFailure {
    #[error("no user matches the identifier")]
    NoSuchUser,
    #[error("password does not match")]
    BadCredential,
    #[error("account is disabled")]
    AccountDisabled,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<AuthFailure> for AppError {
    fn from(failure: AuthFailure) -> Self {
        match failure {
            AuthFailure::NoSuchUser | AuthFailure::BadCredential | AuthFailure::AccountDisabled => {
                AppError::InvalidCredentials
            }
            AuthFailure::Store(e) => e.into(),
            AuthFailure::Password(e) => e.into(),
        }
    }
}

/// Picks the record to authenticate against when the identifier matched more
/// than one user (a username colliding with someone else's email). The lowest
/// id wins so the outcome is deterministic and login stays available.
pub fn select_login_candidate(candidates: Vec<User>) -> Option<User> {
    candidates.into_iter().min_by_key(|u| u.id)
}

/// Resolves `identifier` (username or email, case-insensitive) to one user and
/// verifies `password` against it.
pub async fn authenticate<S>(
    store: &S,
    hasher: &PasswordHasher,
    identifier: &str,
    password: &str,
) -> Result<User, AuthFailure>
where
    S: UserStore + ?Sized,
{
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(AuthFailure::NoSuchUser);
    }

    let candidates = store.find_by_login(identifier).await?;
    if candidates.len() > 1 {
        warn!(
            "Login identifier matched {} accounts; using the lowest id",
            candidates.len()
        );
    }
    let user = select_login_candidate(candidates).ok_or(AuthFailure::NoSuchUser)?;

    if !hasher.verify(password, &user.password_hash).await? {
        return Err(AuthFailure::BadCredential);
    }
    if !user.is_active {
        return Err(AuthFailure::AccountDisabled);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::user::NewUser;
    use crate::store::memory::MemoryStore;

    const PASSWORD: &str = "tangerine-Harbor-42";

    async fn store_with_alice(hasher: &PasswordHasher) -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let alice = store
            .create_user_with_profile(&NewUser {
                username: "alice".to_string(),
                email: "alice@example.com".to_string(),
                password_hash: hasher.hash(PASSWORD).await.unwrap(),
            })
            .await
            .unwrap();
        (store, alice)
    }

    fn raw_user(username: &str, email: &str, password_hash: &str) -> User {
        User {
            id: 0,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_username_and_email_resolve_to_same_user() {
        let hasher = PasswordHasher::new(4);
        let (store, alice) = store_with_alice(&hasher).await;

        let by_email = authenticate(&store, &hasher, "alice@example.com", PASSWORD)
            .await
            .unwrap();
        let by_name = authenticate(&store, &hasher, "alice", PASSWORD).await.unwrap();

        assert_eq!(by_email.id, alice.id);
        assert_eq!(by_name.id, alice.id);
    }

    #[tokio::test]
    async fn test_lookup_ignores_case() {
        let hasher = PasswordHasher::new(4);
        let (store, alice) = store_with_alice(&hasher).await;

        let user = authenticate(&store, &hasher, "ALICE@Example.COM", PASSWORD)
            .await
            .unwrap();
        assert_eq!(user.id, alice.id);

        let user = authenticate(&store, &hasher, "Alice", PASSWORD).await.unwrap();
        assert_eq!(user.id, alice.id);
    }

    #[tokio::test]
    async fn test_unknown_identifier() {
        let hasher = PasswordHasher::new(4);
        let (store, _) = store_with_alice(&hasher).await;

        let err = authenticate(&store, &hasher, "bob", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoSuchUser));
    }

    #[tokio::test]
    async fn test_blank_identifier_never_matches_blank_email() {
        let hasher = PasswordHasher::new(4);
        let store = MemoryStore::new();
        let digest = hasher.hash(PASSWORD).await.unwrap();
        store.insert_raw_user(raw_user("noemail", "", &digest));

        let err = authenticate(&store, &hasher, "  ", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthFailure::NoSuchUser));
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let hasher = PasswordHasher::new(4);
        let (store, _) = store_with_alice(&hasher).await;

        let err = authenticate(&store, &hasher, "alice", "nope-nope-nope")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::BadCredential));
    }

    #[tokio::test]
    async fn test_disabled_account_with_correct_password() {
        let hasher = PasswordHasher::new(4);
        let (store, alice) = store_with_alice(&hasher).await;
        store.set_active(alice.id, false);

        let err = authenticate(&store, &hasher, "alice", PASSWORD).await.unwrap_err();
        assert!(matches!(err, AuthFailure::AccountDisabled));
    }

    #[tokio::test]
    async fn test_collision_resolves_to_lowest_id() {
        let hasher = PasswordHasher::new(4);
        let store = MemoryStore::new();
        let first_hash = hasher.hash("first-account-pw").await.unwrap();
        let second_hash = hasher.hash("second-account-pw").await.unwrap();

        // Second user's username equals the first user's email.
        let first = store.insert_raw_user(raw_user("carol", "dup@example.com", &first_hash));
        let second = store.insert_raw_user(raw_user("DUP@example.com", "", &second_hash));
        assert!(first.id < second.id);

        let user = authenticate(&store, &hasher, "dup@example.com", "first-account-pw")
            .await
            .unwrap();
        assert_eq!(user.id, first.id);

        // The higher-id account is never selected for this identifier.
        let err = authenticate(&store, &hasher, "dup@example.com", "second-account-pw")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthFailure::BadCredential));
    }

    #[test]
    fn test_select_login_candidate_picks_min_id() {
        let mut a = raw_user("a", "", "");
        a.id = 9;
        let mut b = raw_user("b", "", "");
        b.id = 3;
        assert_eq!(select_login_candidate(vec![a, b]).unwrap().id, 3);
        assert!(select_login_candidate(vec![]).is_none());
    }

    #[test]
    fn test_failures_collapse_to_invalid_credentials() {
        for failure in [
            AuthFailure::NoSuchUser,
            AuthFailure::BadCredential,
            AuthFailure::AccountDisabled,
        ] {
            assert!(matches!(AppError::from(failure), AppError::InvalidCredentials));
        }
    }
}
