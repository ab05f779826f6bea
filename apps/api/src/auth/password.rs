//! Password hashing and the pluggable strength policy.

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("password hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PasswordError> for crate::errors::AppError {
    fn from(err: PasswordError) -> Self {
        crate::errors::AppError::Internal(err.into())
    }
}

/// bcrypt hashing. Work runs on the blocking pool so request threads stay free.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        PasswordHasher { cost }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, PasswordError> {
        let plain = plain.to_string();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost)).await??;
        Ok(digest)
    }

    /// Constant-time check of `plain` against a stored digest.
    /// A malformed digest never matches.
    pub async fn verify(&self, plain: &str, digest: &str) -> Result<bool, PasswordError> {
        let plain = plain.to_string();
        let digest = digest.to_string();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(plain, &digest)).await?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(e) => {
                warn!("Stored password hash could not be parsed: {e}");
                Ok(false)
            }
        }
    }
}

/// Identity attributes a password must not resemble.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordContext<'a> {
    pub username: &'a str,
    pub email: &'a str,
}

/// Strength rules applied to new passwords on registration and password change.
pub trait PasswordPolicy: Send + Sync {
    /// `Err` carries every violated rule as a user-facing message.
    fn validate(&self, plain: &str, context: &PasswordContext<'_>) -> Result<(), Vec<String>>;
}

const COMMON_PASSWORDS: &[&str] = &[
    "123456",
    "12345678",
    "123456789",
    "1234567890",
    "password",
    "password1",
    "password123",
    "passw0rd",
    "qwerty",
    "qwerty123",
    "qwertyuiop",
    "abc123",
    "11111111",
    "iloveyou",
    "letmein",
    "welcome",
    "welcome1",
    "admin123",
    "monkey123",
    "sunshine",
    "football",
    "baseball",
    "trustno1",
    "changeme",
];

/// Minimum length, not entirely numeric, not a well-known password and not
/// built from the username or the email's local part.
#[derive(Debug, Clone)]
pub struct StandardPasswordPolicy {
    min_length: usize,
}

impl StandardPasswordPolicy {
    pub fn new(min_length: usize) -> Self {
        StandardPasswordPolicy { min_length }
    }
}

fn too_similar(password: &str, attribute: &str) -> bool {
    let attribute = attribute.to_lowercase();
    if attribute.chars().count() < 3 {
        return false;
    }
    password.contains(&attribute) || attribute.contains(password)
}

impl PasswordPolicy for StandardPasswordPolicy {
    fn validate(&self, plain: &str, context: &PasswordContext<'_>) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        let lowered = plain.to_lowercase();

        if plain.chars().count() < self.min_length {
            violations.push(format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            ));
        }
        if COMMON_PASSWORDS.contains(&lowered.trim()) {
            violations.push("This password is too common.".to_string());
        }
        if !plain.is_empty() && plain.chars().all(|c| c.is_ascii_digit()) {
            violations.push("This password is entirely numeric.".to_string());
        }
        if !lowered.is_empty() {
            let email_local = context.email.split('@').next().unwrap_or_default();
            if too_similar(&lowered, context.username) {
                violations.push("The password is too similar to the username.".to_string());
            } else if too_similar(&lowered, email_local) {
                violations.push("The password is too similar to the email address.".to_string());
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
