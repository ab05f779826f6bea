//! Registration and password change.

use serde::Deserialize;
use tracing::info;

use crate::auth::password::{PasswordContext, PasswordHasher, PasswordPolicy};
use crate::auth::principal::Principal;
use crate::errors::{AppError, FieldErrors};
use crate::models::user::{NewUser, User};
use crate::store::UserStore;

const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const PASSWORD_MISMATCH: &str = "Password fields didn't match.";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "password2")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// Letters, digits and `@ . + - _`, at most 150 characters.
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Ensure this field has no more than {MAX_USERNAME_LEN} characters."
        ));
    }
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

/// A single `@` with a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(format!(
            "Ensure this field has no more than {MAX_EMAIL_LEN} characters."
        ));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err("Enter a valid email address.".to_string())
    }
}

/// Creates the account and its empty profile as one unit.
///
/// Field problems are collected and reported together; a taken username or
/// email surfaces as a conflict from the store's uniqueness constraints.
pub async fn register<S>(
    store: &S,
    hasher: &PasswordHasher,
    policy: &dyn PasswordPolicy,
    request: RegisterRequest,
) -> Result<User, AppError>
where
    S: UserStore + ?Sized,
{
    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();

    let mut errors = FieldErrors::new();
    if let Err(msg) = validate_username(&username) {
        errors.add("username", msg);
    }
    if let Err(msg) = validate_email(&email) {
        errors.add("email", msg);
    }
    if request.password != request.confirm_password {
        errors.add("password", PASSWORD_MISMATCH);
    } else if let Err(violations) = policy.validate(
        &request.password,
        &PasswordContext {
            username: &username,
            email: &email,
        },
    ) {
        errors.extend("password", violations);
    }
    errors.into_result()?;

    let password_hash = hasher.hash(&request.password).await?;
    let user = store
        .create_user_with_profile(&NewUser {
            username,
            email,
            password_hash,
        })
        .await?;

    info!("Registered user {}", user.id);
    Ok(user)
}

/// Replaces the principal's password hash. Issued tokens stay valid.
pub async fn change_password<S>(
    store: &S,
    hasher: &PasswordHasher,
    policy: &dyn PasswordPolicy,
    principal: &Principal,
    request: ChangePasswordRequest,
) -> Result<(), AppError>
where
    S: UserStore + ?Sized,
{
    let user = store
        .find_user(principal.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if request.new_password != request.confirm_new_password {
        return Err(AppError::validation("new_password", PASSWORD_MISMATCH));
    }
    if let Err(violations) = policy.validate(
        &request.new_password,
        &PasswordContext {
            username: &user.username,
            email: &user.email,
        },
    ) {
        let mut errors = FieldErrors::new();
        errors.extend("new_password", violations);
        return Err(AppError::Validation(errors));
    }
    if !hasher.verify(&request.old_password, &user.password_hash).await? {
        return Err(AppError::validation("old_password", "Wrong password."));
    }

    let password_hash = hasher.hash(&request.new_password).await?;
    store.set_password_hash(user.id, &password_hash).await?;

    info!("Password changed for user {}", user.id);
    Ok(())
}
