//! Read and partial update of the caller's profile.
//!
//! A profile row is materialized on first access when registration did not
//! leave one behind, so reads never fail for an existing user.

use bytes::Bytes;
use tracing::info;

use crate::auth::Principal;
use crate::errors::{AppError, FieldErrors};
use crate::models::profile::{ProfileChanges, ProfileView};
use crate::storage::{self, BlobStore, UploadedFile};
use crate::store::{ProfileStore, UserStore};
use crate::validation::{check_max_len, check_url, parse_form_bool};

const MAX_NAME_LEN: usize = 150;
const MAX_PHONE_LEN: usize = 20;
const MAX_URL_LEN: usize = 200;
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Raw submitted values. Absent fields are left unchanged.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub phone_number: Option<String>,
    pub linkedin_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub notification_email_updates: Option<String>,
    pub notification_job_alerts: Option<String>,
    pub avatar: Option<UploadedFile>,
}

fn parse_flag(errors: &mut FieldErrors, field: &str, raw: Option<String>) -> Option<bool> {
    let raw = raw?;
    let parsed = parse_form_bool(&raw);
    if parsed.is_none() {
        errors.add(field, "Must be a valid boolean.");
    }
    parsed
}

/// Checks every submitted field and collects all failures before returning.
/// The avatar's storage key is filled in later, once the bytes are stored.
pub fn validate_update(update: &mut ProfileUpdate) -> Result<ProfileChanges, AppError> {
    let mut errors = FieldErrors::new();
    let trimmed = |value: &mut Option<String>| value.take().map(|v| v.trim().to_string());

    let first_name = trimmed(&mut update.first_name);
    let last_name = trimmed(&mut update.last_name);
    let phone_number = trimmed(&mut update.phone_number);
    let linkedin_url = trimmed(&mut update.linkedin_url);
    let portfolio_url = trimmed(&mut update.portfolio_url);

    if let Some(v) = &first_name {
        check_max_len(&mut errors, "first_name", v, MAX_NAME_LEN);
    }
    if let Some(v) = &last_name {
        check_max_len(&mut errors, "last_name", v, MAX_NAME_LEN);
    }
    if let Some(v) = &phone_number {
        check_max_len(&mut errors, "phone_number", v, MAX_PHONE_LEN);
    }
    if let Some(v) = &linkedin_url {
        check_url(&mut errors, "linkedin_url", v, MAX_URL_LEN);
    }
    if let Some(v) = &portfolio_url {
        check_url(&mut errors, "portfolio_url", v, MAX_URL_LEN);
    }

    let notification_email_updates = parse_flag(
        &mut errors,
        "notification_email_updates",
        update.notification_email_updates.take(),
    );
    let notification_job_alerts = parse_flag(
        &mut errors,
        "notification_job_alerts",
        update.notification_job_alerts.take(),
    );

    if let Some(avatar) = &update.avatar {
        if avatar.bytes.is_empty() {
            errors.add("avatar", "The submitted file is empty.");
        } else if !storage::is_image_name(&avatar.file_name) {
            errors.add("avatar", INVALID_IMAGE);
        }
    }

    errors.into_result()?;

    Ok(ProfileChanges {
        first_name,
        last_name,
        bio: update.bio.take(),
        phone_number,
        linkedin_url,
        portfolio_url,
        avatar_key: None,
        notification_email_updates,
        notification_job_alerts,
    })
}

pub async fn get_profile<S>(store: &S, principal: &Principal) -> Result<ProfileView, AppError>
where
    S: UserStore + ProfileStore + ?Sized,
{
    let user = store
        .find_user(principal.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let profile = store.get_or_create_profile(user.id).await?;
    Ok(ProfileView::new(&user, &profile))
}

/// Applies a partial update. Nothing is written unless every field validates.
pub async fn update_profile<S>(
    store: &S,
    blobs: &dyn BlobStore,
    principal: &Principal,
    mut update: ProfileUpdate,
) -> Result<ProfileView, AppError>
where
    S: UserStore + ProfileStore + ?Sized,
{
    let mut changes = validate_update(&mut update)?;
    let previous = store.get_or_create_profile(principal.user_id).await?;

    if let Some(avatar) = update.avatar {
        let prefix = format!("avatars/{}", principal.user_id);
        let key = blobs.store(&prefix, &avatar.file_name, avatar.bytes).await?;
        changes.avatar_key = Some(key);
    }

    let (user, profile) = match store.update_profile(principal.user_id, &changes).await {
        Ok(updated) => updated,
        Err(e) => {
            if let Some(key) = &changes.avatar_key {
                storage::discard(blobs, key).await;
            }
            return Err(e.into());
        }
    };

    if changes.avatar_key.is_some() {
        if let Some(old) = previous.avatar_key {
            if profile.avatar_key.as_deref() != Some(old.as_str()) {
                storage::discard(blobs, &old).await;
            }
        }
    }

    info!("Profile updated for user {}", principal.user_id);
    Ok(ProfileView::new(&user, &profile))
}

/// The stored avatar's file name and bytes.
pub async fn get_avatar<S>(
    store: &S,
    blobs: &dyn BlobStore,
    principal: &Principal,
) -> Result<(String, Bytes), AppError>
where
    S: ProfileStore + ?Sized,
{
    let profile = store.get_or_create_profile(principal.user_id).await?;
    let key = profile
        .avatar_key
        .ok_or_else(|| AppError::NotFound("No avatar uploaded".to_string()))?;
    let bytes = blobs.retrieve(&key).await?;
    Ok((storage::key_file_name(&key).to_string(), bytes))
}
