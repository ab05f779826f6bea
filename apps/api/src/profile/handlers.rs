use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::profile::ProfileView;
use crate::profile::service::{get_avatar, get_profile, update_profile, ProfileUpdate};
use crate::routes::multipart::MultipartForm;
use crate::state::AppState;
use crate::storage::content_type_for;

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<ProfileView>, AppError> {
    Ok(Json(get_profile(state.store.as_ref(), &principal).await?))
}

/// PUT or PATCH /api/v1/profile (multipart). Read-only fields are ignored.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    principal: Principal,
    multipart: Multipart,
) -> Result<Json<ProfileView>, AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let update = ProfileUpdate {
        first_name: form.take_field("first_name"),
        last_name: form.take_field("last_name"),
        bio: form.take_field("bio"),
        phone_number: form.take_field("phone_number"),
        linkedin_url: form.take_field("linkedin_url"),
        portfolio_url: form.take_field("portfolio_url"),
        notification_email_updates: form.take_field("notification_email_updates"),
        notification_job_alerts: form.take_field("notification_job_alerts"),
        avatar: form.take_file("avatar"),
    };

    let view = update_profile(
        state.store.as_ref(),
        state.blobs.as_ref(),
        &principal,
        update,
    )
    .await?;
    Ok(Json(view))
}

/// GET /api/v1/profile/avatar
pub async fn handle_get_avatar(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<impl IntoResponse, AppError> {
    let (file_name, bytes) =
        get_avatar(state.store.as_ref(), state.blobs.as_ref(), &principal).await?;
    Ok((
        [(header::CONTENT_TYPE, content_type_for(&file_name).to_string())],
        bytes,
    ))
}
