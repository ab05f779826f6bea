use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::resume::ResumeView;
use crate::resumes::service::{
    create_resume, delete_resume, download_resume, get_resume, list_resumes,
};
use crate::routes::multipart::MultipartForm;
use crate::state::AppState;
use crate::storage::content_type_for;
use crate::validation::path_id;

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `attachment` disposition with an ASCII `filename` fallback and the exact
/// name in `filename*`.
fn attachment_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        utf8_percent_encode(filename, ATTR_CHAR)
    )
}

/// GET /api/v1/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Vec<ResumeView>>, AppError> {
    Ok(Json(list_resumes(state.store.as_ref(), &principal).await?))
}

/// POST /api/v1/resumes (multipart, `file`). A `filename` form field is ignored.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    principal: Principal,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeView>), AppError> {
    let mut form = MultipartForm::read(multipart).await?;
    let view = create_resume(
        state.store.as_ref(),
        state.blobs.as_ref(),
        &principal,
        form.take_file("file"),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<ResumeView>, AppError> {
    let id = path_id(&id, "Resume")?;
    Ok(Json(get_resume(state.store.as_ref(), &principal, id).await?))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, "Resume")?;
    delete_resume(state.store.as_ref(), state.blobs.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/resumes/:id/file
pub async fn handle_download_resume(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = path_id(&id, "Resume")?;
    let (filename, bytes) =
        download_resume(state.store.as_ref(), state.blobs.as_ref(), &principal, id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&filename).to_string()),
            (header::CONTENT_DISPOSITION, attachment_disposition(&filename)),
        ],
        bytes,
    ))
}
