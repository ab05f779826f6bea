use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::interviews::service::{
    create_interview, delete_interview, get_interview, list_interviews, update_interview,
    InterviewListQuery, InterviewPayload,
};
use crate::models::interview::Interview;
use crate::state::AppState;
use crate::validation::path_id;

const RESOURCE: &str = "Interview";

/// GET /api/v1/interviews?job=
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<InterviewListQuery>,
) -> Result<Json<Vec<Interview>>, AppError> {
    Ok(Json(
        list_interviews(state.store.as_ref(), &principal, query).await?,
    ))
}

/// POST /api/v1/interviews
pub async fn handle_create_interview(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<InterviewPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Interview>), AppError> {
    let Json(payload) = payload?;
    let interview = create_interview(state.store.as_ref(), &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<Interview>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    Ok(Json(get_interview(state.store.as_ref(), &principal, id).await?))
}

/// PUT /api/v1/interviews/:id
pub async fn handle_replace_interview(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    payload: Result<Json<InterviewPayload>, JsonRejection>,
) -> Result<Json<Interview>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    let Json(payload) = payload?;
    Ok(Json(
        update_interview(state.store.as_ref(), &principal, id, payload, false).await?,
    ))
}

/// PATCH /api/v1/interviews/:id
pub async fn handle_patch_interview(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    payload: Result<Json<InterviewPayload>, JsonRejection>,
) -> Result<Json<Interview>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    let Json(payload) = payload?;
    Ok(Json(
        update_interview(state.store.as_ref(), &principal, id, payload, true).await?,
    ))
}

/// DELETE /api/v1/interviews/:id
pub async fn handle_delete_interview(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, RESOURCE)?;
    delete_interview(state.store.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
