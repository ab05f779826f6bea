use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::jobs::service::{
    create_job, delete_job, get_job, list_jobs, update_job, JobApplicationPayload, JobListQuery,
};
use crate::models::job::JobApplication;
use crate::state::AppState;
use crate::validation::path_id;

const RESOURCE: &str = "Job application";

/// GET /api/v1/jobs?status=&search=
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    principal: Principal,
    Query(query): Query<JobListQuery>,
) -> Result<Json<Vec<JobApplication>>, AppError> {
    Ok(Json(list_jobs(state.store.as_ref(), &principal, query).await?))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<JobApplicationPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<JobApplication>), AppError> {
    let Json(payload) = payload?;
    let job = create_job(state.store.as_ref(), &principal, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<JobApplication>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    Ok(Json(get_job(state.store.as_ref(), &principal, id).await?))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_replace_job(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    payload: Result<Json<JobApplicationPayload>, JsonRejection>,
) -> Result<Json<JobApplication>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    let Json(payload) = payload?;
    Ok(Json(
        update_job(state.store.as_ref(), &principal, id, payload, false).await?,
    ))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_patch_job(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    payload: Result<Json<JobApplicationPayload>, JsonRejection>,
) -> Result<Json<JobApplication>, AppError> {
    let id = path_id(&id, RESOURCE)?;
    let Json(payload) = payload?;
    Ok(Json(
        update_job(state.store.as_ref(), &principal, id, payload, true).await?,
    ))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = path_id(&id, RESOURCE)?;
    delete_job(state.store.as_ref(), &principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
