pub mod health;
pub mod multipart;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::auth::handlers as auth;
use crate::interviews::handlers as interviews;
use crate::jobs::handlers as jobs;
use crate::profile::handlers as profile;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/token/refresh", post(auth::handle_refresh))
        .route(
            "/api/v1/auth/change-password",
            put(auth::handle_change_password),
        )
        // Profile
        .route(
            "/api/v1/profile",
            get(profile::handle_get_profile)
                .put(profile::handle_update_profile)
                .patch(profile::handle_update_profile),
        )
        .route("/api/v1/profile/avatar", get(profile::handle_get_avatar))
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get_resume).delete(resumes::handle_delete_resume),
        )
        .route(
            "/api/v1/resumes/:id/file",
            get(resumes::handle_download_resume),
        )
        // Job applications
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_replace_job)
                .patch(jobs::handle_patch_job)
                .delete(jobs::handle_delete_job),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            get(interviews::handle_list_interviews).post(interviews::handle_create_interview),
        )
        .route(
            "/api/v1/interviews/:id",
            get(interviews::handle_get_interview)
                .put(interviews::handle_replace_interview)
                .patch(interviews::handle_patch_interview)
                .delete(interviews::handle_delete_interview),
        )
        .layer(body_limit)
        .with_state(state)
}
