//! Persistence seams.
//!
//! Every read and write that touches owned data takes the owner's user id and
//! applies the ownership predicate inside the query itself, so a record that
//! belongs to someone else is indistinguishable from one that does not exist.
//! Interviews have no user column and are scoped through their job application.
//!
//! `AppState` holds an `Arc<dyn Store>`; `PgStore` is the production backend.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::interview::{Interview, InterviewDraft};
use crate::models::job::{JobApplication, JobDraft, JobFilter};
use crate::models::profile::{Profile, ProfileChanges};
use crate::models::resume::{NewResume, Resume};
use crate::models::user::{NewUser, User};

pub mod postgres;

#[cfg(test)]
pub mod memory;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write. `field` names the input that collided.
    #[error("{field} already taken")]
    Conflict { field: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Every user whose username or email equals `identifier`, ignoring case.
    async fn find_by_login(&self, identifier: &str) -> StoreResult<Vec<User>>;

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>>;

    /// Inserts the user together with its empty profile, all or nothing.
    async fn create_user_with_profile(&self, new_user: &NewUser) -> StoreResult<User>;

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Returns the user's profile, inserting an empty one first if none exists.
    /// Safe under concurrent first access: at most one row is ever created.
    async fn get_or_create_profile(&self, user_id: i64) -> StoreResult<Profile>;

    /// Writes name changes to the user and the rest to the profile in one unit.
    async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<(User, Profile)>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Newest first.
    async fn list_resumes(&self, owner: i64) -> StoreResult<Vec<Resume>>;

    async fn get_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>>;

    async fn insert_resume(&self, owner: i64, resume: &NewResume) -> StoreResult<Resume>;

    /// Returns the deleted row so its blob can be cleaned up.
    async fn delete_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn list_jobs(&self, owner: i64, filter: &JobFilter) -> StoreResult<Vec<JobApplication>>;

    async fn get_job(&self, owner: i64, id: Uuid) -> StoreResult<Option<JobApplication>>;

    async fn insert_job(&self, owner: i64, draft: &JobDraft) -> StoreResult<JobApplication>;

    async fn update_job(
        &self,
        owner: i64,
        id: Uuid,
        draft: &JobDraft,
    ) -> StoreResult<Option<JobApplication>>;

    async fn delete_job(&self, owner: i64, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn list_interviews(&self, owner: i64, job_id: Option<Uuid>)
        -> StoreResult<Vec<Interview>>;

    async fn get_interview(&self, owner: i64, id: i64) -> StoreResult<Option<Interview>>;

    /// Inserts only when `draft.job_id` is owned by `owner`; `None` otherwise.
    async fn insert_interview(
        &self,
        owner: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>>;

    /// Updates only when both the interview's current job and `draft.job_id`
    /// are owned by `owner`; `None` otherwise.
    async fn update_interview(
        &self,
        owner: i64,
        id: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>>;

    async fn delete_interview(&self, owner: i64, id: i64) -> StoreResult<bool>;
}

/// Everything the request handlers need from persistence.
pub trait Store: UserStore + ProfileStore + ResumeStore + JobStore + InterviewStore {}

impl<T> Store for T where T: UserStore + ProfileStore + ResumeStore + JobStore + InterviewStore {}

/// Escapes `LIKE` wildcards so a search term only ever matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
