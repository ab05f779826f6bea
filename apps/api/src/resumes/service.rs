//! Resume uploads, scoped to the uploading user.

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::auth::Principal;
use crate::errors::{AppError, FieldErrors};
use crate::models::resume::{NewResume, ResumeView};
use crate::storage::{self, BlobStore, UploadedFile};
use crate::store::ResumeStore;
use crate::validation::check_max_len;

const MAX_FILENAME_LEN: usize = 255;

fn not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

pub async fn list_resumes<S>(store: &S, principal: &Principal) -> Result<Vec<ResumeView>, AppError>
where
    S: ResumeStore + ?Sized,
{
    let resumes = store.list_resumes(principal.user_id).await?;
    Ok(resumes.iter().map(ResumeView::from).collect())
}

pub async fn get_resume<S>(store: &S, principal: &Principal, id: Uuid) -> Result<ResumeView, AppError>
where
    S: ResumeStore + ?Sized,
{
    let resume = store
        .get_resume(principal.user_id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(ResumeView::from(&resume))
}

/// Stores the uploaded document. The recorded filename is always the uploaded
/// file's own name; callers never get to choose it.
pub async fn create_resume<S>(
    store: &S,
    blobs: &dyn BlobStore,
    principal: &Principal,
    file: Option<UploadedFile>,
) -> Result<ResumeView, AppError>
where
    S: ResumeStore + ?Sized,
{
    let mut errors = FieldErrors::new();
    let Some(file) = file else {
        return Err(AppError::validation("file", "No file was submitted."));
    };
    if file.file_name.is_empty() {
        errors.add("file", "No file was submitted.");
    } else {
        check_max_len(&mut errors, "file", &file.file_name, MAX_FILENAME_LEN);
    }
    if file.bytes.is_empty() {
        errors.add("file", "The submitted file is empty.");
    }
    errors.into_result()?;

    let prefix = format!("resumes/{}", principal.user_id);
    let file_key = blobs.store(&prefix, &file.file_name, file.bytes).await?;
    let new_resume = NewResume {
        id: Uuid::new_v4(),
        file_key,
        filename: file.file_name,
    };

    let resume = match store.insert_resume(principal.user_id, &new_resume).await {
        Ok(resume) => resume,
        Err(e) => {
            storage::discard(blobs, &new_resume.file_key).await;
            return Err(e.into());
        }
    };

    info!("User {} uploaded resume {}", principal.user_id, resume.id);
    Ok(ResumeView::from(&resume))
}

pub async fn delete_resume<S>(
    store: &S,
    blobs: &dyn BlobStore,
    principal: &Principal,
    id: Uuid,
) -> Result<(), AppError>
where
    S: ResumeStore + ?Sized,
{
    let resume = store
        .delete_resume(principal.user_id, id)
        .await?
        .ok_or_else(not_found)?;
    storage::discard(blobs, &resume.file_key).await;
    info!("User {} deleted resume {}", principal.user_id, id);
    Ok(())
}

/// The stored filename and document bytes.
pub async fn download_resume<S>(
    store: &S,
    blobs: &dyn BlobStore,
    principal: &Principal,
    id: Uuid,
) -> Result<(String, Bytes), AppError>
where
    S: ResumeStore + ?Sized,
{
    let resume = store
        .get_resume(principal.user_id, id)
        .await?
        .ok_or_else(not_found)?;
    let bytes = blobs.retrieve(&resume.file_key).await?;
    Ok((resume.filename, bytes))
}
