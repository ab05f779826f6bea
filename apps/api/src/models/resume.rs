use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Resume {
    pub id: Uuid,
    pub user_id: i64,
    pub file_key: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResume {
    pub id: Uuid,
    pub file_key: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResumeView {
    pub id: Uuid,
    /// Download path for the stored document.
    pub file: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
}

impl From<&Resume> for ResumeView {
    fn from(resume: &Resume) -> Self {
        ResumeView {
            id: resume.id,
            file: format!("/api/v1/resumes/{}/file", resume.id),
            filename: resume.filename.clone(),
            uploaded_at: resume.uploaded_at,
        }
    }
}
