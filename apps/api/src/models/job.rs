use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct InvalidChoice(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
    Ghosted,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Applied => "APPLIED",
            JobStatus::Interview => "INTERVIEW",
            JobStatus::Offer => "OFFER",
            JobStatus::Rejected => "REJECTED",
            JobStatus::Ghosted => "GHOSTED",
        }
    }
}

impl FromStr for JobStatus {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "APPLIED" => Ok(JobStatus::Applied),
            "INTERVIEW" => Ok(JobStatus::Interview),
            "OFFER" => Ok(JobStatus::Offer),
            "REJECTED" => Ok(JobStatus::Rejected),
            "GHOSTED" => Ok(JobStatus::Ghosted),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobApplication {
    pub id: Uuid,
    #[serde(rename = "user")]
    pub user_id: i64,
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub application_date: NaiveDate,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_url: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The client-writable columns of a job application, already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDraft {
    pub company_name: String,
    pub job_title: String,
    pub location: String,
    pub status: JobStatus,
    pub application_date: NaiveDate,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub job_url: String,
    pub notes: String,
}

/// List filters. `search` matches company name or job title, ignoring case.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub search: Option<String>,
}
