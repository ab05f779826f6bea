use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::job::InvalidChoice;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    Phone,
    Technical,
    Onsite,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Phone => "phone",
            InterviewType::Technical => "technical",
            InterviewType::Onsite => "onsite",
        }
    }
}

impl FromStr for InterviewType {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "phone" => Ok(InterviewType::Phone),
            "technical" => Ok(InterviewType::Technical),
            "onsite" => Ok(InterviewType::Onsite),
            other => Err(InvalidChoice(other.to_string())),
        }
    }
}

impl TryFrom<String> for InterviewType {
    type Error = InvalidChoice;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// An interview has no user column; it is owned through its job application.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Interview {
    pub id: i64,
    #[serde(rename = "job")]
    pub job_id: Uuid,
    #[sqlx(try_from = "String")]
    pub interview_type: InterviewType,
    pub date: DateTime<Utc>,
    pub outcome: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterviewDraft {
    pub job_id: Uuid,
    pub interview_type: InterviewType,
    pub date: DateTime<Utc>,
    pub outcome: String,
    pub notes: String,
}
