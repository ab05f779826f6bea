//! Interviews. They carry no owner of their own: every read and write is
//! scoped through the parent job application's owner.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::Principal;
use crate::errors::{AppError, FieldErrors};
use crate::models::interview::{Interview, InterviewDraft, InterviewType};
use crate::store::{InterviewStore, JobStore};
use crate::validation::check_max_len;

const MAX_OUTCOME_LEN: usize = 50;
pub const FOREIGN_JOB: &str = "job application does not belong to current user";
const BAD_DATETIME: &str =
    "Datetime has wrong format. Use one of these formats instead: YYYY-MM-DDThh:mm[:ss[.uuuuuu]][+HH:MM|-HH:MM|Z].";
const REQUIRED: &str = "This field is required.";

#[derive(Debug, Default, Deserialize)]
pub struct InterviewPayload {
    pub job: Option<String>,
    pub interview_type: Option<String>,
    pub date: Option<String>,
    pub outcome: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InterviewListQuery {
    pub job: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Interview not found".to_string())
}

fn parse_job_id(errors: &mut FieldErrors, raw: &str) -> Option<Uuid> {
    match Uuid::parse_str(raw.trim()) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add("job", format!("\"{raw}\" is not a valid UUID."));
            None
        }
    }
}

/// Accepts `YYYY-MM-DDThh:mm[:ss[.uuuuuu]]` with an optional `Z` or `±HH:MM`
/// offset. Values without an offset are taken as UTC.
fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    let with_offset = match raw.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => raw.to_string(),
    };
    for format in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"] {
        if let Ok(date) = DateTime::parse_from_str(&with_offset, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S%.f"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Validates `payload` into a draft. With `partial` set, absent fields keep
/// their value from `current`.
pub fn build_interview_draft(
    payload: InterviewPayload,
    current: Option<&Interview>,
    partial: bool,
) -> Result<InterviewDraft, AppError> {
    let mut errors = FieldErrors::new();
    let keep = if partial { current } else { None };

    let job_id = match payload.job {
        Some(raw) => parse_job_id(&mut errors, &raw),
        None => keep.map(|i| i.job_id).or_else(|| {
            errors.add("job", REQUIRED);
            None
        }),
    };

    let interview_type = match payload.interview_type {
        Some(raw) => match raw.trim().parse::<InterviewType>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                errors.add("interview_type", e.to_string());
                None
            }
        },
        None => keep.map(|i| i.interview_type).or_else(|| {
            errors.add("interview_type", REQUIRED);
            None
        }),
    };

    let date = match payload.date {
        Some(raw) => parse_datetime(&raw).or_else(|| {
            errors.add("date", BAD_DATETIME);
            None
        }),
        None => keep.map(|i| i.date).or_else(|| {
            errors.add("date", REQUIRED);
            None
        }),
    };

    let outcome = match payload.outcome {
        Some(v) => v.trim().to_string(),
        None => current.map(|i| i.outcome.clone()).unwrap_or_default(),
    };
    check_max_len(&mut errors, "outcome", &outcome, MAX_OUTCOME_LEN);

    let notes = payload
        .notes
        .or_else(|| current.map(|i| i.notes.clone()))
        .unwrap_or_default();

    errors.into_result()?;

    match (job_id, interview_type, date) {
        (Some(job_id), Some(interview_type), Some(date)) => Ok(InterviewDraft {
            job_id,
            interview_type,
            date,
            outcome,
            notes,
        }),
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "interview draft incomplete without a recorded field error"
        ))),
    }
}

fn foreign_job() -> AppError {
    AppError::validation("job", FOREIGN_JOB)
}

/// Rejects a parent job the principal does not own. The id may well exist,
/// so this is a validation failure rather than a not-found.
async fn ensure_job_owned<S>(store: &S, principal: &Principal, job_id: Uuid) -> Result<(), AppError>
where
    S: JobStore + ?Sized,
{
    if store.get_job(principal.user_id, job_id).await?.is_none() {
        warn!(
            "User {} referenced job application {} they do not own",
            principal.user_id, job_id
        );
        return Err(foreign_job());
    }
    Ok(())
}

/// Ordered by date, earliest first. `job` narrows the list to one application.
pub async fn list_interviews<S>(
    store: &S,
    principal: &Principal,
    query: InterviewListQuery,
) -> Result<Vec<Interview>, AppError>
where
    S: InterviewStore + ?Sized,
{
    let mut errors = FieldErrors::new();
    let job_id = query
        .job
        .filter(|j| !j.trim().is_empty())
        .and_then(|j| parse_job_id(&mut errors, &j));
    errors.into_result()?;

    Ok(store.list_interviews(principal.user_id, job_id).await?)
}

pub async fn get_interview<S>(store: &S, principal: &Principal, id: i64) -> Result<Interview, AppError>
where
    S: InterviewStore + ?Sized,
{
    store
        .get_interview(principal.user_id, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn create_interview<S>(
    store: &S,
    principal: &Principal,
    payload: InterviewPayload,
) -> Result<Interview, AppError>
where
    S: InterviewStore + JobStore + ?Sized,
{
    let draft = build_interview_draft(payload, None, false)?;
    ensure_job_owned(store, principal, draft.job_id).await?;

    // The insert re-checks ownership itself, so a job deleted or reassigned in
    // between still writes nothing.
    let interview = store
        .insert_interview(principal.user_id, &draft)
        .await?
        .ok_or_else(foreign_job)?;
    info!(
        "User {} scheduled interview {} for job application {}",
        principal.user_id, interview.id, interview.job_id
    );
    Ok(interview)
}

pub async fn update_interview<S>(
    store: &S,
    principal: &Principal,
    id: i64,
    payload: InterviewPayload,
    partial: bool,
) -> Result<Interview, AppError>
where
    S: InterviewStore + JobStore + ?Sized,
{
    let current = get_interview(store, principal, id).await?;
    let draft = build_interview_draft(payload, Some(&current), partial)?;
    if draft.job_id != current.job_id {
        ensure_job_owned(store, principal, draft.job_id).await?;
    }
    store
        .update_interview(principal.user_id, id, &draft)
        .await?
        .ok_or_else(not_found)
}

pub async fn delete_interview<S>(store: &S, principal: &Principal, id: i64) -> Result<(), AppError>
where
    S: InterviewStore + ?Sized,
{
    if !store.delete_interview(principal.user_id, id).await? {
        return Err(not_found());
    }
    info!("User {} deleted interview {}", principal.user_id, id);
    Ok(())
}
