//! Job applications, scoped to their owner.
//!
//! `id`, `user`, `created_at` and `updated_at` are not part of the payload
//! type at all, so anything a client sends for them is dropped on
//! deserialization.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use tracing::info;
use uuid::Uuid;

use crate::auth::Principal;
use crate::errors::{AppError, FieldErrors};
use crate::models::job::{JobApplication, JobDraft, JobFilter, JobStatus};
use crate::store::JobStore;
use crate::validation::{check_max_len, check_url, require_text};

const MAX_TEXT_LEN: usize = 255;
const MAX_URL_LEN: usize = 200;
const DATE_FORMAT: &str = "%Y-%m-%d";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

/// Distinguishes an absent key (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct JobApplicationPayload {
    pub company_name: Option<String>,
    pub job_title: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub application_date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary_min: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary_max: Option<Option<i32>>,
    pub job_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JobListQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

fn not_found() -> AppError {
    AppError::NotFound("Job application not found".to_string())
}

fn parse_status(errors: &mut FieldErrors, raw: &str) -> Option<JobStatus> {
    match raw.trim().parse::<JobStatus>() {
        Ok(status) => Some(status),
        Err(e) => {
            errors.add("status", e.to_string());
            None
        }
    }
}

/// Validates `payload` into a draft.
///
/// With `partial` set, absent fields keep their value from `current`; otherwise
/// the required fields must be present and the rest fall back to `current` (or
/// to their defaults when creating).
pub fn build_job_draft(
    payload: JobApplicationPayload,
    current: Option<&JobApplication>,
    partial: bool,
) -> Result<JobDraft, AppError> {
    let mut errors = FieldErrors::new();
    let keep = partial && current.is_some();

    let mut required = |field: &str, value: Option<String>, existing: Option<&String>| {
        match (value, existing) {
            (None, Some(existing)) if keep => Some(existing.clone()),
            (value, _) => require_text(&mut errors, field, value, MAX_TEXT_LEN),
        }
    };
    let company_name = required(
        "company_name",
        payload.company_name,
        current.map(|j| &j.company_name),
    );
    let job_title = required("job_title", payload.job_title, current.map(|j| &j.job_title));

    let application_date = match payload.application_date {
        Some(raw) => match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(_) => {
                errors.add("application_date", BAD_DATE);
                None
            }
        },
        None if keep => current.map(|j| j.application_date),
        None => {
            errors.add("application_date", "This field is required.");
            None
        }
    };

    let status = match payload.status {
        Some(raw) => parse_status(&mut errors, &raw),
        None => Some(current.map(|j| j.status).unwrap_or_default()),
    };

    let location = match payload.location {
        Some(v) => v.trim().to_string(),
        None => current.map(|j| j.location.clone()).unwrap_or_default(),
    };
    check_max_len(&mut errors, "location", &location, MAX_TEXT_LEN);

    let job_url = match payload.job_url {
        Some(v) => v.trim().to_string(),
        None => current.map(|j| j.job_url.clone()).unwrap_or_default(),
    };
    check_url(&mut errors, "job_url", &job_url, MAX_URL_LEN);

    let notes = payload
        .notes
        .or_else(|| current.map(|j| j.notes.clone()))
        .unwrap_or_default();
    let salary_min = payload
        .salary_min
        .unwrap_or_else(|| current.and_then(|j| j.salary_min));
    let salary_max = payload
        .salary_max
        .unwrap_or_else(|| current.and_then(|j| j.salary_max));

    errors.into_result()?;

    match (company_name, job_title, status, application_date) {
        (Some(company_name), Some(job_title), Some(status), Some(application_date)) => {
            Ok(JobDraft {
                company_name,
                job_title,
                location,
                status,
                application_date,
                salary_min,
                salary_max,
                job_url,
                notes,
            })
        }
        _ => Err(AppError::Internal(anyhow::anyhow!(
            "job draft incomplete without a recorded field error"
        ))),
    }
}

/// Newest application date first. `status` must name one of the five statuses.
pub async fn list_jobs<S>(
    store: &S,
    principal: &Principal,
    query: JobListQuery,
) -> Result<Vec<JobApplication>, AppError>
where
    S: JobStore + ?Sized,
{
    let mut errors = FieldErrors::new();
    let status = query
        .status
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| parse_status(&mut errors, &s));
    errors.into_result()?;

    let filter = JobFilter {
        status,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    Ok(store.list_jobs(principal.user_id, &filter).await?)
}

pub async fn get_job<S>(store: &S, principal: &Principal, id: Uuid) -> Result<JobApplication, AppError>
where
    S: JobStore + ?Sized,
{
    store
        .get_job(principal.user_id, id)
        .await?
        .ok_or_else(not_found)
}

pub async fn create_job<S>(
    store: &S,
    principal: &Principal,
    payload: JobApplicationPayload,
) -> Result<JobApplication, AppError>
where
    S: JobStore + ?Sized,
{
    let draft = build_job_draft(payload, None, false)?;
    let job = store.insert_job(principal.user_id, &draft).await?;
    info!("User {} created job application {}", principal.user_id, job.id);
    Ok(job)
}

pub async fn update_job<S>(
    store: &S,
    principal: &Principal,
    id: Uuid,
    payload: JobApplicationPayload,
    partial: bool,
) -> Result<JobApplication, AppError>
where
    S: JobStore + ?Sized,
{
    let current = get_job(store, principal, id).await?;
    let draft = build_job_draft(payload, Some(&current), partial)?;
    store
        .update_job(principal.user_id, id, &draft)
        .await?
        .ok_or_else(not_found)
}

pub async fn delete_job<S>(store: &S, principal: &Principal, id: Uuid) -> Result<(), AppError>
where
    S: JobStore + ?Sized,
{
    if !store.delete_job(principal.user_id, id).await? {
        return Err(not_found());
    }
    info!("User {} deleted job application {}", principal.user_id, id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::testing;

    fn payload(json: serde_json::Value) -> JobApplicationPayload {
        serde_json::from_value(json).unwrap()
    }

    fn acme() -> JobApplicationPayload {
        payload(serde_json::json!({
            "company_name": "Acme",
            "job_title": "Backend Engineer",
            "application_date": "2024-03-01"
        }))
    }

    #[tokio::test]
    async fn test_status_defaults_to_applied() {
        let store = MemoryStore::new();
        let (_, principal) = testing::user(&store, "alice").await;

        let job = create_job(&store, &principal, acme()).await.unwrap();

        assert_eq!(job.status, JobStatus::Applied);
        assert_eq!(job.user_id, principal.user_id);
        assert_eq!(job.location, "");
        assert!(job.salary_min.is_none());
    }

    #[tokio::test]
    async fn test_invalid_status_is_rejected() {
        let store = MemoryStore::new();
        let (_, principal) = testing::user(&store, "alice").await;
        let mut body = acme();
        body.status = Some("HIRED".into());

        let err = create_job(&store, &principal, body).await.unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert_eq!(
                    fields.get("status").unwrap(),
                    ["\"HIRED\" is not a valid choice."]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(list_jobs(&store, &principal, JobListQuery::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_server_managed_fields_are_ignored() {
        let store = MemoryStore::new();
        let (_, alice) = testing::user(&store, "alice").await;
        let (bob, _) = testing::user(&store, "bob").await;
        let forged = Uuid::new_v4();

        let body = payload(serde_json::json!({
            "id": forged,
            "user": bob.id,
            "created_at": "2001-01-01T00:00:00Z",
            "company_name": "Acme",
            "job_title": "Backend Engineer",
            "application_date": "2024-03-01"
        }));
        let job = create_job(&store, &alice, body).await.unwrap();

        assert_ne!(job.id, forged);
        assert_eq!(job.user_id, alice.user_id);
        assert!(job.created_at.timestamp() > 978_307_200);
    }

    #[tokio::test]
    async fn test_missing_required_fields() {
        let store = MemoryStore::new();
        let (_, principal) = testing::user(&store, "alice").await;

        let err = create_job(&store, &principal, JobApplicationPayload::default())
            .await
            .unwrap_err();

        match err {
            AppError::Validation(fields) => {
                assert!(fields.contains("company_name"));
                assert!(fields.contains("job_title"));
                assert!(fields.contains("application_date"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_users_job_is_not_found() {
        let store = MemoryStore::new();
        let (_, alice) = testing::user(&store, "alice").await;
        let (_, mallory) = testing::user(&store, "mallory").await;
        let job = create_job(&store, &alice, acme()).await.unwrap();

        assert!(matches!(
            get_job(&store, &mallory, job.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        let patch = payload(serde_json::json!({ "status": "OFFER" }));
        assert!(matches!(
            update_job(&store, &mallory, job.id, patch, true).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            delete_job(&store, &mallory, job.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));

        let unchanged = get_job(&store, &alice, job.id).await.unwrap();
        assert_eq!(unchanged.status, JobStatus::Applied);
    }

    #[tokio::test]
    async fn test_patch_merges_and_put_requires_fields() {
        let store = MemoryStore::new();
        let (_, principal) = testing::user(&store, "alice").await;
        let mut body = acme();
        body.salary_min = Some(Some(90_000));
        let job = create_job(&store, &principal, body).await.unwrap();

        let patch = payload(serde_json::json!({ "status": "INTERVIEW", "salary_min": null }));
        let updated = update_job(&store, &principal, job.id, patch, true)
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Interview);
        assert_eq!(updated.company_name, "Acme");
        assert!(updated.salary_min.is_none());

        let put = payload(serde_json::json!({ "status": "OFFER" }));
        let err = update_job(&store, &principal, job.id, put, false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(f) if f.contains("company_name")));
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_search() {
        let store = MemoryStore::new();
        let (_, principal) = testing::user(&store, "alice").await;
        create_job(&store, &principal, acme()).await.unwrap();
        let mut globex = payload(serde_json::json!({
            "company_name": "Globex",
            "job_title": "Data Engineer",
            "application_date": "2024-04-01",
            "status": "REJECTED"
        }));
        globex.notes = Some("referral".into());
        create_job(&store, &principal, globex).await.unwrap();

        let all = list_jobs(&store, &principal, JobListQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].company_name, "Globex");

        let rejected = list_jobs(
            &store,
            &principal,
            JobListQuery {
                status: Some("REJECTED".into()),
                search: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(rejected.len(), 1);

        let searched = list_jobs(
            &store,
            &principal,
            JobListQuery {
                status: None,
                search: Some("backend".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].company_name, "Acme");

        let err = list_jobs(
            &store,
            &principal,
            JobListQuery {
                status: Some("applied".into()),
                search: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_bad_date_and_url_are_field_errors() {
        let body = payload(serde_json::json!({
            "company_name": "Acme",
            "job_title": "Engineer",
            "application_date": "03/01/2024",
            "job_url": "acme careers"
        }));
        let err = build_job_draft(body, None, false).unwrap_err();
        match err {
            AppError::Validation(fields) => {
                assert_eq!(fields.get("application_date").unwrap(), [BAD_DATE]);
                assert!(fields.contains("job_url"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
