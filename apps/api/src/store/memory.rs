//! In-process store used by the unit tests. Mirrors the ownership predicates
//! and uniqueness rules of `PgStore`; one mutex stands in for transactions.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::models::interview::{Interview, InterviewDraft};
use crate::models::job::{JobApplication, JobDraft, JobFilter};
use crate::models::profile::{Profile, ProfileChanges};
use crate::models::resume::{NewResume, Resume};
use crate::models::user::{NewUser, User};
use crate::store::{
    InterviewStore, JobStore, ProfileStore, ResumeStore, StoreError, StoreResult, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: HashMap<i64, Profile>,
    resumes: Vec<Resume>,
    jobs: Vec<JobApplication>,
    interviews: Vec<Interview>,
    next_user_id: i64,
    next_interview_id: i64,
}

impl Tables {
    fn owns_job(&self, owner: i64, job_id: Uuid) -> bool {
        self.jobs
            .iter()
            .any(|j| j.id == job_id && j.user_id == owner)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a user row directly, bypassing uniqueness checks and the profile.
    /// Lets tests construct states registration would never produce.
    pub fn insert_raw_user(&self, mut user: User) -> User {
        let mut t = self.tables.lock().unwrap();
        t.next_user_id += 1;
        user.id = t.next_user_id;
        t.users.push(user.clone());
        user
    }

    pub fn set_active(&self, user_id: i64, active: bool) {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }

    pub fn profile_count(&self, user_id: i64) -> usize {
        let t = self.tables.lock().unwrap();
        usize::from(t.profiles.contains_key(&user_id))
    }

    pub fn total_profiles(&self) -> usize {
        self.tables.lock().unwrap().profiles.len()
    }

    pub fn total_interviews(&self) -> usize {
        self.tables.lock().unwrap().interviews.len()
    }

    pub fn remove_profile(&self, user_id: i64) {
        self.tables.lock().unwrap().profiles.remove(&user_id);
    }
}

fn matches_filter(filter: &JobFilter, job: &JobApplication) -> bool {
    if let Some(status) = filter.status {
        if job.status != status {
            return false;
        }
    }
    match &filter.search {
        Some(term) => {
            let term = term.to_lowercase();
            job.company_name.to_lowercase().contains(&term)
                || job.job_title.to_lowercase().contains(&term)
        }
        None => true,
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_login(&self, identifier: &str) -> StoreResult<Vec<User>> {
        let t = self.tables.lock().unwrap();
        let needle = identifier.to_lowercase();
        let mut found: Vec<User> = t
            .users
            .iter()
            .filter(|u| u.username.to_lowercase() == needle || u.email.to_lowercase() == needle)
            .cloned()
            .collect();
        found.sort_by_key(|u| u.id);
        Ok(found)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        let t = self.tables.lock().unwrap();
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user_with_profile(&self, new_user: &NewUser) -> StoreResult<User> {
        let mut t = self.tables.lock().unwrap();
        let username = new_user.username.to_lowercase();
        if t.users.iter().any(|u| u.username.to_lowercase() == username) {
            return Err(StoreError::Conflict { field: "username" });
        }
        if !new_user.email.is_empty()
            && t
                .users
                .iter()
                .any(|u| u.email.to_lowercase() == new_user.email.to_lowercase())
        {
            return Err(StoreError::Conflict { field: "email" });
        }

        t.next_user_id += 1;
        let user = User {
            id: t.next_user_id,
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            date_joined: Utc::now(),
        };
        t.users.push(user.clone());
        t.profiles.insert(user.id, Profile::empty(user.id));
        Ok(user)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        let mut t = self.tables.lock().unwrap();
        if let Some(user) = t.users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_or_create_profile(&self, user_id: i64) -> StoreResult<Profile> {
        let mut t = self.tables.lock().unwrap();
        Ok(t.profiles
            .entry(user_id)
            .or_insert_with(|| Profile::empty(user_id))
            .clone())
    }

    async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<(User, Profile)> {
        let mut t = self.tables.lock().unwrap();
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        let user = user.clone();

        let profile = t
            .profiles
            .entry(user_id)
            .or_insert_with(|| Profile::empty(user_id));
        if let Some(bio) = &changes.bio {
            profile.bio = bio.clone();
        }
        if let Some(phone_number) = &changes.phone_number {
            profile.phone_number = phone_number.clone();
        }
        if let Some(linkedin_url) = &changes.linkedin_url {
            profile.linkedin_url = linkedin_url.clone();
        }
        if let Some(portfolio_url) = &changes.portfolio_url {
            profile.portfolio_url = portfolio_url.clone();
        }
        if let Some(avatar_key) = &changes.avatar_key {
            profile.avatar_key = Some(avatar_key.clone());
        }
        if let Some(flag) = changes.notification_email_updates {
            profile.notification_email_updates = flag;
        }
        if let Some(flag) = changes.notification_job_alerts {
            profile.notification_job_alerts = flag;
        }
        Ok((user, profile.clone()))
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn list_resumes(&self, owner: i64) -> StoreResult<Vec<Resume>> {
        let t = self.tables.lock().unwrap();
        let mut resumes: Vec<Resume> = t
            .resumes
            .iter()
            .filter(|r| r.user_id == owner)
            .cloned()
            .collect();
        resumes.reverse();
        resumes.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(resumes)
    }

    async fn get_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>> {
        let t = self.tables.lock().unwrap();
        Ok(t.resumes
            .iter()
            .find(|r| r.id == id && r.user_id == owner)
            .cloned())
    }

    async fn insert_resume(&self, owner: i64, resume: &NewResume) -> StoreResult<Resume> {
        let mut t = self.tables.lock().unwrap();
        let row = Resume {
            id: resume.id,
            user_id: owner,
            file_key: resume.file_key.clone(),
            filename: resume.filename.clone(),
            uploaded_at: Utc::now(),
        };
        t.resumes.push(row.clone());
        Ok(row)
    }

    async fn delete_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>> {
        let mut t = self.tables.lock().unwrap();
        let position = t
            .resumes
            .iter()
            .position(|r| r.id == id && r.user_id == owner);
        Ok(position.map(|i| t.resumes.remove(i)))
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list_jobs(&self, owner: i64, filter: &JobFilter) -> StoreResult<Vec<JobApplication>> {
        let t = self.tables.lock().unwrap();
        let mut jobs: Vec<JobApplication> = t
            .jobs
            .iter()
            .filter(|j| j.user_id == owner && matches_filter(filter, j))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| {
            b.application_date
                .cmp(&a.application_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(jobs)
    }

    async fn get_job(&self, owner: i64, id: Uuid) -> StoreResult<Option<JobApplication>> {
        let t = self.tables.lock().unwrap();
        Ok(t.jobs
            .iter()
            .find(|j| j.id == id && j.user_id == owner)
            .cloned())
    }

    async fn insert_job(&self, owner: i64, draft: &JobDraft) -> StoreResult<JobApplication> {
        let mut t = self.tables.lock().unwrap();
        let now = Utc::now();
        let job = JobApplication {
            id: Uuid::new_v4(),
            user_id: owner,
            company_name: draft.company_name.clone(),
            job_title: draft.job_title.clone(),
            location: draft.location.clone(),
            status: draft.status,
            application_date: draft.application_date,
            salary_min: draft.salary_min,
            salary_max: draft.salary_max,
            job_url: draft.job_url.clone(),
            notes: draft.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        t.jobs.push(job.clone());
        Ok(job)
    }

    async fn update_job(
        &self,
        owner: i64,
        id: Uuid,
        draft: &JobDraft,
    ) -> StoreResult<Option<JobApplication>> {
        let mut t = self.tables.lock().unwrap();
        let Some(job) = t
            .jobs
            .iter_mut()
            .find(|j| j.id == id && j.user_id == owner)
        else {
            return Ok(None);
        };
        job.company_name = draft.company_name.clone();
        job.job_title = draft.job_title.clone();
        job.location = draft.location.clone();
        job.status = draft.status;
        job.application_date = draft.application_date;
        job.salary_min = draft.salary_min;
        job.salary_max = draft.salary_max;
        job.job_url = draft.job_url.clone();
        job.notes = draft.notes.clone();
        job.updated_at = Utc::now();
        Ok(Some(job.clone()))
    }

    async fn delete_job(&self, owner: i64, id: Uuid) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let before = t.jobs.len();
        t.jobs.retain(|j| !(j.id == id && j.user_id == owner));
        let deleted = t.jobs.len() < before;
        if deleted {
            t.interviews.retain(|i| i.job_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn list_interviews(
        &self,
        owner: i64,
        job_id: Option<Uuid>,
    ) -> StoreResult<Vec<Interview>> {
        let t = self.tables.lock().unwrap();
        let mut interviews: Vec<Interview> = t
            .interviews
            .iter()
            .filter(|i| t.owns_job(owner, i.job_id) && job_id.map_or(true, |j| i.job_id == j))
            .cloned()
            .collect();
        interviews.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        Ok(interviews)
    }

    async fn get_interview(&self, owner: i64, id: i64) -> StoreResult<Option<Interview>> {
        let t = self.tables.lock().unwrap();
        Ok(t.interviews
            .iter()
            .find(|i| i.id == id && t.owns_job(owner, i.job_id))
            .cloned())
    }

    async fn insert_interview(
        &self,
        owner: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>> {
        let mut t = self.tables.lock().unwrap();
        if !t.owns_job(owner, draft.job_id) {
            return Ok(None);
        }
        t.next_interview_id += 1;
        let interview = Interview {
            id: t.next_interview_id,
            job_id: draft.job_id,
            interview_type: draft.interview_type,
            date: draft.date,
            outcome: draft.outcome.clone(),
            notes: draft.notes.clone(),
        };
        t.interviews.push(interview.clone());
        Ok(Some(interview))
    }

    async fn update_interview(
        &self,
        owner: i64,
        id: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>> {
        let mut t = self.tables.lock().unwrap();
        if !t.owns_job(owner, draft.job_id) {
            return Ok(None);
        }
        let Some(position) = t
            .interviews
            .iter()
            .position(|i| i.id == id && t.owns_job(owner, i.job_id))
        else {
            return Ok(None);
        };
        let interview = &mut t.interviews[position];
        interview.job_id = draft.job_id;
        interview.interview_type = draft.interview_type;
        interview.date = draft.date;
        interview.outcome = draft.outcome.clone();
        interview.notes = draft.notes.clone();
        Ok(Some(interview.clone()))
    }

    async fn delete_interview(&self, owner: i64, id: i64) -> StoreResult<bool> {
        let mut t = self.tables.lock().unwrap();
        let Some(position) = t
            .interviews
            .iter()
            .position(|i| i.id == id && t.owns_job(owner, i.job_id))
        else {
            return Ok(false);
        };
        t.interviews.remove(position);
        Ok(true)
    }
}
