use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::interview::{Interview, InterviewDraft};
use crate::models::job::{JobApplication, JobDraft, JobFilter};
use crate::models::profile::{Profile, ProfileChanges};
use crate::models::resume::{NewResume, Resume};
use crate::models::user::{NewUser, User};
use crate::store::{
    like_pattern, InterviewStore, JobStore, ProfileStore, ResumeStore, StoreError, StoreResult,
    UserStore,
};

/// Postgres-backed store. Every multi-row write runs in a single transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

/// Maps unique-constraint violations on `users` to the input field that collided.
fn map_user_conflict(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = match db_err.constraint() {
                Some(name) if name.contains("email") => "email",
                _ => "username",
            };
            return StoreError::Conflict { field };
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_login(&self, identifier: &str) -> StoreResult<Vec<User>> {
        Ok(sqlx::query_as::<_, User>(
            r#"
            SELECT *
            FROM users
            WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)
            ORDER BY id
            "#,
        )
        .bind(identifier)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_user(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn create_user_with_profile(&self, new_user: &NewUser) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_user_conflict)?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1)")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Created user {} with empty profile", user.id);
        Ok(user)
    }

    async fn set_password_hash(&self, id: i64, password_hash: &str) -> StoreResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_or_create_profile(&self, user_id: i64) -> StoreResult<Profile> {
        // The primary key on user_id makes concurrent first access converge on one row.
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> StoreResult<(User, Profile)> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let profile = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET bio = COALESCE($2, bio),
                phone_number = COALESCE($3, phone_number),
                linkedin_url = COALESCE($4, linkedin_url),
                portfolio_url = COALESCE($5, portfolio_url),
                avatar_key = COALESCE($6, avatar_key),
                notification_email_updates = COALESCE($7, notification_email_updates),
                notification_job_alerts = COALESCE($8, notification_job_alerts)
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(changes.bio.as_deref())
        .bind(changes.phone_number.as_deref())
        .bind(changes.linkedin_url.as_deref())
        .bind(changes.portfolio_url.as_deref())
        .bind(changes.avatar_key.as_deref())
        .bind(changes.notification_email_updates)
        .bind(changes.notification_job_alerts)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((user, profile))
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn list_resumes(&self, owner: i64) -> StoreResult<Vec<Resume>> {
        Ok(sqlx::query_as::<_, Resume>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(
            sqlx::query_as::<_, Resume>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(owner)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_resume(&self, owner: i64, resume: &NewResume) -> StoreResult<Resume> {
        Ok(sqlx::query_as::<_, Resume>(
            r#"
            INSERT INTO resumes (id, user_id, file_key, filename)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(resume.id)
        .bind(owner)
        .bind(&resume.file_key)
        .bind(&resume.filename)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_resume(&self, owner: i64, id: Uuid) -> StoreResult<Option<Resume>> {
        Ok(sqlx::query_as::<_, Resume>(
            "DELETE FROM resumes WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }
}

#[async_trait]
impl JobStore for PgStore {
    async fn list_jobs(&self, owner: i64, filter: &JobFilter) -> StoreResult<Vec<JobApplication>> {
        let search = filter.search.as_deref().map(like_pattern);
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            SELECT *
            FROM job_applications
            WHERE user_id = $1
              AND ($2::TEXT IS NULL OR status = $2)
              AND ($3::TEXT IS NULL OR company_name ILIKE $3 OR job_title ILIKE $3)
            ORDER BY application_date DESC, created_at DESC
            "#,
        )
        .bind(owner)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(search)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_job(&self, owner: i64, id: Uuid) -> StoreResult<Option<JobApplication>> {
        Ok(sqlx::query_as::<_, JobApplication>(
            "SELECT * FROM job_applications WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_job(&self, owner: i64, draft: &JobDraft) -> StoreResult<JobApplication> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            INSERT INTO job_applications
                (id, user_id, company_name, job_title, location, status,
                 application_date, salary_min, salary_max, job_url, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(&draft.company_name)
        .bind(&draft.job_title)
        .bind(&draft.location)
        .bind(draft.status.as_str())
        .bind(draft.application_date)
        .bind(draft.salary_min)
        .bind(draft.salary_max)
        .bind(&draft.job_url)
        .bind(&draft.notes)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_job(
        &self,
        owner: i64,
        id: Uuid,
        draft: &JobDraft,
    ) -> StoreResult<Option<JobApplication>> {
        Ok(sqlx::query_as::<_, JobApplication>(
            r#"
            UPDATE job_applications
            SET company_name = $3,
                job_title = $4,
                location = $5,
                status = $6,
                application_date = $7,
                salary_min = $8,
                salary_max = $9,
                job_url = $10,
                notes = $11,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(&draft.company_name)
        .bind(&draft.job_title)
        .bind(&draft.location)
        .bind(draft.status.as_str())
        .bind(draft.application_date)
        .bind(draft.salary_min)
        .bind(draft.salary_max)
        .bind(&draft.job_url)
        .bind(&draft.notes)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, owner: i64, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM job_applications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn list_interviews(
        &self,
        owner: i64,
        job_id: Option<Uuid>,
    ) -> StoreResult<Vec<Interview>> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            SELECT i.*
            FROM interviews i
            JOIN job_applications j ON j.id = i.job_id
            WHERE j.user_id = $1
              AND ($2::UUID IS NULL OR i.job_id = $2)
            ORDER BY i.date, i.id
            "#,
        )
        .bind(owner)
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_interview(&self, owner: i64, id: i64) -> StoreResult<Option<Interview>> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            SELECT i.*
            FROM interviews i
            JOIN job_applications j ON j.id = i.job_id
            WHERE i.id = $1 AND j.user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_interview(
        &self,
        owner: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>> {
        // The ownership check and the insert are one statement: no row is written
        // unless the parent job belongs to the owner at that instant.
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            INSERT INTO interviews (job_id, interview_type, date, outcome, notes)
            SELECT j.id, $3, $4, $5, $6
            FROM job_applications j
            WHERE j.id = $1 AND j.user_id = $2
            RETURNING *
            "#,
        )
        .bind(draft.job_id)
        .bind(owner)
        .bind(draft.interview_type.as_str())
        .bind(draft.date)
        .bind(&draft.outcome)
        .bind(&draft.notes)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn update_interview(
        &self,
        owner: i64,
        id: i64,
        draft: &InterviewDraft,
    ) -> StoreResult<Option<Interview>> {
        Ok(sqlx::query_as::<_, Interview>(
            r#"
            UPDATE interviews i
            SET job_id = $3,
                interview_type = $4,
                date = $5,
                outcome = $6,
                notes = $7
            FROM job_applications current_job
            WHERE i.id = $1
              AND current_job.id = i.job_id
              AND current_job.user_id = $2
              AND EXISTS (
                  SELECT 1 FROM job_applications target_job
                  WHERE target_job.id = $3 AND target_job.user_id = $2
              )
            RETURNING i.*
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(draft.job_id)
        .bind(draft.interview_type.as_str())
        .bind(draft.date)
        .bind(&draft.outcome)
        .bind(&draft.notes)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_interview(&self, owner: i64, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM interviews i
            USING job_applications j
            WHERE i.id = $1 AND j.id = i.job_id AND j.user_id = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
