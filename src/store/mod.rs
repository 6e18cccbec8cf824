//! Remote backend collaborators.
//!
//! The hosted backend is reached only through these traits:
//!
//! - `JobStore`: feed queries and job mutations
//! - `ApplicationStore`: applications and saved jobs
//! - `AlertStore`: job alerts and their notifications
//! - `FileStore`: public object storage
//! - `ChangeFeed`: optional row-change notifications
//!
//! `RestStore` talks to a PostgREST-style data API; `MemoryStore` keeps the
//! tables in process for tests and demos. Mutations are owner-scoped, and a
//! unique-constraint violation is always reported as
//! `AppError::AlreadyExists`, whatever code the backend used.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::models::{
    Application, ApplicationEntry, ApplicationStatus, Job, JobAlert, JobNotification, JobUpdate,
    NewApplication, NewJob, NewJobAlert, Page, SavedJob, SavedJobEntry,
};
use crate::query::JobQuery;

// Re-export for convenience
pub use memory::MemoryStore;
pub use rest::RestStore;

/// Table names on the backend.
pub mod tables {
    pub const JOBS: &str = "jobs";
    pub const APPLICATIONS: &str = "applications";
    pub const SAVED_JOBS: &str = "saved_jobs";
    pub const JOB_ALERTS: &str = "job_alerts";
    pub const JOB_NOTIFICATIONS: &str = "job_notifications";
}

/// Job queries and mutations.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Execute a composed query, returning one page and the total match count.
    async fn fetch_jobs(&self, query: &JobQuery) -> Result<Page>;

    /// Distinct, sorted locations of active jobs.
    async fn distinct_locations(&self) -> Result<Vec<String>>;

    /// Load a single job by primary key.
    async fn get_job(&self, id: &str) -> Result<Job>;

    /// Every job posted by `employer_id`, inactive included, newest first.
    async fn jobs_by_employer(&self, employer_id: &str) -> Result<Vec<Job>>;

    async fn insert_job(&self, job: &NewJob) -> Result<Job>;

    /// Update a job owned by `employer_id`.
    async fn update_job(&self, id: &str, employer_id: &str, update: &JobUpdate) -> Result<Job>;

    /// Delete a job owned by `employer_id`.
    async fn delete_job(&self, id: &str, employer_id: &str) -> Result<()>;
}

/// Applications and saved jobs.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Fails with `AlreadyExists` when the applicant already applied.
    async fn insert_application(&self, application: &NewApplication) -> Result<Application>;

    async fn find_application(&self, job_id: &str, applicant_id: &str)
    -> Result<Option<Application>>;

    /// Applications received for a job, newest first.
    async fn list_applications(&self, job_id: &str) -> Result<Vec<Application>>;

    /// Applications sent by `applicant_id` with their postings, newest first.
    async fn applications_by_applicant(&self, applicant_id: &str)
    -> Result<Vec<ApplicationEntry>>;

    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> Result<()>;

    /// Fails with `AlreadyExists` when the job is already saved.
    async fn insert_saved_job(&self, user_id: &str, job_id: &str) -> Result<SavedJob>;

    async fn delete_saved_job(&self, user_id: &str, job_id: &str) -> Result<()>;

    async fn find_saved_job(&self, user_id: &str, job_id: &str) -> Result<Option<SavedJob>>;

    /// Saved jobs with their postings, newest first.
    async fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<SavedJobEntry>>;

    async fn count_saved_jobs(&self, user_id: &str) -> Result<usize>;
}

/// Job alerts and notifications.
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn active_alerts(&self) -> Result<Vec<JobAlert>>;

    async fn insert_alert(&self, alert: &NewJobAlert) -> Result<JobAlert>;

    async fn insert_notifications(&self, notifications: &[JobNotification]) -> Result<()>;

    /// A user's alerts, newest first.
    async fn alerts_for(&self, user_id: &str) -> Result<Vec<JobAlert>>;

    /// A user's most recent notifications, newest first.
    async fn notifications_for(&self, user_id: &str, limit: usize)
    -> Result<Vec<JobNotification>>;

    /// Mark a notification owned by `user_id` as read.
    async fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<()>;

    /// Pause or resume an alert owned by `user_id`.
    async fn set_alert_active(&self, alert_id: &str, user_id: &str, active: bool) -> Result<()>;

    /// Delete an alert owned by `user_id`.
    async fn delete_alert(&self, alert_id: &str, user_id: &str) -> Result<()>;
}

/// Public object storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store bytes under `bucket/path` and return a publicly resolvable URL.
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String>;
}

/// Kind of row change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A row-level change on a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

/// Best-effort row-change notifications. Nothing depends on it for correctness.
pub trait ChangeFeed: Send + Sync {
    fn changes(&self, table: &str) -> BoxStream<'static, Result<ChangeEvent>>;
}
