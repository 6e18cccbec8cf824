//! In-process store with the backend's semantics.
//!
//! Used by tests and by the CLI's demo mode. Queries run through
//! `JobQuery::execute`, unique keys mirror the backend's constraints
//! (`applications(job_id, applicant_id)`, `saved_jobs(user_id, job_id)`)
//! and every mutation is announced on the change feed.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt};
use tokio::sync::broadcast;

use crate::error::{AppError, Result};
use crate::models::{
    Application, ApplicationEntry, ApplicationStatus, Job, JobAlert, JobNotification, JobUpdate,
    NewApplication, NewJob, NewJobAlert, Page, SavedJob, SavedJobEntry,
};
use crate::query::JobQuery;
use crate::store::{
    AlertStore, ApplicationStore, ChangeEvent, ChangeFeed, ChangeKind, FileStore, JobStore,
    tables,
};

#[derive(Default)]
struct Tables {
    jobs: Vec<Job>,
    applications: Vec<Application>,
    saved_jobs: Vec<SavedJob>,
    alerts: Vec<JobAlert>,
    notifications: Vec<JobNotification>,
    objects: HashMap<String, (Vec<u8>, String)>,
    /// Error code for injected fetch failures, `503` when unset
    failure_code: Option<String>,
    next_id: u64,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory backend.
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    changes: broadcast::Sender<ChangeEvent>,
    fetches: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            changes,
            fetches: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Store pre-populated with job rows (kept as given, ids included).
    pub fn with_jobs(jobs: impl IntoIterator<Item = Job>) -> Self {
        let store = Self::new();
        store.tables().jobs.extend(jobs);
        store
    }

    /// Add an alert row.
    pub fn seed_alert(&self, alert: JobAlert) {
        self.tables().alerts.push(alert);
    }

    /// Number of `fetch_jobs` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Make the next `n` `fetch_jobs` calls fail with a `503` remote error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.tables().failure_code = None;
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` `fetch_jobs` calls fail with the given backend code.
    pub fn reject_next_fetches(&self, n: usize, code: &str) {
        self.tables().failure_code = Some(code.to_string());
        self.failures.store(n, Ordering::SeqCst);
    }

    /// Notifications written so far.
    pub fn notifications(&self) -> Vec<JobNotification> {
        self.tables().notifications.clone()
    }

    /// Stored object bytes and content type.
    pub fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.tables().objects.get(&format!("{bucket}/{path}")).cloned()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn announce(&self, table: &str, kind: ChangeKind) {
        // No receivers is fine
        let _ = self.changes.send(ChangeEvent {
            table: table.to_string(),
            kind,
        });
    }

    fn take_failure(&self) -> bool {
        self.failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn fetch_jobs(&self, query: &JobQuery) -> Result<Page> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.take_failure() {
            let code = self.tables().failure_code.clone();
            return Err(AppError::remote(
                code.unwrap_or_else(|| "503".to_string()),
                "injected failure",
            ));
        }
        Ok(query.execute(self.tables().jobs.iter()))
    }

    async fn distinct_locations(&self) -> Result<Vec<String>> {
        let unique: BTreeSet<String> = self
            .tables()
            .jobs
            .iter()
            .filter(|j| j.is_active && !j.location.trim().is_empty())
            .map(|j| j.location.clone())
            .collect();
        Ok(unique.into_iter().collect())
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        self.tables()
            .jobs
            .iter()
            .find(|j| j.id == id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("job {id}")))
    }

    async fn jobs_by_employer(&self, employer_id: &str) -> Result<Vec<Job>> {
        let mut rows: Vec<Job> = self
            .tables()
            .jobs
            .iter()
            .filter(|j| j.employer_id == employer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn insert_job(&self, job: &NewJob) -> Result<Job> {
        let row = {
            let mut tables = self.tables();
            let row = Job {
                id: tables.next_id("job"),
                employer_id: job.employer_id.clone(),
                title: job.title.clone(),
                description: job.description.clone(),
                location: job.location.clone(),
                salary: job.salary.clone(),
                job_type: job.job_type,
                work_mode: job.work_mode,
                experience_level: job.experience_level,
                min_salary: job.min_salary,
                max_salary: job.max_salary,
                salary_currency: job.salary_currency.clone(),
                deadline: job.deadline,
                is_active: job.is_active,
                created_at: Utc::now(),
            };
            tables.jobs.push(row.clone());
            row
        };
        self.announce(tables::JOBS, ChangeKind::Insert);
        Ok(row)
    }

    async fn update_job(&self, id: &str, employer_id: &str, update: &JobUpdate) -> Result<Job> {
        let row = {
            let mut tables = self.tables();
            let job = tables
                .jobs
                .iter_mut()
                .find(|j| j.id == id && j.employer_id == employer_id)
                .ok_or_else(|| AppError::not_found(format!("job {id} for employer {employer_id}")))?;
            update.apply_to(job);
            job.clone()
        };
        self.announce(tables::JOBS, ChangeKind::Update);
        Ok(row)
    }

    async fn delete_job(&self, id: &str, employer_id: &str) -> Result<()> {
        {
            let mut tables = self.tables();
            let before = tables.jobs.len();
            tables
                .jobs
                .retain(|j| !(j.id == id && j.employer_id == employer_id));
            if tables.jobs.len() == before {
                return Err(AppError::not_found(format!(
                    "job {id} for employer {employer_id}"
                )));
            }
        }
        self.announce(tables::JOBS, ChangeKind::Delete);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn insert_application(&self, application: &NewApplication) -> Result<Application> {
        let row = {
            let mut tables = self.tables();
            if tables.applications.iter().any(|a| {
                a.job_id == application.job_id && a.applicant_id == application.applicant_id
            }) {
                return Err(AppError::already_exists(
                    "duplicate key value violates unique constraint on applications",
                ));
            }
            let row = Application {
                id: tables.next_id("application"),
                job_id: application.job_id.clone(),
                applicant_id: application.applicant_id.clone(),
                cv_url: application.cv_url.clone(),
                status: application.status,
                message: application.message.clone(),
                created_at: Utc::now(),
            };
            tables.applications.push(row.clone());
            row
        };
        self.announce(tables::APPLICATIONS, ChangeKind::Insert);
        Ok(row)
    }

    async fn find_application(
        &self,
        job_id: &str,
        applicant_id: &str,
    ) -> Result<Option<Application>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .find(|a| a.job_id == job_id && a.applicant_id == applicant_id)
            .cloned())
    }

    async fn list_applications(&self, job_id: &str) -> Result<Vec<Application>> {
        let mut rows: Vec<Application> = self
            .tables()
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn applications_by_applicant(
        &self,
        applicant_id: &str,
    ) -> Result<Vec<ApplicationEntry>> {
        let tables = self.tables();
        let mut entries: Vec<ApplicationEntry> = tables
            .applications
            .iter()
            .filter(|a| a.applicant_id == applicant_id)
            .map(|a| ApplicationEntry {
                application: a.clone(),
                job: tables.jobs.iter().find(|j| j.id == a.job_id).cloned(),
            })
            .collect();
        entries.sort_by(|a, b| b.application.created_at.cmp(&a.application.created_at));
        Ok(entries)
    }

    async fn set_application_status(&self, id: &str, status: ApplicationStatus) -> Result<()> {
        {
            let mut tables = self.tables();
            let row = tables
                .applications
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or_else(|| AppError::not_found(format!("application {id}")))?;
            row.status = status;
        }
        self.announce(tables::APPLICATIONS, ChangeKind::Update);
        Ok(())
    }

    async fn insert_saved_job(&self, user_id: &str, job_id: &str) -> Result<SavedJob> {
        let mut tables = self.tables();
        if tables
            .saved_jobs
            .iter()
            .any(|s| s.user_id == user_id && s.job_id == job_id)
        {
            return Err(AppError::already_exists(
                "duplicate key value violates unique constraint on saved_jobs",
            ));
        }
        let row = SavedJob {
            id: tables.next_id("saved"),
            user_id: user_id.to_string(),
            job_id: job_id.to_string(),
            created_at: Utc::now(),
        };
        tables.saved_jobs.push(row.clone());
        Ok(row)
    }

    async fn delete_saved_job(&self, user_id: &str, job_id: &str) -> Result<()> {
        self.tables()
            .saved_jobs
            .retain(|s| !(s.user_id == user_id && s.job_id == job_id));
        Ok(())
    }

    async fn find_saved_job(&self, user_id: &str, job_id: &str) -> Result<Option<SavedJob>> {
        Ok(self
            .tables()
            .saved_jobs
            .iter()
            .find(|s| s.user_id == user_id && s.job_id == job_id)
            .cloned())
    }

    async fn list_saved_jobs(&self, user_id: &str) -> Result<Vec<SavedJobEntry>> {
        let tables = self.tables();
        let mut entries: Vec<SavedJobEntry> = tables
            .saved_jobs
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| SavedJobEntry {
                id: s.id.clone(),
                job_id: s.job_id.clone(),
                created_at: s.created_at,
                job: tables.jobs.iter().find(|j| j.id == s.job_id).cloned(),
            })
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    async fn count_saved_jobs(&self, user_id: &str) -> Result<usize> {
        Ok(self
            .tables()
            .saved_jobs
            .iter()
            .filter(|s| s.user_id == user_id)
            .count())
    }
}

#[async_trait]
impl AlertStore for MemoryStore {
    async fn active_alerts(&self) -> Result<Vec<JobAlert>> {
        Ok(self
            .tables()
            .alerts
            .iter()
            .filter(|a| a.is_active)
            .cloned()
            .collect())
    }

    async fn insert_alert(&self, alert: &NewJobAlert) -> Result<JobAlert> {
        let mut tables = self.tables();
        let row = JobAlert {
            id: tables.next_id("alert"),
            user_id: alert.user_id.clone(),
            alert_name: alert.alert_name.clone(),
            search_query: alert.search_query.clone(),
            job_type: alert.job_type,
            location: alert.location.clone(),
            work_mode: alert.work_mode,
            experience_level: alert.experience_level,
            is_active: alert.is_active,
        };
        tables.alerts.push(row.clone());
        Ok(row)
    }

    async fn insert_notifications(&self, notifications: &[JobNotification]) -> Result<()> {
        let mut tables = self.tables();
        for notification in notifications {
            let mut row = notification.clone();
            if row.id.is_none() {
                row.id = Some(tables.next_id("notification"));
            }
            tables.notifications.push(row);
        }
        Ok(())
    }

    async fn alerts_for(&self, user_id: &str) -> Result<Vec<JobAlert>> {
        // Rows are appended, so reverse insertion order is newest first
        Ok(self
            .tables()
            .alerts
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn notifications_for(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<JobNotification>> {
        let mut rows: Vec<JobNotification> = self
            .tables()
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<()> {
        let mut tables = self.tables();
        let row = tables
            .notifications
            .iter_mut()
            .find(|n| n.id.as_deref() == Some(notification_id) && n.user_id == user_id)
            .ok_or_else(|| {
                AppError::not_found(format!("notification {notification_id} for {user_id}"))
            })?;
        row.is_read = true;
        Ok(())
    }

    async fn set_alert_active(&self, alert_id: &str, user_id: &str, active: bool) -> Result<()> {
        let mut tables = self.tables();
        let row = tables
            .alerts
            .iter_mut()
            .find(|a| a.id == alert_id && a.user_id == user_id)
            .ok_or_else(|| AppError::not_found(format!("alert {alert_id} for {user_id}")))?;
        row.is_active = active;
        Ok(())
    }

    async fn delete_alert(&self, alert_id: &str, user_id: &str) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.alerts.len();
        tables
            .alerts
            .retain(|a| !(a.id == alert_id && a.user_id == user_id));
        if tables.alerts.len() == before {
            return Err(AppError::not_found(format!("alert {alert_id} for {user_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        upsert: bool,
    ) -> Result<String> {
        let key = format!("{bucket}/{path}");
        let mut tables = self.tables();
        if !upsert && tables.objects.contains_key(&key) {
            return Err(AppError::already_exists(format!("object {key}")));
        }
        tables
            .objects
            .insert(key.clone(), (bytes, content_type.to_string()));
        Ok(format!("memory://{key}"))
    }
}

impl ChangeFeed for MemoryStore {
    fn changes(&self, table: &str) -> BoxStream<'static, Result<ChangeEvent>> {
        let table = table.to_string();
        stream::unfold(self.changes.subscribe(), |mut rx| async move {
            match rx.recv().await {
                Ok(event) => Some((Ok(event), rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => Some((
                    Err(AppError::remote("lagged", format!("{skipped} change events dropped"))),
                    rx,
                )),
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .filter(move |item| {
            let keep = match item {
                Ok(event) => event.table == table,
                Err(_) => true,
            };
            futures::future::ready(keep)
        })
        .boxed()
    }
}
