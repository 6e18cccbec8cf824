// src/services/jobs.rs

//! Job posting service.
//!
//! Every successful mutation is followed by a publish on the refresh bus so
//! that all mounted job lists refetch from page 0.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};

use crate::error::{AppError, Result};
use crate::feed::{ListSource, RefreshBus};
use crate::models::{ExperienceLevel, Job, JobType, JobUpdate, NewJob, WorkMode};
use crate::services::AlertService;
use crate::store::{AlertStore, JobStore};

/// Application deadline as entered on the posting form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deadline {
    /// Days from today
    Days(i64),
    Date(NaiveDate),
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::Days(30)
    }
}

impl Deadline {
    /// Concrete date relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> Result<NaiveDate> {
        match *self {
            Deadline::Date(date) => Ok(date),
            Deadline::Days(days) if days < 1 => Err(AppError::validation(
                "Please enter a valid number of days (minimum 1)",
            )),
            Deadline::Days(days) => u64::try_from(days)
                .ok()
                .and_then(|d| today.checked_add_days(Days::new(d)))
                .ok_or_else(|| AppError::validation("Deadline is too far in the future")),
        }
    }
}

/// A job as filled in on the posting form.
#[derive(Debug, Clone, Default)]
pub struct JobPosting {
    pub title: String,
    pub description: String,
    pub location: String,
    /// Display text, e.g. "€1000-1500"
    pub salary: String,
    pub job_type: JobType,
    pub work_mode: Option<WorkMode>,
    pub experience_level: Option<ExperienceLevel>,
    pub min_salary: Option<i64>,
    pub max_salary: Option<i64>,
    pub salary_currency: Option<String>,
    pub deadline: Deadline,
}

impl JobPosting {
    /// Check required fields and the deadline.
    pub fn validate(&self) -> Result<()> {
        let required = [&self.title, &self.description, &self.location, &self.salary];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(AppError::validation("Please fill in all required fields"));
        }
        if let Deadline::Days(days) = self.deadline {
            if days < 1 {
                return Err(AppError::validation(
                    "Please enter a valid number of days (minimum 1)",
                ));
            }
        }
        Ok(())
    }

    /// Insert payload for `employer_id`, active immediately.
    pub fn to_new_job(&self, employer_id: &str, today: NaiveDate) -> Result<NewJob> {
        self.validate()?;
        Ok(NewJob {
            employer_id: employer_id.to_string(),
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            location: self.location.trim().to_string(),
            salary: self.salary.trim().to_string(),
            job_type: self.job_type,
            work_mode: self.work_mode,
            experience_level: self.experience_level,
            min_salary: self.min_salary,
            max_salary: self.max_salary,
            salary_currency: self.salary_currency.clone(),
            deadline: self.deadline.resolve(today)?,
            is_active: true,
        })
    }
}

/// Posting, editing and deleting jobs.
pub struct JobService {
    jobs: Arc<dyn JobStore>,
    alerts: AlertService,
    bus: RefreshBus,
}

impl JobService {
    pub fn new(jobs: Arc<dyn JobStore>, alerts: Arc<dyn AlertStore>, bus: RefreshBus) -> Self {
        Self {
            jobs,
            alerts: AlertService::new(alerts),
            bus,
        }
    }

    /// Validate and create a posting, notify matching alerts, refresh lists.
    ///
    /// Alert notification failures are logged and do not fail the post.
    pub async fn post_job(&self, employer_id: &str, posting: &JobPosting) -> Result<Job> {
        if employer_id.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "You need to be signed in to post jobs".into(),
            ));
        }
        let new_job = posting.to_new_job(employer_id, Utc::now().date_naive())?;

        let job = self.jobs.insert_job(&new_job).await?;
        log::info!("Posted job {} '{}'", job.id, job.title);

        self.alerts.notify_matching(&job).await;
        self.bus.publish().await;
        Ok(job)
    }

    /// Apply a partial update to a posting owned by `employer_id`.
    pub async fn update_job(&self, id: &str, employer_id: &str, update: &JobUpdate) -> Result<Job> {
        if update.is_empty() {
            return Err(AppError::validation("Nothing to update"));
        }
        let blank = [&update.title, &update.description, &update.location, &update.salary]
            .into_iter()
            .flatten()
            .any(|field| field.trim().is_empty());
        if blank {
            return Err(AppError::validation("Please fill in all required fields"));
        }

        let job = self.jobs.update_job(id, employer_id, update).await?;
        log::info!("Updated job {}", job.id);
        self.bus.publish().await;
        Ok(job)
    }

    /// Open or close a posting for applications.
    pub async fn set_active(&self, id: &str, employer_id: &str, active: bool) -> Result<Job> {
        let update = JobUpdate {
            is_active: Some(active),
            ..JobUpdate::default()
        };
        self.update_job(id, employer_id, &update).await
    }

    pub async fn delete_job(&self, id: &str, employer_id: &str) -> Result<()> {
        self.jobs.delete_job(id, employer_id).await?;
        log::info!("Deleted job {}", id);
        self.bus.publish().await;
        Ok(())
    }

    /// Run `optimistic` right away, then the server call.
    ///
    /// Lists are refreshed whether the server call succeeds or not; on
    /// failure the refetch overwrites the optimistic state.
    pub async fn with_optimistic<T, Fut>(
        &self,
        optimistic: impl FnOnce(),
        server: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        optimistic();
        let result = server.await;
        if let Err(e) = &result {
            log::warn!("Server update failed, reverting to server state: {}", e);
        }
        self.bus.publish().await;
        result
    }
}

/// An employer's own postings, active or not, newest first.
///
/// Mount with `LiveList::mount` so it follows the refresh bus.
pub struct PostedJobs {
    jobs: Arc<dyn JobStore>,
    employer_id: String,
}

impl PostedJobs {
    pub fn new(jobs: Arc<dyn JobStore>, employer_id: impl Into<String>) -> Self {
        Self {
            jobs,
            employer_id: employer_id.into(),
        }
    }
}

#[async_trait]
impl ListSource for PostedJobs {
    type Row = Job;

    async fn load(&self) -> Result<Vec<Job>> {
        if self.employer_id.trim().is_empty() {
            return Err(AppError::Unauthorized("Not signed in".into()));
        }
        self.jobs.jobs_by_employer(&self.employer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::feed::{LiveList, Subscription, listener_fn};
    use crate::models::{FilterSelection, JobAlert};
    use crate::query::build_query;
    use crate::store::MemoryStore;

    fn posting(title: &str) -> JobPosting {
        JobPosting {
            title: title.into(),
            description: "Build backend services".into(),
            location: "Tirana".into(),
            salary: "€1500".into(),
            job_type: JobType::FullTime,
            ..JobPosting::default()
        }
    }

    fn counting(bus: &RefreshBus) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let subscription = bus.subscribe(listener_fn(move || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        }));
        (count, subscription)
    }

    fn service(store: &MemoryStore, bus: &RefreshBus) -> JobService {
        JobService::new(Arc::new(store.clone()), Arc::new(store.clone()), bus.clone())
    }

    async fn visible(store: &MemoryStore) -> usize {
        let query = build_query(&FilterSelection::default(), 0, 50, Utc::now());
        store.fetch_jobs(&query).await.unwrap().total
    }

    #[test]
    fn test_deadline_resolution() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(
            Deadline::Days(30).resolve(today).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 15).unwrap()
        );
        let fixed = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(Deadline::Date(fixed).resolve(today).unwrap(), fixed);
        assert!(Deadline::Days(0).resolve(today).is_err());
    }

    #[test]
    fn test_posting_requires_fields() {
        assert!(posting("Rust Developer").validate().is_ok());

        let err = posting("   ").validate().unwrap_err();
        assert_eq!(err.user_message(), "Please fill in all required fields");

        let mut no_salary = posting("Rust Developer");
        no_salary.salary.clear();
        assert!(no_salary.validate().is_err());

        let mut bad_days = posting("Rust Developer");
        bad_days.deadline = Deadline::Days(0);
        assert!(matches!(bad_days.validate(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_post_job_notifies_and_publishes() {
        let store = MemoryStore::new();
        store.seed_alert(JobAlert {
            id: "a1".into(),
            user_id: "seeker".into(),
            alert_name: "Rust".into(),
            search_query: Some("rust".into()),
            job_type: None,
            location: None,
            work_mode: None,
            experience_level: None,
            is_active: true,
        });
        let bus = RefreshBus::new();
        let (refreshes, _subscription) = counting(&bus);

        let job = service(&store, &bus)
            .post_job("e1", &posting("Rust Developer"))
            .await
            .unwrap();

        assert!(job.is_active);
        assert_eq!(job.employer_id, "e1");
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(store.notifications()[0].job_id, job.id);
    }

    #[tokio::test]
    async fn test_invalid_posting_never_reaches_store() {
        let store = MemoryStore::new();
        let bus = RefreshBus::new();
        let (refreshes, _subscription) = counting(&bus);
        let service = service(&store, &bus);

        assert!(service.post_job("e1", &posting("")).await.is_err());
        let err = service.post_job("", &posting("Rust Developer")).await;
        assert!(matches!(err, Err(AppError::Unauthorized(_))));

        assert_eq!(visible(&store).await, 0);
        assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() {
        let store = MemoryStore::new();
        let bus = RefreshBus::new();
        let (refreshes, _subscription) = counting(&bus);
        let service = service(&store, &bus);
        let job = service
            .post_job("e1", &posting("Rust Developer"))
            .await
            .unwrap();

        let update = JobUpdate {
            title: Some("Senior Rust Developer".into()),
            ..JobUpdate::default()
        };
        assert!(service.update_job(&job.id, "e2", &update).await.is_err());
        let updated = service.update_job(&job.id, "e1", &update).await.unwrap();
        assert_eq!(updated.title, "Senior Rust Developer");

        let closed = service.set_active(&job.id, "e1", false).await.unwrap();
        assert!(!closed.is_active);
        assert_eq!(visible(&store).await, 0);

        service.delete_job(&job.id, "e1").await.unwrap();
        // post, update, close, delete
        assert_eq!(refreshes.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let store = MemoryStore::new();
        let service = service(&store, &RefreshBus::new());
        let err = service
            .update_job("job-1", "e1", &JobUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_optimistic_update_refreshes_on_failure() {
        let store = MemoryStore::new();
        let bus = RefreshBus::new();
        let (refreshes, _subscription) = counting(&bus);
        let service = service(&store, &bus);

        let applied = AtomicUsize::new(0);
        let result: Result<()> = service
            .with_optimistic(
                || {
                    applied.fetch_add(1, Ordering::SeqCst);
                },
                async { Err(AppError::remote("500", "boom")) },
            )
            .await;

        assert!(result.is_err());
        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert_eq!(refreshes.load(Ordering::SeqCst), 1);

        let value = service
            .with_optimistic(|| {}, async { Ok(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_posted_jobs_follow_the_bus() {
        let store = MemoryStore::new();
        let bus = RefreshBus::new();
        let service = service(&store, &bus);
        service.post_job("e2", &posting("Not Mine")).await.unwrap();

        let posted = LiveList::mount(PostedJobs::new(Arc::new(store.clone()), "e1"), &bus).await;
        assert!(posted.is_loaded());
        assert!(posted.rows().is_empty());

        let job = service.post_job("e1", &posting("Rust Developer")).await.unwrap();
        assert_eq!(posted.rows().len(), 1);

        // Closed postings stay on the employer's own list
        service.set_active(&job.id, "e1", false).await.unwrap();
        let rows = posted.rows();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].is_active);

        service.delete_job(&job.id, "e1").await.unwrap();
        assert!(posted.rows().is_empty());
    }

    #[tokio::test]
    async fn test_posted_jobs_need_an_employer() {
        let store = MemoryStore::new();
        let bus = RefreshBus::new();
        let posted = LiveList::mount(PostedJobs::new(Arc::new(store), " "), &bus).await;
        assert!(!posted.is_loaded());
        assert!(posted.error().is_some());
    }
}
