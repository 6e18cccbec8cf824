// src/services/alerts.rs

//! Job alert service.
//!
//! Creates and manages saved-search alerts, fans a newly posted job out to
//! the owners of every matching alert, and serves the alerts screen.

use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Job, JobAlert, JobNotification, NewJobAlert};
use crate::store::AlertStore;
use crate::utils::text::squish;

/// Notifications shown on the alerts screen.
pub const RECENT_NOTIFICATIONS: usize = 10;

pub struct AlertService {
    store: Arc<dyn AlertStore>,
}

impl AlertService {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// Save a new alert. The name is required; blank criteria are dropped.
    pub async fn create_alert(&self, mut alert: NewJobAlert) -> Result<JobAlert> {
        alert.alert_name = squish(&alert.alert_name);
        if alert.alert_name.is_empty() {
            return Err(AppError::validation("Please give the alert a name"));
        }
        alert.search_query = non_blank(alert.search_query);
        alert.location = non_blank(alert.location);

        let created = self.store.insert_alert(&alert).await?;
        log::info!("Created job alert '{}' for {}", created.alert_name, created.user_id);
        Ok(created)
    }

    /// Notify the owners of alerts matching `job`.
    ///
    /// Never fails: this runs after the job was already created, so any
    /// error is logged and reported as zero notifications.
    pub async fn notify_matching(&self, job: &Job) -> usize {
        match self.try_notify(job).await {
            Ok(count) => {
                if count > 0 {
                    log::info!("Notified {} alert(s) about job {}", count, job.id);
                }
                count
            }
            Err(e) => {
                log::warn!("Alert notification for job {} failed: {}", job.id, e);
                0
            }
        }
    }

    async fn try_notify(&self, job: &Job) -> Result<usize> {
        let alerts = self.store.active_alerts().await?;
        let now = Utc::now();
        let notifications: Vec<JobNotification> = alerts
            .iter()
            .filter(|alert| alert.is_active && alert.matches(job))
            .map(|alert| JobNotification::for_alert(alert, job, now))
            .collect();

        if notifications.is_empty() {
            return Ok(0);
        }
        self.store.insert_notifications(&notifications).await?;
        Ok(notifications.len())
    }

    /// The user's alerts, newest first.
    pub async fn alerts_for(&self, user_id: &str) -> Result<Vec<JobAlert>> {
        self.store.alerts_for(user_id).await
    }

    /// The user's most recent notifications, newest first.
    pub async fn recent_notifications(&self, user_id: &str) -> Result<Vec<JobNotification>> {
        self.store
            .notifications_for(user_id, RECENT_NOTIFICATIONS)
            .await
    }

    pub async fn mark_read(&self, notification_id: &str, user_id: &str) -> Result<()> {
        self.store.mark_read(notification_id, user_id).await?;
        log::debug!("Notification {} marked read", notification_id);
        Ok(())
    }

    /// Pause or resume an alert. Paused alerts are skipped by `notify_matching`.
    pub async fn set_alert_active(&self, alert_id: &str, user_id: &str, active: bool) -> Result<()> {
        self.store.set_alert_active(alert_id, user_id, active).await?;
        log::info!(
            "Alert {} {}",
            alert_id,
            if active { "resumed" } else { "paused" }
        );
        Ok(())
    }

    pub async fn delete_alert(&self, alert_id: &str, user_id: &str) -> Result<()> {
        self.store.delete_alert(alert_id, user_id).await?;
        log::info!("Deleted alert {}", alert_id);
        Ok(())
    }
}

/// Unread count for the alerts screen badge.
pub fn unread_count(notifications: &[JobNotification]) -> usize {
    notifications.iter().filter(|n| !n.is_read).count()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    use crate::models::{JobType, WorkMode};
    use crate::store::MemoryStore;

    fn job() -> Job {
        Job {
            id: "job-1".into(),
            employer_id: "e1".into(),
            title: "Senior Rust Developer".into(),
            description: "Backend services".into(),
            location: "Tirana, Albania".into(),
            salary: "€2000".into(),
            job_type: JobType::FullTime,
            work_mode: Some(WorkMode::Hybrid),
            experience_level: None,
            min_salary: None,
            max_salary: None,
            salary_currency: None,
            deadline: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn alert(id: &str, query: Option<&str>, job_type: Option<JobType>) -> JobAlert {
        JobAlert {
            id: id.into(),
            user_id: format!("user-{id}"),
            alert_name: format!("Alert {id}"),
            search_query: query.map(String::from),
            job_type,
            location: None,
            work_mode: None,
            experience_level: None,
            is_active: true,
        }
    }

    fn new_alert(name: &str) -> NewJobAlert {
        NewJobAlert {
            user_id: "u1".into(),
            alert_name: name.into(),
            search_query: Some("  ".into()),
            job_type: None,
            location: Some(" Tirana ".into()),
            work_mode: None,
            experience_level: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_notifies_only_matching_alerts() {
        let store = MemoryStore::new();
        store.seed_alert(alert("a1", Some("rust"), None));
        store.seed_alert(alert("a2", None, Some(JobType::PartTime)));
        store.seed_alert(alert("a3", Some("DEVELOPER"), Some(JobType::FullTime)));
        let service = AlertService::new(Arc::new(store.clone()));

        assert_eq!(service.notify_matching(&job()).await, 2);

        let mut owners: Vec<String> = store
            .notifications()
            .into_iter()
            .map(|n| n.user_id)
            .collect();
        owners.sort();
        assert_eq!(owners, vec!["user-a1", "user-a3"]);
    }

    struct BrokenAlerts;

    #[async_trait]
    impl AlertStore for BrokenAlerts {
        async fn active_alerts(&self) -> Result<Vec<JobAlert>> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn insert_alert(&self, _alert: &NewJobAlert) -> Result<JobAlert> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn insert_notifications(&self, _notifications: &[JobNotification]) -> Result<()> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn alerts_for(&self, _user_id: &str) -> Result<Vec<JobAlert>> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn notifications_for(
            &self,
            _user_id: &str,
            _limit: usize,
        ) -> Result<Vec<JobNotification>> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn mark_read(&self, _notification_id: &str, _user_id: &str) -> Result<()> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn set_alert_active(&self, _alert_id: &str, _user_id: &str, _active: bool) -> Result<()> {
            Err(AppError::remote("500", "database unavailable"))
        }

        async fn delete_alert(&self, _alert_id: &str, _user_id: &str) -> Result<()> {
            Err(AppError::remote("500", "database unavailable"))
        }
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let service = AlertService::new(Arc::new(BrokenAlerts));
        assert_eq!(service.notify_matching(&job()).await, 0);
    }

    #[tokio::test]
    async fn test_alerts_screen_flow() {
        let store = MemoryStore::new();
        let service = AlertService::new(Arc::new(store.clone()));
        let older = service.create_alert(new_alert("Older")).await.unwrap();
        let newer = service.create_alert(new_alert("Newer")).await.unwrap();

        let names: Vec<String> = service
            .alerts_for("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.alert_name)
            .collect();
        assert_eq!(names, vec!["Newer", "Older"]);
        assert!(service.alerts_for("u2").await.unwrap().is_empty());

        // A paused alert stops matching, a deleted one is gone
        service.set_alert_active(&older.id, "u1", false).await.unwrap();
        let mut posted = job();
        posted.location = "Tirana".into();
        assert_eq!(service.notify_matching(&posted).await, 1);

        let notifications = service.recent_notifications("u1").await.unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(unread_count(&notifications), 1);
        let id = notifications[0].id.clone().unwrap();

        assert!(matches!(
            service.mark_read(&id, "u2").await,
            Err(AppError::NotFound(_))
        ));
        service.mark_read(&id, "u1").await.unwrap();
        let notifications = service.recent_notifications("u1").await.unwrap();
        assert_eq!(unread_count(&notifications), 0);

        service.delete_alert(&newer.id, "u1").await.unwrap();
        assert_eq!(service.alerts_for("u1").await.unwrap().len(), 1);
        assert!(service.delete_alert(&newer.id, "u1").await.is_err());
    }

    #[tokio::test]
    async fn test_recent_notifications_are_capped() {
        let store = MemoryStore::new();
        for i in 0..12 {
            let mut a = alert(&format!("a{i}"), None, None);
            a.user_id = "reader".into();
            store.seed_alert(a);
        }
        let service = AlertService::new(Arc::new(store.clone()));
        assert_eq!(service.notify_matching(&job()).await, 12);
        assert_eq!(
            service.recent_notifications("reader").await.unwrap().len(),
            RECENT_NOTIFICATIONS
        );
    }

    #[tokio::test]
    async fn test_create_alert_requires_name() {
        let service = AlertService::new(Arc::new(MemoryStore::new()));
        let err = service.create_alert(new_alert("   ")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let created = service.create_alert(new_alert(" Rust  jobs ")).await.unwrap();
        assert_eq!(created.alert_name, "Rust jobs");
        assert_eq!(created.search_query, None);
        assert_eq!(created.location.as_deref(), Some("Tirana"));
    }
}
