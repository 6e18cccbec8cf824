//! Saved-search alerts and the notifications they produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::{ExperienceLevel, Job, JobType, WorkMode};

/// A user's saved search, notified when a matching job is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobAlert {
    pub id: String,
    pub user_id: String,
    pub alert_name: String,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub work_mode: Option<WorkMode>,
    #[serde(default)]
    pub experience_level: Option<ExperienceLevel>,
    pub is_active: bool,
}

impl JobAlert {
    /// Whether a newly posted job satisfies every criterion set on the alert.
    ///
    /// Search text matches title or description, location is a substring
    /// match, both case-insensitive. Enum criteria are exact.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(query) = non_blank(&self.search_query) {
            let query = query.to_lowercase();
            if !job.title.to_lowercase().contains(&query)
                && !job.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        if self.job_type.is_some_and(|t| t != job.job_type) {
            return false;
        }

        if let Some(location) = non_blank(&self.location) {
            if !job
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }

        if self.work_mode.is_some() && self.work_mode != job.work_mode {
            return false;
        }

        if self.experience_level.is_some() && self.experience_level != job.experience_level {
            return false;
        }

        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Insert payload for a new alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJobAlert {
    pub user_id: String,
    pub alert_name: String,
    pub search_query: Option<String>,
    pub job_type: Option<JobType>,
    pub location: Option<String>,
    pub work_mode: Option<WorkMode>,
    pub experience_level: Option<ExperienceLevel>,
    pub is_active: bool,
}

/// In-app notification created for an alert owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobNotification {
    /// Assigned by the backend on insert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub job_id: String,
    pub alert_id: String,
    pub title: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl JobNotification {
    pub fn for_alert(alert: &JobAlert, job: &Job, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            user_id: alert.user_id.clone(),
            job_id: job.id.clone(),
            alert_id: alert.id.clone(),
            title: format!("New job: {}", job.title),
            message: format!(
                "A new job matching your alert \"{}\" has been posted.",
                alert.alert_name
            ),
            is_read: false,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn job() -> Job {
        Job {
            id: "j1".into(),
            employer_id: "e1".into(),
            title: "Senior Rust Developer".into(),
            description: "Work on async services".into(),
            location: "Tirana, Albania".into(),
            salary: "€2000".into(),
            job_type: JobType::FullTime,
            work_mode: Some(WorkMode::Hybrid),
            experience_level: Some(ExperienceLevel::Senior),
            min_salary: Some(2000),
            max_salary: Some(2500),
            salary_currency: None,
            deadline: NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn alert() -> JobAlert {
        JobAlert {
            id: "a1".into(),
            user_id: "u1".into(),
            alert_name: "Rust jobs".into(),
            search_query: None,
            job_type: None,
            location: None,
            work_mode: None,
            experience_level: None,
            is_active: true,
        }
    }

    #[test]
    fn test_empty_alert_matches_everything() {
        assert!(alert().matches(&job()));
    }

    #[test]
    fn test_search_query_checks_title_and_description() {
        let mut a = alert();
        a.search_query = Some("ASYNC".into());
        assert!(a.matches(&job()));
        a.search_query = Some("python".into());
        assert!(!a.matches(&job()));
    }

    #[test]
    fn test_location_is_substring() {
        let mut a = alert();
        a.location = Some("tirana".into());
        assert!(a.matches(&job()));
        a.location = Some("Durres".into());
        assert!(!a.matches(&job()));
    }

    #[test]
    fn test_enum_criteria_are_exact() {
        let mut a = alert();
        a.job_type = Some(JobType::Contract);
        assert!(!a.matches(&job()));

        let mut a = alert();
        a.work_mode = Some(WorkMode::Hybrid);
        a.experience_level = Some(ExperienceLevel::Senior);
        assert!(a.matches(&job()));

        let mut j = job();
        j.work_mode = None;
        assert!(!a.matches(&j));
    }

    #[test]
    fn test_notification_text() {
        let n = JobNotification::for_alert(&alert(), &job(), Utc::now());
        assert_eq!(n.title, "New job: Senior Rust Developer");
        assert!(n.message.contains("\"Rust jobs\""));
        assert!(!n.is_read);

        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("id").is_none());
    }
}
