//! Applications and saved jobs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::Job;

/// Review state of an application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

/// A job seeker's application to a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    #[serde(default)]
    pub cv_url: Option<String>,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub job_id: String,
    pub applicant_id: String,
    pub cv_url: Option<String>,
    pub status: ApplicationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A bookmark of a job by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJob {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub created_at: DateTime<Utc>,
}

/// A saved job joined with its posting (`saved_jobs` embedding `jobs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedJobEntry {
    pub id: String,
    pub job_id: String,
    pub created_at: DateTime<Utc>,
    /// `None` when the posting was deleted or is hidden by row policies
    #[serde(default)]
    pub job: Option<Job>,
}

/// An application joined with its posting (`applications` embedding `jobs`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationEntry {
    #[serde(flatten)]
    pub application: Application,
    /// `None` when the posting was deleted or is hidden by row policies
    #[serde(default)]
    pub job: Option<Job>,
}
