// src/models/mod.rs

//! Domain models for the job board client.
//!
//! Rows mirror the backend tables (`jobs`, `applications`, `saved_jobs`,
//! `job_alerts`, `job_notifications`); filter types describe the feed.

mod alert;
mod application;
mod config;
mod filter;
mod job;

// Re-export all public types
pub use alert::{JobAlert, JobNotification, NewJobAlert};
pub use application::{
    Application, ApplicationEntry, ApplicationStatus, NewApplication, SavedJob, SavedJobEntry,
};
pub use config::{BackendConfig, Config, FeedConfig, UploadConfig};
pub use filter::{DatePosted, FilterSelection, SalaryRange, SortOrder};
pub use job::{ExperienceLevel, Job, JobType, JobUpdate, NewJob, WorkMode};

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Rows in query order, at most the requested page size
    pub rows: Vec<Job>,
    /// Total rows matching the query, independent of paging
    pub total: usize,
}
