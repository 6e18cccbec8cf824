//! Service layer for the job board client.
//!
//! This module contains the mutation flows around the feed:
//! - Posting, editing and deleting jobs (`JobService`), and the employer's
//!   own postings (`PostedJobs`)
//! - Alerts and their notifications (`AlertService`)
//! - Applying to jobs (`ApplicationService`) and the applicant's own
//!   applications (`MyApplications`)
//! - Bookmarks (`SavedJobs`)
//! - Photo and CV uploads (`Uploader`)

mod alerts;
mod applications;
mod jobs;
mod saved_jobs;
mod uploads;

pub use alerts::{AlertService, RECENT_NOTIFICATIONS, unread_count};
pub use applications::{ApplicationService, ApplyOutcome, MyApplications, validate_cv_link};
pub use jobs::{Deadline, JobPosting, JobService, PostedJobs};
pub use saved_jobs::SavedJobs;
pub use uploads::Uploader;
