// src/services/applications.rs

//! Applying to jobs and reviewing applications.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::feed::ListSource;
use crate::models::{Application, ApplicationEntry, ApplicationStatus, NewApplication};
use crate::store::ApplicationStore;
use crate::utils::normalize_url;

/// Result of submitting an application.
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Submitted(Application),
    /// The applicant had already applied; shown as information, not failure
    AlreadyApplied,
}

impl ApplyOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            ApplyOutcome::Submitted(_) => "Your application has been sent",
            ApplyOutcome::AlreadyApplied => "You have already applied for this job",
        }
    }
}

pub struct ApplicationService {
    store: Arc<dyn ApplicationStore>,
}

impl ApplicationService {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    /// Submit an application with an optional CV link.
    ///
    /// A duplicate is reported as `AlreadyApplied`, never as an error.
    pub async fn apply(
        &self,
        job_id: &str,
        applicant_id: &str,
        cv_url: Option<&str>,
    ) -> Result<ApplyOutcome> {
        if applicant_id.trim().is_empty() {
            return Err(AppError::Unauthorized(
                "You need to be signed in to apply".into(),
            ));
        }

        let application = NewApplication {
            job_id: job_id.to_string(),
            applicant_id: applicant_id.to_string(),
            cv_url: cv_url.map(String::from),
            status: ApplicationStatus::Pending,
            message: None,
        };

        match self.store.insert_application(&application).await {
            Ok(row) => {
                log::info!("Application {} submitted for job {}", row.id, job_id);
                Ok(ApplyOutcome::Submitted(row))
            }
            Err(AppError::AlreadyExists(detail)) => {
                log::debug!("Duplicate application for job {}: {}", job_id, detail);
                Ok(ApplyOutcome::AlreadyApplied)
            }
            Err(e) => Err(e),
        }
    }

    /// Apply with a CV link typed by the user.
    pub async fn apply_with_link(
        &self,
        job_id: &str,
        applicant_id: &str,
        link: &str,
    ) -> Result<ApplyOutcome> {
        let cv_url = validate_cv_link(link)?;
        self.apply(job_id, applicant_id, Some(&cv_url)).await
    }

    /// Whether the applicant already applied. Lookup failures read as `false`.
    pub async fn has_applied(&self, job_id: &str, applicant_id: &str) -> bool {
        match self.store.find_application(job_id, applicant_id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                log::warn!("Application lookup for job {} failed: {}", job_id, e);
                false
            }
        }
    }

    /// Applications received for a job, newest first.
    pub async fn applications_for(&self, job_id: &str) -> Result<Vec<Application>> {
        self.store.list_applications(job_id).await
    }

    pub async fn set_status(&self, application_id: &str, status: ApplicationStatus) -> Result<()> {
        self.store
            .set_application_status(application_id, status)
            .await?;
        log::info!("Application {} marked {:?}", application_id, status);
        Ok(())
    }
}

/// Applications the signed-in user has sent, with their postings.
///
/// Mount with `LiveList::mount` so it follows the refresh bus.
pub struct MyApplications {
    store: Arc<dyn ApplicationStore>,
    applicant_id: String,
}

impl MyApplications {
    pub fn new(store: Arc<dyn ApplicationStore>, applicant_id: impl Into<String>) -> Self {
        Self {
            store,
            applicant_id: applicant_id.into(),
        }
    }
}

#[async_trait]
impl ListSource for MyApplications {
    type Row = ApplicationEntry;

    async fn load(&self) -> Result<Vec<ApplicationEntry>> {
        if self.applicant_id.trim().is_empty() {
            return Err(AppError::Unauthorized("Not signed in".into()));
        }
        self.store.applications_by_applicant(&self.applicant_id).await
    }
}

/// Validate a user-typed CV link, returning it normalized.
pub fn validate_cv_link(link: &str) -> Result<String> {
    normalize_url(link)
        .ok_or_else(|| AppError::validation("Please enter a valid link starting with http(s)://"))
}
