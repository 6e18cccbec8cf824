// src/services/saved_jobs.rs

//! Bookmarked jobs.
//!
//! Bookmark state is cosmetic: every operation logs failures and returns a
//! neutral value instead of an error.

use std::sync::Arc;

use crate::error::AppError;
use crate::models::SavedJobEntry;
use crate::store::ApplicationStore;

pub struct SavedJobs {
    store: Arc<dyn ApplicationStore>,
}

impl SavedJobs {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub async fn is_saved(&self, user_id: &str, job_id: &str) -> bool {
        match self.store.find_saved_job(user_id, job_id).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                log::warn!("Checking saved job {} failed: {}", job_id, e);
                false
            }
        }
    }

    /// Bookmark a job. Already saved counts as success.
    pub async fn save(&self, user_id: &str, job_id: &str) -> bool {
        match self.store.insert_saved_job(user_id, job_id).await {
            Ok(_) | Err(AppError::AlreadyExists(_)) => true,
            Err(e) => {
                log::warn!("Saving job {} failed: {}", job_id, e);
                false
            }
        }
    }

    pub async fn unsave(&self, user_id: &str, job_id: &str) -> bool {
        match self.store.delete_saved_job(user_id, job_id).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Unsaving job {} failed: {}", job_id, e);
                false
            }
        }
    }

    /// Flip the bookmark. Returns whether the flip succeeded.
    pub async fn toggle(&self, user_id: &str, job_id: &str) -> bool {
        if self.is_saved(user_id, job_id).await {
            self.unsave(user_id, job_id).await
        } else {
            self.save(user_id, job_id).await
        }
    }

    /// Saved jobs with their postings, newest first.
    pub async fn list(&self, user_id: &str) -> Vec<SavedJobEntry> {
        self.store
            .list_saved_jobs(user_id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Listing saved jobs failed: {}", e);
                Vec::new()
            })
    }

    pub async fn count(&self, user_id: &str) -> usize {
        self.store
            .count_saved_jobs(user_id)
            .await
            .unwrap_or_else(|e| {
                log::warn!("Counting saved jobs failed: {}", e);
                0
            })
    }
}
