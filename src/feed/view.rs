//! What the feed screen renders for a given fetcher snapshot.

use std::fmt;

use chrono::NaiveDate;

use crate::feed::{FeedSnapshot, FetchState};
use crate::models::{Job, JobType};
use crate::utils::sanitize;

/// A job as shown in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub id: String,
    pub title: String,
    pub location: String,
    pub salary: String,
    pub job_type: JobType,
    /// Markup-free description
    pub description: String,
    pub deadline: NaiveDate,
}

impl From<&Job> for JobCard {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: sanitize(&job.title),
            location: sanitize(&job.location),
            salary: sanitize(&job.salary),
            job_type: job.job_type,
            description: sanitize(&job.description),
            deadline: job.deadline,
        }
    }
}

/// Render state of the feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedView {
    /// First page in flight with nothing to show yet
    Loading,
    /// Query finished with no matches
    Empty,
    Rows {
        cards: Vec<JobCard>,
        total: usize,
        /// Page 0 being refetched while old rows stay visible
        refreshing: bool,
        /// Footer spinner
        loading_more: bool,
        has_more: bool,
    },
    Error(String),
}

impl FeedView {
    pub fn from_snapshot(snapshot: &FeedSnapshot) -> Self {
        if let FetchState::Error(message) = &snapshot.state {
            return FeedView::Error(message.clone());
        }
        if snapshot.rows.is_empty() {
            return match snapshot.state {
                FetchState::Idle | FetchState::Loading => FeedView::Loading,
                _ => FeedView::Empty,
            };
        }
        FeedView::Rows {
            cards: snapshot.rows.iter().map(JobCard::from).collect(),
            total: snapshot.total.unwrap_or(snapshot.rows.len()),
            refreshing: snapshot.state == FetchState::Loading,
            loading_more: snapshot.state == FetchState::LoadingMore,
            has_more: snapshot.has_more,
        }
    }
}

/// Header line above the list.
pub fn results_label(total: usize) -> String {
    if total == 1 {
        "1 job found".to_string()
    } else {
        format!("{} jobs found", total)
    }
}

impl fmt::Display for FeedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedView::Loading => writeln!(f, "Loading jobs..."),
            FeedView::Empty => {
                writeln!(f, "No jobs found")?;
                writeln!(f, "Try changing your filters or search to see results.")
            }
            FeedView::Error(message) => writeln!(f, "Error: {}", message),
            FeedView::Rows {
                cards,
                total,
                loading_more,
                has_more,
                ..
            } => {
                writeln!(f, "{}", results_label(*total))?;
                for card in cards {
                    writeln!(f)?;
                    writeln!(f, "  {}  [{}]", card.title, card.job_type)?;
                    writeln!(f, "  {}  {}", card.location, card.salary)?;
                    if !card.description.is_empty() {
                        writeln!(f, "  {}", preview(&card.description, 100))?;
                    }
                    writeln!(f, "  Deadline: {}", card.deadline)?;
                }
                if *loading_more {
                    writeln!(f, "\n  Loading more...")?;
                } else if *has_more {
                    writeln!(f, "\n  Showing {} of {}", cards.len(), total)?;
                }
                Ok(())
            }
        }
    }
}

/// First `max` characters of `text` on one line.
fn preview(text: &str, max: usize) -> String {
    let line = crate::utils::text::squish(text);
    if line.chars().count() <= max {
        return line;
    }
    let cut: String = line.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}
