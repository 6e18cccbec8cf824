//! User-controlled filter selection for the job feed.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::job::{ExperienceLevel, JobType, WorkMode};

/// Inclusive salary bounds requested by the user.
///
/// `min > max` is kept as entered; the query layer does not interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: i64,
    pub max: i64,
}

impl SalaryRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

/// How recently a job must have been posted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DatePosted {
    #[default]
    #[serde(rename = "all")]
    All,
    #[serde(rename = "24h")]
    #[cfg_attr(feature = "cli", value(name = "24h"))]
    Day,
    #[serde(rename = "week")]
    Week,
    #[serde(rename = "month")]
    Month,
}

impl DatePosted {
    /// Look-back window, `None` for no constraint.
    pub fn window(&self) -> Option<Duration> {
        match self {
            DatePosted::All => None,
            DatePosted::Day => Some(Duration::days(1)),
            DatePosted::Week => Some(Duration::days(7)),
            DatePosted::Month => Some(Duration::days(30)),
        }
    }
}

/// Feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "cli", value(rename_all = "snake_case"))]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    SalaryHigh,
    SalaryLow,
}

/// Active search text and structured filters.
///
/// Every set-valued field defaults to empty, meaning "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub job_types: BTreeSet<JobType>,
    #[serde(default)]
    pub locations: BTreeSet<String>,
    #[serde(default)]
    pub work_modes: BTreeSet<WorkMode>,
    #[serde(default)]
    pub experience_levels: BTreeSet<ExperienceLevel>,
    #[serde(default)]
    pub salary_range: Option<SalaryRange>,
    #[serde(default)]
    pub date_posted: DatePosted,
    #[serde(default, rename = "sortBy")]
    pub sort: SortOrder,
}

impl FilterSelection {
    /// Number of active structured filters (search text and sort excluded).
    pub fn active_count(&self) -> usize {
        [
            !self.job_types.is_empty(),
            !self.locations.is_empty(),
            !self.work_modes.is_empty(),
            !self.experience_levels.is_empty(),
            self.salary_range.is_some(),
            self.date_posted != DatePosted::All,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// Same selection with a different search text.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..self.clone()
        }
    }
}
