//! Composed job queries.
//!
//! - `build_query`: translate a filter selection into a `JobQuery`
//! - `JobQuery::to_query_pairs`: render for the REST data API
//! - `JobQuery::matches` / `JobQuery::compare`: evaluate in process

mod builder;
mod eval;
mod render;

use std::fmt;

use chrono::{DateTime, Utc};

pub use builder::build_query;

/// Columns of the `jobs` table the feed filters or sorts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    IsActive,
    Title,
    JobType,
    Location,
    WorkMode,
    ExperienceLevel,
    MinSalary,
    MaxSalary,
    CreatedAt,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::IsActive => "is_active",
            Column::Title => "title",
            Column::JobType => "job_type",
            Column::Location => "location",
            Column::WorkMode => "work_mode",
            Column::ExperienceLevel => "experience_level",
            Column::MinSalary => "min_salary",
            Column::MaxSalary => "max_salary",
            Column::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Text(String),
    Time(DateTime<Utc>),
}

/// One conjunct of the composed predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(Column, Value),
    /// Column value is one of the listed values
    In(Column, Vec<String>),
    /// Case-insensitive substring match
    ContainsIgnoreCase(Column, String),
    Gte(Column, Value),
    Lte(Column, Value),
}

impl Filter {
    pub fn column(&self) -> Column {
        match self {
            Filter::Eq(c, _)
            | Filter::In(c, _)
            | Filter::ContainsIgnoreCase(c, _)
            | Filter::Gte(c, _)
            | Filter::Lte(c, _) => *c,
        }
    }
}

/// One ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Column,
    pub ascending: bool,
    pub nulls_last: bool,
}

impl OrderBy {
    pub fn asc(column: Column) -> Self {
        Self {
            column,
            ascending: true,
            nulls_last: false,
        }
    }

    pub fn desc(column: Column) -> Self {
        Self {
            column,
            ascending: false,
            nulls_last: false,
        }
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls_last = true;
        self
    }
}

/// A fully composed feed query: predicate conjunction, ordering and page window.
#[derive(Debug, Clone, PartialEq)]
pub struct JobQuery {
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    /// Inclusive start row
    pub offset: usize,
    pub limit: usize,
}

impl JobQuery {
    /// Filters that constrain the given column.
    pub fn filters_on(&self, column: Column) -> impl Iterator<Item = &Filter> {
        self.filters.iter().filter(move |f| f.column() == column)
    }

    /// Inclusive end row, as used by `Range` style paging.
    pub fn range_end(&self) -> usize {
        (self.offset + self.limit).saturating_sub(1)
    }
}
