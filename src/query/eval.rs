//! In-process evaluation of a composed query, with SQL null semantics.

use std::cmp::Ordering;

use super::{Column, Filter, JobQuery, OrderBy, Value};
use crate::models::{Job, Page};

impl Column {
    /// The row's value for this column; `None` is SQL NULL.
    pub fn value_of(&self, job: &Job) -> Option<Value> {
        match self {
            Column::Id => Some(Value::Text(job.id.clone())),
            Column::IsActive => Some(Value::Bool(job.is_active)),
            Column::Title => Some(Value::Text(job.title.clone())),
            Column::JobType => Some(Value::Text(job.job_type.as_str().to_string())),
            Column::Location => Some(Value::Text(job.location.clone())),
            Column::WorkMode => job.work_mode.map(|m| Value::Text(m.as_str().to_string())),
            Column::ExperienceLevel => job
                .experience_level
                .map(|l| Value::Text(l.as_str().to_string())),
            Column::MinSalary => job.min_salary.map(Value::Int),
            Column::MaxSalary => job.max_salary.map(Value::Int),
            Column::CreatedAt => Some(Value::Time(job.created_at)),
        }
    }
}

impl Filter {
    /// Whether a row satisfies this conjunct. Comparisons against NULL fail.
    pub fn matches(&self, job: &Job) -> bool {
        let Some(actual) = self.column().value_of(job) else {
            return false;
        };

        match (self, &actual) {
            (Filter::Eq(_, expected), _) => actual == *expected,
            (Filter::In(_, values), Value::Text(s)) => values.iter().any(|v| v == s),
            (Filter::ContainsIgnoreCase(_, needle), Value::Text(s)) => {
                s.to_lowercase().contains(&needle.to_lowercase())
            }
            (Filter::Gte(_, bound), _) => matches!(
                actual.partial_cmp(bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (Filter::Lte(_, bound), _) => matches!(
                actual.partial_cmp(bound),
                Some(Ordering::Less | Ordering::Equal)
            ),
            _ => false,
        }
    }
}

impl OrderBy {
    fn compare(&self, a: &Job, b: &Job) -> Ordering {
        // Without an explicit placement NULLs sort as the largest value
        let nulls_after = self.nulls_last || self.ascending;

        match (self.column.value_of(a), self.column.value_of(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) if nulls_after => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) if nulls_after => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                if self.ascending { ord } else { ord.reverse() }
            }
        }
    }
}

impl JobQuery {
    /// Whether a row satisfies every filter.
    pub fn matches(&self, job: &Job) -> bool {
        self.filters.iter().all(|f| f.matches(job))
    }

    /// Multi-key ordering of two rows.
    pub fn compare(&self, a: &Job, b: &Job) -> Ordering {
        self.order
            .iter()
            .map(|key| key.compare(a, b))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Filter, sort and slice rows into the requested page.
    pub fn execute<'a>(&self, rows: impl IntoIterator<Item = &'a Job>) -> Page {
        let mut matching: Vec<&Job> = rows.into_iter().filter(|job| self.matches(job)).collect();
        matching.sort_by(|a, b| self.compare(a, b));

        let total = matching.len();
        let rows = matching
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .cloned()
            .collect();

        Page { rows, total }
    }
}
