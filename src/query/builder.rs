// src/query/builder.rs

//! Filter selection → composed query.

use chrono::{DateTime, Utc};

use super::{Column, Filter, JobQuery, OrderBy, Value};
use crate::models::{FilterSelection, SortOrder};

/// Compose the feed query for one page of a selection.
///
/// Pure: the current time is passed in so the date window is reproducible.
/// Every active dimension adds one conjunct; empty sets add nothing.
pub fn build_query(
    selection: &FilterSelection,
    page: usize,
    page_size: usize,
    now: DateTime<Utc>,
) -> JobQuery {
    let mut filters = vec![Filter::Eq(Column::IsActive, Value::Bool(true))];

    let text = selection.query.trim();
    if !text.is_empty() {
        filters.push(Filter::ContainsIgnoreCase(Column::Title, text.to_string()));
    }

    push_in(
        &mut filters,
        Column::JobType,
        selection.job_types.iter().map(|t| t.as_str().to_string()),
    );
    push_in(
        &mut filters,
        Column::Location,
        selection.locations.iter().cloned(),
    );
    push_in(
        &mut filters,
        Column::WorkMode,
        selection.work_modes.iter().map(|m| m.as_str().to_string()),
    );
    push_in(
        &mut filters,
        Column::ExperienceLevel,
        selection.experience_levels.iter().map(|l| l.as_str().to_string()),
    );

    // Overlap, not containment: job.max >= filter.min AND job.min <= filter.max
    if let Some(range) = selection.salary_range {
        filters.push(Filter::Gte(Column::MaxSalary, Value::Int(range.min)));
        filters.push(Filter::Lte(Column::MinSalary, Value::Int(range.max)));
    }

    if let Some(window) = selection.date_posted.window() {
        filters.push(Filter::Gte(Column::CreatedAt, Value::Time(now - window)));
    }

    JobQuery {
        filters,
        order: ordering(selection.sort),
        offset: page * page_size,
        limit: page_size,
    }
}

fn push_in(filters: &mut Vec<Filter>, column: Column, values: impl Iterator<Item = String>) {
    let values: Vec<String> = values.collect();
    if !values.is_empty() {
        filters.push(Filter::In(column, values));
    }
}

/// Sort keys for an order, ending with the primary key so offset pages
/// stay stable across requests when earlier keys tie.
fn ordering(sort: SortOrder) -> Vec<OrderBy> {
    let mut keys = match sort {
        SortOrder::Newest => vec![OrderBy::desc(Column::CreatedAt)],
        SortOrder::Oldest => vec![OrderBy::asc(Column::CreatedAt)],
        SortOrder::SalaryHigh => vec![
            OrderBy::desc(Column::MaxSalary).nulls_last(),
            OrderBy::desc(Column::MinSalary).nulls_last(),
        ],
        SortOrder::SalaryLow => vec![
            OrderBy::asc(Column::MinSalary).nulls_last(),
            OrderBy::asc(Column::MaxSalary).nulls_last(),
        ],
    };
    keys.push(OrderBy::asc(Column::Id));
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DatePosted, JobType, SalaryRange, WorkMode};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_default_selection_only_filters_active() {
        let query = build_query(&FilterSelection::default(), 0, 10, now());
        assert_eq!(
            query.filters,
            vec![Filter::Eq(Column::IsActive, Value::Bool(true))]
        );
        assert_eq!(
            query.order,
            vec![OrderBy::desc(Column::CreatedAt), OrderBy::asc(Column::Id)]
        );
        assert_eq!((query.offset, query.limit), (0, 10));
    }

    #[test]
    fn test_empty_job_types_add_no_constraint() {
        let mut selection = FilterSelection::default();
        selection.work_modes.insert(WorkMode::Remote);
        let query = build_query(&selection, 0, 10, now());
        assert_eq!(query.filters_on(Column::JobType).count(), 0);

        // Clearing a dimension is the same as never setting it
        selection.job_types.insert(JobType::Contract);
        selection.job_types.clear();
        assert_eq!(build_query(&selection, 0, 10, now()), query);
    }

    #[test]
    fn test_set_filters_become_membership() {
        let mut selection = FilterSelection::default();
        selection.job_types.insert(JobType::FullTime);
        selection.job_types.insert(JobType::Internship);
        selection.locations.insert("Tirana".into());

        let query = build_query(&selection, 0, 10, now());
        assert!(query.filters.contains(&Filter::In(
            Column::JobType,
            vec!["full-time".into(), "internship".into()]
        )));
        assert!(
            query
                .filters
                .contains(&Filter::In(Column::Location, vec!["Tirana".into()]))
        );
    }

    #[test]
    fn test_search_text_is_trimmed() {
        let query = build_query(
            &FilterSelection::default().with_query("  developer "),
            0,
            10,
            now(),
        );
        assert!(
            query
                .filters
                .contains(&Filter::ContainsIgnoreCase(Column::Title, "developer".into()))
        );

        let blank = build_query(&FilterSelection::default().with_query("   "), 0, 10, now());
        assert_eq!(blank.filters_on(Column::Title).count(), 0);
    }

    #[test]
    fn test_salary_range_uses_overlap() {
        let selection = FilterSelection {
            salary_range: Some(SalaryRange::new(800, 1200)),
            ..Default::default()
        };
        let query = build_query(&selection, 0, 10, now());
        assert!(
            query
                .filters
                .contains(&Filter::Gte(Column::MaxSalary, Value::Int(800)))
        );
        assert!(
            query
                .filters
                .contains(&Filter::Lte(Column::MinSalary, Value::Int(1200)))
        );
    }

    #[test]
    fn test_inverted_salary_range_passes_through() {
        let selection = FilterSelection {
            salary_range: Some(SalaryRange::new(2000, 100)),
            ..Default::default()
        };
        let query = build_query(&selection, 0, 10, now());
        assert!(
            query
                .filters
                .contains(&Filter::Gte(Column::MaxSalary, Value::Int(2000)))
        );
    }

    #[test]
    fn test_date_window() {
        let selection = FilterSelection {
            date_posted: DatePosted::Week,
            ..Default::default()
        };
        let query = build_query(&selection, 0, 10, now());
        assert!(query.filters.contains(&Filter::Gte(
            Column::CreatedAt,
            Value::Time(now() - Duration::days(7))
        )));
    }

    #[test]
    fn test_salary_orderings() {
        let high = FilterSelection {
            sort: SortOrder::SalaryHigh,
            ..Default::default()
        };
        let query = build_query(&high, 0, 10, now());
        assert_eq!(
            query.order,
            vec![
                OrderBy::desc(Column::MaxSalary).nulls_last(),
                OrderBy::desc(Column::MinSalary).nulls_last(),
                OrderBy::asc(Column::Id),
            ]
        );

        let low = FilterSelection {
            sort: SortOrder::SalaryLow,
            ..Default::default()
        };
        let query = build_query(&low, 0, 10, now());
        assert_eq!(query.order[0], OrderBy::asc(Column::MinSalary).nulls_last());

        // Every order ends on the unique key
        for sort in [SortOrder::Newest, SortOrder::Oldest, SortOrder::SalaryHigh, SortOrder::SalaryLow] {
            let selection = FilterSelection {
                sort,
                ..Default::default()
            };
            let query = build_query(&selection, 0, 10, now());
            assert_eq!(query.order.last(), Some(&OrderBy::asc(Column::Id)));
        }
    }

    #[test]
    fn test_page_window() {
        let query = build_query(&FilterSelection::default(), 3, 10, now());
        assert_eq!(query.offset, 30);
        assert_eq!(query.limit, 10);
        assert_eq!(query.range_end(), 39);
    }
}
