//! Filter state with debounced search text.
//!
//! The raw selection follows every edit. The *effective* selection, the one
//! the feed queries with, is published on a `watch` channel:
//!
//! - search text lands only after `debounce` without another keystroke
//! - structured filters land immediately
//! - `clear_all` resets everything in a single update

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::models::FilterSelection;

pub struct FilterState {
    raw: FilterSelection,
    effective: Arc<watch::Sender<FilterSelection>>,
    pending: Option<JoinHandle<()>>,
    debounce: Duration,
}

impl FilterState {
    pub fn new(debounce: Duration) -> Self {
        let (effective, _) = watch::channel(FilterSelection::default());
        Self {
            raw: FilterSelection::default(),
            effective: Arc::new(effective),
            pending: None,
            debounce,
        }
    }

    /// Selection as the user currently sees it, including undebounced text.
    pub fn selection(&self) -> &FilterSelection {
        &self.raw
    }

    /// Selection the feed should query with right now.
    pub fn effective(&self) -> FilterSelection {
        self.effective.borrow().clone()
    }

    /// Receiver notified on every effective change.
    pub fn subscribe(&self) -> watch::Receiver<FilterSelection> {
        self.effective.subscribe()
    }

    /// Whether search text is waiting for the debounce timer.
    pub fn is_debouncing(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Record a keystroke. Must be called within a tokio runtime.
    pub fn set_query(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.raw.query {
            return;
        }
        self.raw.query = text.clone();
        self.cancel_pending();

        let effective = Arc::clone(&self.effective);
        let debounce = self.debounce;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            effective.send_if_modified(|selection| {
                if selection.query == text {
                    return false;
                }
                log::debug!("Search text settled: {:?}", text);
                selection.query = text;
                true
            });
        }));
    }

    /// Replace the whole selection. Structured fields apply immediately;
    /// a changed search text still goes through the debounce.
    pub fn set_filters(&mut self, selection: FilterSelection) {
        let query = selection.query.clone();
        self.raw = selection.with_query(self.raw.query.clone());
        self.publish_structured();
        self.set_query(query);
    }

    /// Edit the selection in place.
    pub fn update(&mut self, edit: impl FnOnce(&mut FilterSelection)) {
        let mut next = self.raw.clone();
        edit(&mut next);
        self.set_filters(next);
    }

    /// Reset every field to its default in one effective update.
    pub fn clear_all(&mut self) {
        self.cancel_pending();
        self.raw = FilterSelection::default();
        self.effective.send_if_modified(|selection| {
            if *selection == FilterSelection::default() {
                return false;
            }
            *selection = FilterSelection::default();
            true
        });
    }

    /// Push the raw structured fields, keeping the effective search text.
    fn publish_structured(&self) {
        self.effective.send_if_modified(|selection| {
            let next = self.raw.with_query(selection.query.clone());
            if *selection == next {
                return false;
            }
            *selection = next;
            true
        });
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for FilterState {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobType, SortOrder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    /// Count effective updates seen by a receiver.
    fn count_changes(state: &FilterState) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let mut rx = state.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_produces_one_effective_query() {
        let mut state = FilterState::new(DEBOUNCE);
        let changes = count_changes(&state);

        let word = "developer";
        for end in 1..=word.len() {
            state.set_query(&word[..end]);
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        assert_eq!(changes.load(Ordering::SeqCst), 0);
        assert!(state.effective().query.is_empty());

        tokio::time::sleep(DEBOUNCE + Duration::from_millis(10)).await;
        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(state.effective().query, "developer");
        assert!(!state.is_debouncing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_structured_filters_apply_immediately() {
        let mut state = FilterState::new(DEBOUNCE);
        let changes = count_changes(&state);

        state.update(|s| {
            s.job_types.insert(JobType::FullTime);
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert!(state.effective().job_types.contains(&JobType::FullTime));
    }

    #[tokio::test(start_paused = true)]
    async fn test_structured_change_keeps_settled_text_only() {
        let mut state = FilterState::new(DEBOUNCE);
        state.set_query("rust");
        tokio::time::sleep(DEBOUNCE * 2).await;

        state.set_query("rust dev");
        state.update(|s| s.sort = SortOrder::Oldest);

        let effective = state.effective();
        assert_eq!(effective.sort, SortOrder::Oldest);
        assert_eq!(effective.query, "rust");
        assert_eq!(state.selection().query, "rust dev");

        tokio::time::sleep(DEBOUNCE * 2).await;
        assert_eq!(state.effective().query, "rust dev");
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_all_is_one_update_and_cancels_typing() {
        let mut state = FilterState::new(DEBOUNCE);
        state.update(|s| {
            s.job_types.insert(JobType::Contract);
            s.locations.insert("Tirana".into());
            s.sort = SortOrder::SalaryLow;
        });
        tokio::time::sleep(Duration::from_millis(1)).await;

        let changes = count_changes(&state);
        state.set_query("designer");
        state.clear_all();
        tokio::time::sleep(DEBOUNCE * 2).await;

        assert_eq!(changes.load(Ordering::SeqCst), 1);
        assert_eq!(state.effective(), FilterSelection::default());
        assert_eq!(*state.selection(), FilterSelection::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_selection_not_republished() {
        let mut state = FilterState::new(DEBOUNCE);
        let changes = count_changes(&state);

        state.set_filters(FilterSelection::default());
        state.clear_all();
        tokio::time::sleep(DEBOUNCE * 2).await;

        assert_eq!(changes.load(Ordering::SeqCst), 0);
    }
}
