//! The job feed: filters, paging and cross-screen refresh.
//!
//! ```text
//! FilterState --(effective change)--> FeedFetcher --> FeedView
//!                                        ^
//! RefreshBus --------(publish)-----------+
//!      |
//!      +----(publish)----> LiveList (posted jobs, my applications)
//! ```

mod fetcher;
mod filter_state;
mod lists;
mod refresh_bus;
mod view;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

pub use fetcher::{FeedFetcher, FeedSnapshot, FetchState};
pub use filter_state::FilterState;
pub use lists::{ListSource, LiveList};
pub use refresh_bus::{RefreshBus, RefreshListener, Subscription, forward_changes, listener_fn};
pub use view::{FeedView, JobCard, results_label};

use crate::error::Result;
use crate::models::{FeedConfig, FilterSelection};
use crate::store::JobStore;

/// One mounted feed screen.
///
/// Loads page 0 as soon as it is mounted, then refetches page 0 whenever the
/// effective filter selection changes or anything is published on the bus. Dropping it unsubscribes and stops
/// watching the filters.
pub struct JobFeed {
    filters: FilterState,
    fetcher: FeedFetcher,
    store: Arc<dyn JobStore>,
    _subscription: Subscription,
    watcher: JoinHandle<()>,
}

impl JobFeed {
    /// Mount a feed. Must be called within a tokio runtime.
    pub fn new(store: Arc<dyn JobStore>, bus: &RefreshBus, config: &FeedConfig) -> Self {
        let filters = FilterState::new(Duration::from_millis(config.debounce_ms));
        let fetcher = FeedFetcher::new(Arc::clone(&store), config);
        let subscription = bus.subscribe(Arc::new(fetcher.clone()));

        let mut effective = filters.subscribe();
        let watched = fetcher.clone();
        let watcher = tokio::spawn(async move {
            // Page 0 for the selection at mount, then once per settled change
            let initial = effective.borrow_and_update().clone();
            if let Err(e) = watched.refresh(initial).await {
                log::warn!("Initial feed load failed: {}", e);
            }
            while effective.changed().await.is_ok() {
                let selection = effective.borrow_and_update().clone();
                if let Err(e) = watched.refresh(selection).await {
                    log::warn!("Feed refresh after filter change failed: {}", e);
                }
            }
        });

        Self {
            filters,
            fetcher,
            store,
            _subscription: subscription,
            watcher,
        }
    }

    /// Selection as currently edited, including undebounced search text.
    pub fn selection(&self) -> &FilterSelection {
        self.filters.selection()
    }

    pub fn active_filter_count(&self) -> usize {
        self.filters.selection().active_count()
    }

    pub fn set_query(&mut self, text: impl Into<String>) {
        self.filters.set_query(text);
    }

    pub fn set_filters(&mut self, selection: FilterSelection) {
        self.filters.set_filters(selection);
    }

    pub fn update_filters(&mut self, edit: impl FnOnce(&mut FilterSelection)) {
        self.filters.update(edit);
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear_all();
    }

    /// Pull to refresh with the effective selection.
    pub async fn refresh(&self) -> Result<()> {
        self.fetcher.refresh(self.filters.effective()).await
    }

    /// Scrolled near the end.
    pub async fn load_more(&self) -> Result<bool> {
        self.fetcher.load_more().await
    }

    pub fn view(&self) -> FeedView {
        FeedView::from_snapshot(&self.fetcher.snapshot())
    }

    pub fn fetcher(&self) -> &FeedFetcher {
        &self.fetcher
    }

    /// Locations offered by the filter panel.
    pub async fn available_locations(&self) -> Result<Vec<String>> {
        self.store.distinct_locations().await
    }
}

impl Drop for JobFeed {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}
