//! Unpaged, user-scoped lists kept fresh by the refresh bus.
//!
//! The employer's posted jobs and the applicant's applications are small
//! enough to load whole. A mounted `LiveList` reloads on every publish, so a
//! mutation on any screen shows up here without a direct reference.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::refresh_bus::{RefreshBus, RefreshListener, Subscription};
use crate::error::Result;

/// Where a list's rows come from.
#[async_trait]
pub trait ListSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    /// Fetch the whole list.
    async fn load(&self) -> Result<Vec<Self::Row>>;
}

struct Loaded<T> {
    rows: Option<Vec<T>>,
    error: Option<String>,
}

struct ListState<S: ListSource> {
    source: S,
    loaded: Mutex<Loaded<S::Row>>,
}

impl<S: ListSource> ListState<S> {
    fn loaded(&self) -> MutexGuard<'_, Loaded<S::Row>> {
        self.loaded.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the rows. A failed load keeps the previous rows.
    async fn reload(&self) -> Result<()> {
        match self.source.load().await {
            Ok(rows) => {
                let mut loaded = self.loaded();
                loaded.rows = Some(rows);
                loaded.error = None;
                Ok(())
            }
            Err(e) => {
                self.loaded().error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<S: ListSource> RefreshListener for ListState<S> {
    async fn on_refresh(&self) {
        if let Err(e) = self.reload().await {
            log::warn!("List reload failed: {}", e);
        }
    }
}

/// A mounted list. Dropping it unsubscribes.
pub struct LiveList<S: ListSource> {
    state: Arc<ListState<S>>,
    _subscription: Subscription,
}

impl<S: ListSource> LiveList<S> {
    /// Subscribe to the bus and load the first time.
    ///
    /// A failed first load is logged and reported through `error`.
    pub async fn mount(source: S, bus: &RefreshBus) -> Self {
        let state = Arc::new(ListState {
            source,
            loaded: Mutex::new(Loaded {
                rows: None,
                error: None,
            }),
        });
        let subscription = bus.subscribe(Arc::clone(&state) as Arc<dyn RefreshListener>);

        if let Err(e) = state.reload().await {
            log::warn!("Initial list load failed: {}", e);
        }

        Self {
            state,
            _subscription: subscription,
        }
    }

    /// Pull to refresh.
    pub async fn refresh(&self) -> Result<()> {
        self.state.reload().await
    }

    /// Rows from the last successful load; empty before one.
    pub fn rows(&self) -> Vec<S::Row> {
        self.state.loaded().rows.clone().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.loaded().rows.is_some()
    }

    /// User-facing text of the last failed load, cleared by a successful one.
    pub fn error(&self) -> Option<String> {
        self.state.loaded().error.clone()
    }

    pub fn source(&self) -> &S {
        &self.state.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::AppError;

    #[derive(Clone, Default)]
    struct Counter {
        loads: Arc<AtomicUsize>,
        failing: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ListSource for Counter {
        type Row = usize;

        async fn load(&self) -> Result<Vec<usize>> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            if self.failing.load(Ordering::SeqCst) > 0 {
                return Err(AppError::remote("503", "backend unavailable"));
            }
            Ok((0..n).collect())
        }
    }

    #[tokio::test]
    async fn test_mount_loads_and_publish_reloads() {
        let bus = RefreshBus::new();
        let source = Counter::default();
        let list = LiveList::mount(source.clone(), &bus).await;

        assert!(list.is_loaded());
        assert_eq!(list.rows(), vec![0]);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish().await;
        assert_eq!(list.rows(), vec![0, 1]);
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_rows() {
        let bus = RefreshBus::new();
        let source = Counter::default();
        let list = LiveList::mount(source.clone(), &bus).await;

        source.failing.store(1, Ordering::SeqCst);
        bus.publish().await;
        assert_eq!(list.rows(), vec![0]);
        assert_eq!(list.error().as_deref(), Some("backend unavailable"));

        source.failing.store(0, Ordering::SeqCst);
        list.refresh().await.unwrap();
        assert_eq!(list.rows().len(), 3);
        assert_eq!(list.error(), None);
    }

    #[tokio::test]
    async fn test_failed_first_load_is_not_loaded() {
        let bus = RefreshBus::new();
        let source = Counter::default();
        source.failing.store(1, Ordering::SeqCst);

        let list = LiveList::mount(source, &bus).await;
        assert!(!list.is_loaded());
        assert!(list.rows().is_empty());
        assert!(list.error().is_some());
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let bus = RefreshBus::new();
        let source = Counter::default();
        let list = LiveList::mount(source.clone(), &bus).await;
        drop(list);

        assert_eq!(bus.subscriber_count(), 0);
        bus.publish().await;
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
    }
}
