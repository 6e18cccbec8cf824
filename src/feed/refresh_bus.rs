//! In-process publish/subscribe for "job data changed".
//!
//! Any screen can invalidate any other screen's list without holding a
//! reference to it: mutations call `publish`, lists subscribe and refetch
//! from page 0. No payload is carried and publishes are not coalesced.
//!
//! The bus is a plain value passed to whoever needs it. Registrations are a
//! set keyed by `Arc` identity: subscribing the same `Arc` twice notifies it
//! once, while two separately allocated listeners are two entries.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use futures::future::join_all;
use futures::stream::{Stream, StreamExt};

use crate::error::Result;
use crate::store::ChangeEvent;

/// Something that re-derives its state when job data changes.
#[async_trait]
pub trait RefreshListener: Send + Sync {
    async fn on_refresh(&self);
}

struct FnListener<F>(F);

#[async_trait]
impl<F, Fut> RefreshListener for FnListener<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_refresh(&self) {
        (self.0)().await
    }
}

/// Wrap an async closure as a listener.
///
/// Keep the returned `Arc` and reuse it; every call allocates a new identity.
pub fn listener_fn<F, Fut>(f: F) -> Arc<dyn RefreshListener>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(FnListener(f))
}

struct Entry {
    listener: Arc<dyn RefreshListener>,
    handles: usize,
}

#[derive(Default)]
struct Registry {
    entries: HashMap<usize, Entry>,
}

/// Identity of a listener: the address of its allocation.
fn identity(listener: &Arc<dyn RefreshListener>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

/// Publish/subscribe registry.
#[derive(Clone, Default)]
pub struct RefreshBus {
    registry: Arc<Mutex<Registry>>,
}

impl RefreshBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener until the returned handle is dropped or
    /// `unsubscribe`d.
    pub fn subscribe(&self, listener: Arc<dyn RefreshListener>) -> Subscription {
        let key = identity(&listener);
        self.registry()
            .entries
            .entry(key)
            .or_insert(Entry {
                listener,
                handles: 0,
            })
            .handles += 1;

        Subscription {
            registry: Arc::downgrade(&self.registry),
            key,
        }
    }

    /// Number of distinct listeners.
    pub fn subscriber_count(&self) -> usize {
        self.registry().entries.len()
    }

    /// Notify every listener and wait for all of them.
    ///
    /// Listeners run concurrently in no particular order. With no listeners
    /// this completes immediately.
    pub async fn publish(&self) {
        let listeners: Vec<Arc<dyn RefreshListener>> = self
            .registry()
            .entries
            .values()
            .map(|e| Arc::clone(&e.listener))
            .collect();

        log::debug!("Refresh published to {} listener(s)", listeners.len());
        join_all(listeners.iter().map(|l| l.on_refresh())).await;
    }
}

/// Handle returned by `RefreshBus::subscribe`.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    key: usize,
}

impl Subscription {
    /// Stop receiving refreshes.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = registry.entries.get_mut(&self.key) {
            entry.handles -= 1;
            if entry.handles == 0 {
                registry.entries.remove(&self.key);
            }
        }
    }
}

/// Publish on the bus for every event of a row-change stream.
///
/// Change notifications are best effort: stream errors are logged and
/// skipped. Returns when the stream ends.
pub async fn forward_changes<S>(mut changes: S, bus: RefreshBus)
where
    S: Stream<Item = Result<ChangeEvent>> + Unpin,
{
    while let Some(item) = changes.next().await {
        match item {
            Ok(event) => {
                log::debug!("Row change on {} ({:?})", event.table, event.kind);
                bus.publish().await;
            }
            Err(e) => log::warn!("Change notification failed: {}", e),
        }
    }
    log::info!("Change notifications ended; relying on manual refresh");
}
