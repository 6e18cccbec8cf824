//! Paginated fetcher.
//!
//! Accumulates fixed-size pages of one filter selection. Every refresh
//! starts a new generation; a response that comes back for an older
//! generation is dropped, so only the latest selection's rows are kept.
//!
//! The total count is taken from page 0 of each generation. Later pages
//! that report a different total are logged and ignored, and a short page
//! ends the feed regardless of the count.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::feed::RefreshListener;
use crate::models::{FeedConfig, FilterSelection, Job, Page};
use crate::query::build_query;
use crate::store::JobStore;

/// Fetcher lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    /// Page 0 in flight
    Loading,
    Ready,
    /// A later page in flight
    LoadingMore,
    /// Last fetch failed; holds the user-facing message
    Error(String),
}

#[derive(Default)]
struct Buffer {
    state: FetchState,
    rows: Vec<Job>,
    total: Option<usize>,
    exhausted: bool,
    pages_loaded: usize,
    generation: u64,
    selection: FilterSelection,
}

impl Buffer {
    fn has_more(&self) -> bool {
        !self.exhausted && self.total.is_some_and(|total| self.rows.len() < total)
    }
}

/// Point-in-time copy of the fetcher's buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub state: FetchState,
    pub rows: Vec<Job>,
    pub total: Option<usize>,
    pub has_more: bool,
}

#[derive(Clone)]
pub struct FeedFetcher {
    store: Arc<dyn JobStore>,
    buffer: Arc<Mutex<Buffer>>,
    page_size: usize,
    read_attempts: u32,
}

impl FeedFetcher {
    pub fn new(store: Arc<dyn JobStore>, config: &FeedConfig) -> Self {
        Self {
            store,
            buffer: Arc::new(Mutex::new(Buffer::default())),
            page_size: config.page_size.max(1),
            read_attempts: config.read_attempts.max(1),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> FetchState {
        self.buffer().state.clone()
    }

    pub fn rows(&self) -> Vec<Job> {
        self.buffer().rows.clone()
    }

    /// Total reported by page 0 of the current generation.
    pub fn total(&self) -> Option<usize> {
        self.buffer().total
    }

    pub fn has_more(&self) -> bool {
        self.buffer().has_more()
    }

    /// Selection of the latest refresh.
    pub fn selection(&self) -> FilterSelection {
        self.buffer().selection.clone()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let buffer = self.buffer();
        FeedSnapshot {
            state: buffer.state.clone(),
            rows: buffer.rows.clone(),
            total: buffer.total,
            has_more: buffer.has_more(),
        }
    }

    /// Discard the buffer and fetch page 0 of `selection`.
    ///
    /// Allowed from any state. Any fetch still in flight is superseded and
    /// its response will be dropped.
    pub async fn refresh(&self, selection: FilterSelection) -> Result<()> {
        let generation = {
            let mut buffer = self.buffer();
            buffer.generation += 1;
            buffer.state = FetchState::Loading;
            buffer.selection = selection.clone();
            buffer.generation
        };
        log::debug!("Fetching page 0 (generation {})", generation);

        let result = self.fetch_page(&selection, 0).await;

        let mut buffer = self.buffer();
        if buffer.generation != generation {
            log::debug!("Dropping stale page 0 (generation {})", generation);
            return Ok(());
        }
        match result {
            Ok(page) => {
                buffer.exhausted = page.rows.len() < self.page_size || page.rows.len() >= page.total;
                buffer.total = Some(page.total);
                buffer.rows = page.rows;
                buffer.pages_loaded = 1;
                buffer.state = FetchState::Ready;
                log::info!(
                    "Loaded {} of {} job(s)",
                    buffer.rows.len(),
                    page.total
                );
                Ok(())
            }
            Err(e) => {
                buffer.state = FetchState::Error(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch and append the next page.
    ///
    /// A no-op returning `false` unless the fetcher is `Ready` with rows
    /// still to load, so overlapping calls never issue a second request.
    pub async fn load_more(&self) -> Result<bool> {
        let (generation, page_index, selection) = {
            let mut buffer = self.buffer();
            if buffer.state != FetchState::Ready || !buffer.has_more() {
                return Ok(false);
            }
            buffer.state = FetchState::LoadingMore;
            (
                buffer.generation,
                buffer.pages_loaded,
                buffer.selection.clone(),
            )
        };
        log::debug!("Fetching page {} (generation {})", page_index, generation);

        let result = self.fetch_page(&selection, page_index).await;

        let mut buffer = self.buffer();
        if buffer.generation != generation {
            log::debug!(
                "Dropping stale page {} (generation {})",
                page_index,
                generation
            );
            return Ok(false);
        }
        match result {
            Ok(page) => {
                if buffer.total != Some(page.total) {
                    log::warn!(
                        "Page {} reported {} total row(s), keeping {:?} from page 0",
                        page_index,
                        page.total,
                        buffer.total
                    );
                }
                if page.rows.len() < self.page_size {
                    buffer.exhausted = true;
                }
                buffer.rows.extend(page.rows);
                buffer.pages_loaded += 1;
                buffer.state = FetchState::Ready;
                Ok(true)
            }
            Err(e) => {
                buffer.state = FetchState::Error(e.user_message());
                Err(e)
            }
        }
    }

    /// Back to `Idle` with an empty buffer. In-flight responses are dropped.
    pub fn reset(&self) {
        let mut buffer = self.buffer();
        let generation = buffer.generation + 1;
        let selection = std::mem::take(&mut buffer.selection);
        *buffer = Buffer {
            generation,
            selection,
            ..Buffer::default()
        };
    }

    /// One page read, retried up to `read_attempts` times on transient failures.
    async fn fetch_page(&self, selection: &FilterSelection, page: usize) -> Result<Page> {
        let query = build_query(selection, page, self.page_size, Utc::now());
        let mut attempt = 1;
        loop {
            match self.store.fetch_jobs(&query).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.read_attempts && is_transient(&e) => {
                    log::warn!(
                        "Page {} read failed (attempt {}/{}): {}",
                        page,
                        attempt,
                        self.read_attempts,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => {
                    log::error!("Page {} read failed: {}", page, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Transport failures and server-side (5xx) rejections are worth another
/// attempt. Client errors and database codes fail the same way every time.
fn is_transient(err: &AppError) -> bool {
    match err {
        AppError::Http(e) => e.status().is_none_or(|status| status.is_server_error()),
        AppError::Remote { code, .. } => code
            .parse::<u16>()
            .is_ok_and(|status| (500..600).contains(&status)),
        _ => false,
    }
}

#[async_trait]
impl RefreshListener for FeedFetcher {
    async fn on_refresh(&self) {
        if let Err(e) = self.refresh(self.selection()).await {
            log::warn!("Refresh failed: {}", e);
        }
    }
}
