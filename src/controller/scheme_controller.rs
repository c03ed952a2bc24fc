use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::date_range::DateRange;
use super::search::{SearchSettings, filter_schemes};
use super::state::{AppState, ErrorKind, LoadStatus};
use crate::mfapi::{Scheme, SchemeSource};

type SearchFilter = fn(&[Scheme], &str, usize) -> Vec<Scheme>;
type TaskSlot = Mutex<Option<JoinHandle<()>>>;

/// Owns all observable application state and is its only writer.
///
/// Every mutation goes through the `watch::Sender` held here; consumers read
/// snapshots or subscribe for change notifications. Must be created inside a
/// tokio runtime, since the scheme list load starts immediately.
pub struct SchemeController {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn SchemeSource>,
    settings: SearchSettings,
    filter: SearchFilter,
    state: watch::Sender<AppState>,
    // A generation is only bumped while its task slot is locked, so the bump,
    // the state change and the handle swap land together
    search_generation: AtomicU64,
    detail_generation: AtomicU64,
    scheme_list_task: TaskSlot,
    search_task: TaskSlot,
    detail_task: TaskSlot,
}

impl SchemeController {
    #[instrument(skip(source))]
    pub fn new(source: Arc<dyn SchemeSource>, settings: SearchSettings) -> Self {
        Self::with_filter(source, settings, filter_schemes)
    }

    fn with_filter(source: Arc<dyn SchemeSource>, settings: SearchSettings, filter: SearchFilter) -> Self {
        let (state, _) = watch::channel(AppState::default());
        let inner = Arc::new(Inner {
            source,
            settings,
            filter,
            state,
            search_generation: AtomicU64::new(0),
            detail_generation: AtomicU64::new(0),
            scheme_list_task: Mutex::new(None),
            search_task: Mutex::new(None),
            detail_task: Mutex::new(None),
        });

        {
            let mut slot = lock_slot(&inner.scheme_list_task);
            inner.state.send_modify(|s| s.scheme_list_status = LoadStatus::Loading);
            swap_task(&mut slot, Some(tokio::spawn(inner.clone().load_schemes())));
        }

        Self { inner }
    }

    pub fn settings(&self) -> SearchSettings {
        self.inner.settings
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> AppState {
        self.inner.state.borrow().clone()
    }

    /// Feed the latest search text into the debounced search pipeline.
    ///
    /// Short queries clear results at once. Longer ones schedule a filter
    /// pass after the debounce delay, cancelling any pass still pending.
    pub fn on_query_changed(&self, query: impl Into<String>) {
        let query = query.into();
        let mut slot = lock_slot(&self.inner.search_task);
        let unchanged = self.inner.state.borrow().search.query == query;
        if unchanged {
            return;
        }
        self.inner.start_search(&mut slot, query);
    }

    /// Reset the query, results and current selection.
    #[instrument(skip(self))]
    pub fn clear_search(&self) {
        let mut search_slot = lock_slot(&self.inner.search_task);
        let mut detail_slot = lock_slot(&self.inner.detail_task);
        self.inner.search_generation.fetch_add(1, Ordering::SeqCst);
        self.inner.detail_generation.fetch_add(1, Ordering::SeqCst);
        swap_task(&mut search_slot, None);
        swap_task(&mut detail_slot, None);

        self.inner.state.send_modify(|s| {
            s.search.query.clear();
            s.search.results.clear();
            s.search.is_searching = false;
            s.selected_detail = None;
            s.date_range = None;
            if s.detail_status == LoadStatus::Loading {
                s.detail_status = LoadStatus::Idle;
            }
        });
        debug!("Search cleared");
    }

    /// Fetch the detail for `scheme_code`, superseding any fetch still in flight.
    #[instrument(skip(self))]
    pub fn select_scheme(&self, scheme_code: u32) {
        let mut slot = lock_slot(&self.inner.detail_task);
        let generation = self.inner.detail_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.state.send_modify(|s| s.detail_status = LoadStatus::Loading);
        let task = tokio::spawn(self.inner.clone().load_detail(generation, scheme_code));
        swap_task(&mut slot, Some(task));
    }

    /// Narrow the visible NAV history of the selected scheme.
    ///
    /// Returns false and leaves state alone when no scheme is selected.
    #[instrument(skip(self, range), fields(range = %range))]
    pub fn set_date_range(&self, range: DateRange) -> bool {
        let applied = self.inner.state.send_if_modified(|s| {
            if s.selected_detail.is_none() {
                return false;
            }
            s.date_range = Some(range);
            true
        });
        if !applied {
            warn!("Ignoring date range with no scheme selected");
        }
        applied
    }

    /// Restore the range to the selected scheme's full history.
    pub fn reset_date_range(&self) -> bool {
        self.inner.state.send_if_modified(|s| match &s.selected_detail {
            Some(detail) => {
                s.date_range = DateRange::spanning(detail);
                true
            }
            None => false,
        })
    }
}

impl Drop for SchemeController {
    fn drop(&mut self) {
        for slot in [&self.inner.scheme_list_task, &self.inner.search_task, &self.inner.detail_task] {
            swap_task(&mut lock_slot(slot), None);
        }
    }
}

impl Inner {
    #[instrument(skip(self))]
    async fn load_schemes(self: Arc<Self>) {
        match self.source.list_schemes().await {
            Ok(schemes) => {
                info!(scheme_count = schemes.len(), "Scheme list loaded");
                self.state.send_modify(|s| {
                    s.schemes = Arc::new(schemes);
                    s.scheme_list_status = LoadStatus::Loaded;
                    s.clear_error(ErrorKind::SchemeList);
                });
                self.rerun_pending_search();
            }
            Err(e) => {
                error!(error = %e, "Error fetching schemes");
                self.state.send_modify(|s| {
                    s.scheme_list_status = LoadStatus::Failed;
                    s.publish_error(ErrorKind::SchemeList, format!("Failed to load schemes: {}", e));
                });
            }
        }
    }

    // A query typed while the list was loading only saw an empty catalog
    fn rerun_pending_search(self: &Arc<Self>) {
        let mut slot = lock_slot(&self.search_task);
        let pending_query = self.state.borrow().search.query.clone();
        if self.settings.is_searchable(&pending_query) {
            debug!(query = %pending_query, "Re-running search against loaded scheme list");
            self.start_search(&mut slot, pending_query);
        }
    }

    // Caller holds the `search_task` lock
    fn start_search(self: &Arc<Self>, slot: &mut Option<JoinHandle<()>>, query: String) {
        // Bump first so a pass finishing right now can no longer publish
        let generation = self.search_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let searchable = self.settings.is_searchable(&query);

        self.state.send_modify(|s| {
            s.search.query = query.clone();
            s.search.is_searching = searchable;
            if !searchable {
                s.search.results.clear();
            }
        });

        let task = if searchable {
            Some(tokio::spawn(self.clone().run_search(generation, query)))
        } else {
            None
        };
        swap_task(slot, task);
    }

    fn is_current_search(&self, generation: u64) -> bool {
        self.search_generation.load(Ordering::SeqCst) == generation
    }

    #[instrument(skip(self))]
    async fn run_search(self: Arc<Self>, generation: u64, query: String) {
        tokio::time::sleep(self.settings.debounce).await;
        if !self.is_current_search(generation) {
            return;
        }

        let schemes = self.state.borrow().schemes.clone();
        let limit = self.settings.max_results;
        let filter = self.filter;
        let needle = query.clone();
        let outcome = tokio::task::spawn_blocking(move || filter(&schemes, &needle, limit)).await;

        let published = self.state.send_if_modified(|s| {
            if !self.is_current_search(generation) {
                return false;
            }
            match outcome {
                Ok(results) => {
                    debug!(result_count = results.len(), "Search pass complete");
                    s.search.results = results;
                    s.clear_error(ErrorKind::Search);
                }
                Err(e) => {
                    error!(error = %e, "Search pass failed");
                    s.search.results.clear();
                    s.publish_error(ErrorKind::Search, format!("Search failed: {}", e));
                }
            }
            s.search.is_searching = false;
            true
        });
        if !published {
            debug!("Discarding results of superseded search");
        }
    }

    #[instrument(skip(self))]
    async fn load_detail(self: Arc<Self>, generation: u64, scheme_code: u32) {
        let result = self.source.get_scheme_detail(scheme_code).await;
        match &result {
            Ok(detail) => debug!(nav_points = detail.data.len(), "Fetched scheme details"),
            Err(e) => error!(error = %e, "Error fetching scheme details"),
        }

        let published = self.state.send_if_modified(|s| {
            if self.detail_generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            match result {
                Ok(detail) => {
                    s.date_range = DateRange::spanning(&detail);
                    s.selected_detail = Some(Arc::new(detail));
                    s.detail_status = LoadStatus::Loaded;
                    s.clear_error(ErrorKind::SchemeDetail);
                }
                Err(e) => {
                    s.detail_status = LoadStatus::Failed;
                    s.publish_error(ErrorKind::SchemeDetail, format!("Failed to load scheme details: {}", e));
                }
            }
            true
        });
        if published {
            info!("Scheme details updated");
        } else {
            debug!("Discarding superseded scheme detail result");
        }
    }
}

fn lock_slot(slot: &TaskSlot) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

// Swap in a new task handle, aborting whatever was there
fn swap_task(slot: &mut Option<JoinHandle<()>>, task: Option<JoinHandle<()>>) {
    if let Some(previous) = std::mem::replace(slot, task) {
        previous.abort();
    }
}
