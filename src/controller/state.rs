use std::sync::Arc;

use super::date_range::{DateRange, filter_by_date_range};
use crate::mfapi::{NavData, Scheme, SchemeDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Which operation produced the error currently on display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    SchemeList,
    SchemeDetail,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Scheme>, // Subset of the full list, capped
    pub is_searching: bool,
}

/// Snapshot of everything the presentation layer observes.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub schemes: Arc<Vec<Scheme>>, // Full catalog, fetched once
    pub scheme_list_status: LoadStatus,
    pub detail_status: LoadStatus,
    pub selected_detail: Option<Arc<SchemeDetail>>,
    pub date_range: Option<DateRange>,
    pub search: SearchState,
    pub error: Option<ErrorBanner>,
}

impl AppState {
    pub fn is_loading(&self) -> bool {
        self.scheme_list_status == LoadStatus::Loading || self.detail_status == LoadStatus::Loading
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// NAV points of the selected scheme inside the current date range.
    ///
    /// With no range set, the full history is returned.
    pub fn visible_navs(&self) -> Vec<NavData> {
        match (&self.selected_detail, &self.date_range) {
            (Some(detail), Some(range)) => filter_by_date_range(&detail.data, range),
            (Some(detail), None) => detail.data.clone(),
            (None, _) => Vec::new(),
        }
    }

    pub(crate) fn publish_error(&mut self, kind: ErrorKind, message: String) {
        self.error = Some(ErrorBanner { kind, message });
    }

    // A success only clears an error raised by the same kind of operation
    pub(crate) fn clear_error(&mut self, kind: ErrorKind) {
        if self.error.as_ref().is_some_and(|e| e.kind == kind) {
            self.error = None;
        }
    }
}
