pub mod date_range;
pub mod scheme_controller;
pub mod search;
pub mod state;

pub use date_range::{DateRange, filter_by_date_range};
pub use scheme_controller::SchemeController;
pub use search::{SearchSettings, filter_schemes};
pub use state::{AppState, ErrorBanner, ErrorKind, LoadStatus, SearchState};
