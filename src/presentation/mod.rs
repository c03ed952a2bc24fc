//! Terminal rendering of controller snapshots.
//!
//! Everything here is derived from an [`AppState`](crate::controller::AppState)
//! and never written back to it.

pub mod chart;
pub mod render;
pub mod table;

pub use chart::{ChartPoint, chart_points, sparkline, value_label};
pub use render::{render_info_card, render_search, render_state};
pub use table::{NavRow, display_date, nav_table_rows};
