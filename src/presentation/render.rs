use std::fmt::Write;

use super::chart::{chart_points, sparkline, value_bounds, value_label};
use super::table::{display_date, nav_table_rows};
use crate::controller::{AppState, DateRange, SearchSettings};
use crate::mfapi::types::NAV_DATE_FORMAT;
use crate::mfapi::{Meta, Scheme};

const CHART_WIDTH: usize = 60;
const TABLE_ROW_LIMIT: usize = 30;

/// Full screen for one snapshot: search dropdown on top, then the main area.
pub fn render_state(state: &AppState, settings: &SearchSettings) -> String {
    let mut out = render_search(state, settings);
    out.push('\n');
    out.push_str(&render_main(state));
    out
}

pub fn render_search(state: &AppState, settings: &SearchSettings) -> String {
    let mut out = String::new();
    let search = &state.search;
    let marker = if search.is_searching { "…" } else { "?" };
    let _ = writeln!(out, "{} Search: {}", marker, search.query);

    if !settings.is_searchable(&search.query) {
        let _ = writeln!(out, "  Enter at least {} characters to search...", settings.min_query_len);
        return out;
    }
    if search.results.is_empty() && !search.is_searching {
        let _ = writeln!(out, "  No matching schemes");
    }
    for (position, scheme) in search.results.iter().enumerate() {
        out.push_str(&render_dropdown_item(position, scheme));
    }
    out
}

fn render_dropdown_item(position: usize, scheme: &Scheme) -> String {
    format!(
        "  [{}] {}\n      Scheme Code: {}\n",
        position, scheme.scheme_name, scheme.scheme_code
    )
}

// Loading wins over errors, errors over details
fn render_main(state: &AppState) -> String {
    if state.is_loading() {
        return "Loading...\n".to_string();
    }
    if let Some(message) = state.error_message() {
        return format!("! {}\n", message);
    }
    match &state.selected_detail {
        Some(detail) => {
            let mut out = render_info_card(&detail.meta);
            out.push_str(&render_nav_history(state, state.date_range.as_ref()));
            out
        }
        None => "Search for mutual fund schemes\nEnter scheme name in the search bar above\n".to_string(),
    }
}

pub fn render_info_card(meta: &Meta) -> String {
    format!(
        "{}\n  Fund House: {}\n  Type: {}\n  Category: {}\n  Scheme Code: {}\n",
        meta.scheme_name, meta.fund_house, meta.scheme_type, meta.scheme_category, meta.scheme_code
    )
}

fn render_nav_history(state: &AppState, range: Option<&DateRange>) -> String {
    let mut out = String::new();
    let navs = state.visible_navs();

    if let Some(range) = range {
        let _ = writeln!(
            out,
            "\nNAV History ({} - {})",
            display_date(&range.start.format(NAV_DATE_FORMAT).to_string()),
            display_date(&range.end.format(NAV_DATE_FORMAT).to_string())
        );
    } else {
        let _ = writeln!(out, "\nNAV History");
    }
    if navs.is_empty() {
        let _ = writeln!(out, "  No NAV data in the selected range");
        return out;
    }

    // Source order is newest first; draw the chart oldest on the left
    let mut points = chart_points(&navs);
    points.reverse();
    if let (Some((lo, hi)), Some(first), Some(last)) = (value_bounds(&points), points.first(), points.last()) {
        let _ = writeln!(out, "  {} .. {}", value_label(lo), value_label(hi));
        let _ = writeln!(out, "  {}", sparkline(&points, CHART_WIDTH));
        let _ = writeln!(out, "  {} -> {}", first.axis_label(), last.axis_label());
    }

    let _ = writeln!(out, "\n  {:<12} {:>14}", "Date", "NAV");
    let rows = nav_table_rows(&navs);
    for row in rows.iter().take(TABLE_ROW_LIMIT) {
        let _ = writeln!(out, "  {:<12} {:>14}", row.date, row.nav);
    }
    if rows.len() > TABLE_ROW_LIMIT {
        let _ = writeln!(out, "  ... {} more rows", rows.len() - TABLE_ROW_LIMIT);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{ErrorBanner, ErrorKind, LoadStatus};
    use crate::mfapi::{NavData, SchemeDetail};
    use std::sync::Arc;

    fn detail() -> SchemeDetail {
        SchemeDetail {
            meta: Meta {
                fund_house: "HDFC Mutual Fund".to_string(),
                scheme_type: "Open Ended Schemes".to_string(),
                scheme_category: "Equity Scheme - Large Cap Fund".to_string(),
                scheme_code: 100,
                scheme_name: "HDFC Top 100".to_string(),
            },
            data: vec![NavData::new("05-02-2023", "812.4"), NavData::new("15-01-2023", "798.1")],
        }
    }

    #[test]
    fn short_query_shows_hint() {
        let mut state = AppState::default();
        state.search.query = "hd".to_string();
        let out = render_search(&state, &SearchSettings::default());
        assert!(out.contains("Enter at least 3 characters"));
    }

    #[test]
    fn results_render_as_numbered_dropdown() {
        let mut state = AppState::default();
        state.search.query = "hdfc".to_string();
        state.search.results = vec![Scheme::new(100, "HDFC Top 100")];
        let out = render_search(&state, &SearchSettings::default());
        assert!(out.contains("[0] HDFC Top 100"));
        assert!(out.contains("Scheme Code: 100"));
    }

    #[test]
    fn error_takes_precedence_over_detail() {
        let mut state = AppState::default();
        state.selected_detail = Some(Arc::new(detail()));
        state.error = Some(ErrorBanner {
            kind: ErrorKind::SchemeDetail,
            message: "Failed to load scheme details: timeout".to_string(),
        });
        let out = render_main(&state);
        assert_eq!(out, "! Failed to load scheme details: timeout\n");

        state.detail_status = LoadStatus::Loading;
        assert_eq!(render_main(&state), "Loading...\n");
    }

    #[test]
    fn detail_renders_card_chart_and_table() {
        let mut state = AppState::default();
        let detail = detail();
        state.date_range = DateRange::spanning(&detail);
        state.selected_detail = Some(Arc::new(detail));

        let out = render_main(&state);
        assert!(out.contains("Fund House: HDFC Mutual Fund"));
        assert!(out.contains("NAV History (15 Jan 2023 - 05 Feb 2023)"));
        assert!(out.contains("₹798.10 .. ₹812.40"));
        assert!(out.contains("15-01 -> 05-02"));
        assert!(out.contains("₹812.4"));
    }

    #[test]
    fn empty_state_shows_initial_message() {
        assert!(render_main(&AppState::default()).starts_with("Search for mutual fund schemes"));
    }
}
