use crate::mfapi::types::{NavData, parse_nav_date};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavRow {
    pub date: String,
    pub nav: String, // "₹" prefixed, upstream digits untouched
}

pub fn nav_table_rows(navs: &[NavData]) -> Vec<NavRow> {
    navs.iter()
        .map(|point| NavRow {
            date: point.date.clone(),
            nav: format!("₹{}", point.nav),
        })
        .collect()
}

/// "15-08-2023" -> "15 Aug 2023"; anything unparseable is returned as is.
pub fn display_date(date: &str) -> String {
    match parse_nav_date(date) {
        Some(parsed) => parsed.format("%d %b %Y").to_string(),
        None => date.to_string(),
    }
}
