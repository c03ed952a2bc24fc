use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Day-month-year format used by mfapi for every NAV date.
pub const NAV_DATE_FORMAT: &str = "%d-%m-%Y";

// mfapi API Response structures

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(rename = "schemeCode")]
    pub scheme_code: u32,
    #[serde(rename = "schemeName")]
    pub scheme_name: String, // Not guaranteed unique across the catalog
}

impl Scheme {
    pub fn new(scheme_code: u32, scheme_name: impl Into<String>) -> Self {
        Self {
            scheme_code,
            scheme_name: scheme_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeDetail {
    pub meta: Meta,
    pub data: Vec<NavData>, // Most recent first, as sent by the API
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub fund_house: String,
    pub scheme_type: String,
    pub scheme_category: String,
    pub scheme_code: u32,
    pub scheme_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavData {
    pub date: String, // "DD-MM-YYYY"
    pub nav: String,  // Kept as text to preserve the upstream formatting
}

impl NavData {
    pub fn new(date: impl Into<String>, nav: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            nav: nav.into(),
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_nav_date(&self.date)
    }

    pub fn nav_value(&self) -> Option<Decimal> {
        Decimal::from_str(self.nav.trim()).ok()
    }
}

pub fn parse_nav_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), NAV_DATE_FORMAT).ok()
}
