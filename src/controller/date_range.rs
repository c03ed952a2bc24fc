use chrono::NaiveDate;
use std::fmt;

use crate::mfapi::types::{NAV_DATE_FORMAT, NavData, SchemeDetail, parse_nav_date};

/// Inclusive calendar range applied to a scheme's NAV history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both ends in the NAV "DD-MM-YYYY" format.
    pub fn parse(start: &str, end: &str) -> Option<Self> {
        Some(Self::new(parse_nav_date(start)?, parse_nav_date(end)?))
    }

    /// Range covering the oldest through newest dates of `detail`.
    ///
    /// Points with malformed dates are ignored; `None` when no date parses.
    pub fn spanning(detail: &SchemeDetail) -> Option<Self> {
        let mut dates = detail.data.iter().filter_map(NavData::parsed_date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self::new(start, end))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// False for dates that do not parse.
    pub fn contains_str(&self, date: &str) -> bool {
        parse_nav_date(date).is_some_and(|d| self.contains(d))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}",
            self.start.format(NAV_DATE_FORMAT),
            self.end.format(NAV_DATE_FORMAT)
        )
    }
}

/// Subsequence of `navs` dated within `range`, in source order.
pub fn filter_by_date_range(navs: &[NavData], range: &DateRange) -> Vec<NavData> {
    navs.iter()
        .filter(|point| range.contains_str(&point.date))
        .cloned()
        .collect()
}
