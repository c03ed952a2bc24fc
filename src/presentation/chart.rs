use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use crate::mfapi::NavData;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub index: usize,  // Position in the visible series, source order
    pub date: String,
    pub value: Decimal, // Zero when the NAV text does not parse
}

impl ChartPoint {
    /// Bottom-axis label: the "DD-MM" prefix of the date.
    pub fn axis_label(&self) -> String {
        self.date.chars().take(5).collect()
    }
}

pub fn chart_points(navs: &[NavData]) -> Vec<ChartPoint> {
    navs.iter()
        .enumerate()
        .map(|(index, point)| ChartPoint {
            index,
            date: point.date.clone(),
            value: point.nav_value().unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Start-axis label, e.g. "₹812.46".
pub fn value_label(value: Decimal) -> String {
    format!("₹{:.2}", value)
}

pub fn value_bounds(points: &[ChartPoint]) -> Option<(Decimal, Decimal)> {
    let first = points.first()?.value;
    Some(points.iter().fold((first, first), |(lo, hi), p| (lo.min(p.value), hi.max(p.value))))
}

/// One-line chart of `points`, downsampled to at most `width` columns.
pub fn sparkline(points: &[ChartPoint], width: usize) -> String {
    let Some((lo, hi)) = value_bounds(points) else {
        return String::new();
    };
    if width == 0 {
        return String::new();
    }

    let step = points.len().div_ceil(width);
    let spread = hi - lo;
    let top = Decimal::from(SPARK_LEVELS.len() - 1);

    points
        .iter()
        .step_by(step)
        .map(|p| {
            if spread.is_zero() {
                return SPARK_LEVELS[0];
            }
            let level = ((p.value - lo) / spread * top).round().to_usize().unwrap_or(0);
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}
