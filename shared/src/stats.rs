//! Activity histogram and brush selection for the stats chart.

use geojson::Feature;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TIMESTAMP_PROPERTY: &str = "_timestamp";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    /// UTC midnight, ms since epoch.
    pub day: i64,
    #[serde(rename = "count_day")]
    pub count: u32,
}

/// Counts features per UTC day of their `_timestamp` (seconds since
/// epoch), ordered by day.
#[must_use]
pub fn daily_histogram(features: &[Feature]) -> Vec<HistogramBin> {
    let mut bins: BTreeMap<i64, u32> = BTreeMap::new();

    for timestamp in features.iter().filter_map(timestamp_secs) {
        #[allow(clippy::cast_possible_truncation)]
        let ms = (timestamp * 1000.0).floor() as i64;
        *bins.entry(ms.div_euclid(MS_PER_DAY) * MS_PER_DAY).or_default() += 1;
    }

    bins.into_iter()
        .map(|(day, count)| HistogramBin { day, count })
        .collect()
}

fn timestamp_secs(feature: &Feature) -> Option<f64> {
    feature
        .properties
        .as_ref()?
        .get(TIMESTAMP_PROPERTY)?
        .as_f64()
        .filter(|t| t.is_finite())
}

/// Selected time window in seconds since epoch, `from_secs <= to_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from_secs: f64,
    pub to_secs: f64,
}

impl TimeRange {
    #[must_use]
    pub fn contains(&self, secs: f64) -> bool {
        (self.from_secs..=self.to_secs).contains(&secs)
    }
}

/// Tracks a brush gesture on the chart. The start is kept across ends so
/// a drag that reports several ends keeps extending the same selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brush {
    start_ms: Option<i64>,
}

impl Brush {
    pub fn start(&mut self, time_ms: i64) {
        self.start_ms = Some(time_ms);
    }

    /// The selection ending at `time_ms`. A zero-width selection, or an end
    /// without any start, clears the filter.
    #[must_use]
    pub fn end(&self, time_ms: i64) -> Option<TimeRange> {
        let start = self.start_ms?;
        if start == time_ms {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let range = TimeRange {
            from_secs: start.min(time_ms) as f64 / 1000.0,
            to_secs: start.max(time_ms) as f64 / 1000.0,
        };
        Some(range)
    }
}
