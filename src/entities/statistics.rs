// 📊 Regional price statistics
//
// One record per (region, fuel type, date): nine percentile cut points
// (10th..90th) partitioning the day's prices into ten bands, plus the median.
// All values are tenths of a cent per litre.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fuel::FuelType;

/// Number of cut points a complete statistics record carries
pub const PERCENTILE_COUNT: usize = 9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub region_id: String,
    pub fuel_type: FuelType,
    pub date: NaiveDate,

    /// Ascending cut points t1..t9; anything else is incomplete
    pub percentiles: Vec<i64>,

    #[serde(default)]
    pub median: Option<i64>,
}

impl Statistics {
    pub fn new(
        region_id: impl Into<String>,
        fuel_type: FuelType,
        date: NaiveDate,
        percentiles: Vec<i64>,
    ) -> Self {
        Statistics {
            region_id: region_id.into(),
            fuel_type,
            date,
            percentiles,
            median: None,
        }
    }

    /// The nine cut points, or None when the record is incomplete
    pub fn thresholds(&self) -> Option<[i64; PERCENTILE_COUNT]> {
        self.percentiles.as_slice().try_into().ok()
    }

    /// Strictly ascending cut points
    pub fn is_monotonic(&self) -> bool {
        self.percentiles.windows(2).all(|w| w[0] < w[1])
    }

    pub fn is_complete(&self) -> bool {
        self.percentiles.len() == PERCENTILE_COUNT
    }

    /// Derive cut points from a day's prices using nearest-rank percentiles.
    /// Returns None for an empty sample.
    ///
    /// Shared prices make nearest-rank values repeat. Each repeat is lifted to
    /// one tenth above the previous cut point so the result stays strictly
    /// ascending and a tied price still lands in the dearer band.
    pub fn from_prices(
        region_id: impl Into<String>,
        fuel_type: FuelType,
        date: NaiveDate,
        prices: &[i64],
    ) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let mut sorted = prices.to_vec();
        sorted.sort_unstable();
        let n = sorted.len();

        // ceil(p * n / 100) - 1, p = 10, 20, ... 90
        let nearest_rank = |p: usize| sorted[((p * n + 99) / 100).max(1) - 1];
        let mut percentiles: Vec<i64> = (1..=PERCENTILE_COUNT).map(|i| nearest_rank(i * 10)).collect();
        let median = Some(nearest_rank(50));

        for i in 1..percentiles.len() {
            percentiles[i] = percentiles[i].max(percentiles[i - 1] + 1);
        }

        Some(Statistics {
            region_id: region_id.into(),
            fuel_type,
            date,
            percentiles,
            median,
        })
    }
}

// ============================================================================
// STATISTICS REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StatisticsRegistry {
    records: Vec<Statistics>,
}

impl StatisticsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record; replaces any record for the same region/fuel/date
    pub fn register(&mut self, stats: Statistics) {
        self.records.retain(|s| {
            !(s.region_id == stats.region_id && s.fuel_type == stats.fuel_type && s.date == stats.date)
        });
        self.records.push(stats);
    }

    pub fn find(&self, region_id: &str, fuel_type: FuelType, date: NaiveDate) -> Option<&Statistics> {
        self.records
            .iter()
            .find(|s| s.region_id == region_id && s.fuel_type == fuel_type && s.date == date)
    }

    pub fn all_statistics(&self) -> &[Statistics] {
        &self.records
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }
}
