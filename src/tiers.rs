// 🏷️ Price Tier Classification
//
// A station's price is ranked against its region's nine percentile cut points.
// Cut points are inclusive lower bounds of the tier above them.

use serde::{Deserialize, Serialize};

use crate::entities::Statistics;

// ============================================================================
// PRICE TIER
// ============================================================================

/// Display tier, cheapest first. `None` and `Uncategorizable` are sentinels
/// for "no price" and "no usable statistics".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceTier {
    Bottom10,
    Bottom20,
    Bottom30,
    Bottom40,
    Bottom50,
    Top50,
    Top40,
    Top30,
    Top20,
    Top10,
    None,
    Uncategorizable,
}

/// Priced tiers in band order
const BANDS: [PriceTier; 10] = [
    PriceTier::Bottom10,
    PriceTier::Bottom20,
    PriceTier::Bottom30,
    PriceTier::Bottom40,
    PriceTier::Bottom50,
    PriceTier::Top50,
    PriceTier::Top40,
    PriceTier::Top30,
    PriceTier::Top20,
    PriceTier::Top10,
];

impl PriceTier {
    /// Every tier, priced bands first
    pub fn all() -> [PriceTier; 12] {
        [
            PriceTier::Bottom10,
            PriceTier::Bottom20,
            PriceTier::Bottom30,
            PriceTier::Bottom40,
            PriceTier::Bottom50,
            PriceTier::Top50,
            PriceTier::Top40,
            PriceTier::Top30,
            PriceTier::Top20,
            PriceTier::Top10,
            PriceTier::None,
            PriceTier::Uncategorizable,
        ]
    }

    /// Band index 0 (cheapest) ..= 9 (dearest); sentinels have no rank
    pub fn rank(&self) -> Option<usize> {
        BANDS.iter().position(|t| t == self)
    }

    pub fn from_rank(rank: usize) -> Option<PriceTier> {
        BANDS.get(rank).copied()
    }

    pub fn is_priced(&self) -> bool {
        self.rank().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Bottom10 => "bottom10",
            PriceTier::Bottom20 => "bottom20",
            PriceTier::Bottom30 => "bottom30",
            PriceTier::Bottom40 => "bottom40",
            PriceTier::Bottom50 => "bottom50",
            PriceTier::Top50 => "top50",
            PriceTier::Top40 => "top40",
            PriceTier::Top30 => "top30",
            PriceTier::Top20 => "top20",
            PriceTier::Top10 => "top10",
            PriceTier::None => "none",
            PriceTier::Uncategorizable => "uncategorizable",
        }
    }

    /// Human label for list views
    pub fn label(&self) -> &'static str {
        match self {
            PriceTier::Bottom10 => "Cheapest 10%",
            PriceTier::Bottom20 => "Cheapest 20%",
            PriceTier::Bottom30 => "Cheapest 30%",
            PriceTier::Bottom40 => "Cheapest 40%",
            PriceTier::Bottom50 => "Cheapest 50%",
            PriceTier::Top50 => "Dearest 50%",
            PriceTier::Top40 => "Dearest 40%",
            PriceTier::Top30 => "Dearest 30%",
            PriceTier::Top20 => "Dearest 20%",
            PriceTier::Top10 => "Dearest 10%",
            PriceTier::None => "No price",
            PriceTier::Uncategorizable => "No statistics",
        }
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Classify a price (tenths of a cent) against regional statistics.
///
/// - no price → `None`, regardless of statistics
/// - missing, incomplete or non-ascending statistics → `Uncategorizable`
/// - otherwise the number of cut points at or below the price picks the band
pub fn classify(price: Option<i64>, stats: Option<&Statistics>) -> PriceTier {
    let Some(price) = price else {
        return PriceTier::None;
    };

    let Some(stats) = stats else {
        return PriceTier::Uncategorizable;
    };

    let Some(thresholds) = stats.thresholds() else {
        tracing::debug!(
            region = %stats.region_id,
            cut_points = stats.percentiles.len(),
            "incomplete statistics, price left uncategorized"
        );
        return PriceTier::Uncategorizable;
    };

    classify_with_thresholds(price, &thresholds)
}

/// Classify against raw cut points. Anything other than nine strictly
/// ascending values yields `Uncategorizable`.
pub fn classify_with_thresholds(price: i64, thresholds: &[i64]) -> PriceTier {
    if thresholds.len() != BANDS.len() - 1 {
        return PriceTier::Uncategorizable;
    }

    if !thresholds.windows(2).all(|w| w[0] < w[1]) {
        tracing::debug!(?thresholds, "non-ascending cut points, price left uncategorized");
        return PriceTier::Uncategorizable;
    }

    let band = thresholds.iter().take_while(|&&t| price >= t).count();
    BANDS[band]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::FuelType;
    use chrono::NaiveDate;

    const CUTS: [i64; 9] = [100, 110, 120, 130, 140, 150, 160, 170, 180];

    fn stats(percentiles: Vec<i64>) -> Statistics {
        Statistics::new(
            "metro",
            FuelType::Unleaded,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            percentiles,
        )
    }

    #[test]
    fn test_scenario_bottom20() {
        let s = stats(CUTS.to_vec());
        assert_eq!(classify(Some(105), Some(&s)), PriceTier::Bottom20);
    }

    #[test]
    fn test_scenario_top10() {
        let s = stats(CUTS.to_vec());
        assert_eq!(classify(Some(185), Some(&s)), PriceTier::Top10);
    }

    #[test]
    fn test_every_band_boundary() {
        assert_eq!(classify_with_thresholds(99, &CUTS), PriceTier::Bottom10);
        for (i, cut) in CUTS.iter().enumerate() {
            // Ties go to the dearer tier
            assert_eq!(classify_with_thresholds(*cut, &CUTS), BANDS[i + 1]);
            assert_eq!(classify_with_thresholds(cut - 1, &CUTS), BANDS[i]);
        }
    }

    #[test]
    fn test_missing_price_is_none() {
        let s = stats(CUTS.to_vec());
        assert_eq!(classify(None, Some(&s)), PriceTier::None);
        assert_eq!(classify(None, None), PriceTier::None);
    }

    #[test]
    fn test_missing_stats_is_uncategorizable() {
        assert_eq!(classify(Some(105), None), PriceTier::Uncategorizable);
        assert_eq!(classify(Some(-40), None), PriceTier::Uncategorizable);
    }

    #[test]
    fn test_incomplete_stats_is_uncategorizable() {
        let s = stats(vec![100, 110, 120]);
        assert_eq!(classify(Some(105), Some(&s)), PriceTier::Uncategorizable);
    }

    #[test]
    fn test_non_monotonic_is_uncategorizable() {
        let s = stats(vec![100, 110, 105, 130, 140, 150, 160, 170, 180]);
        assert_eq!(classify(Some(105), Some(&s)), PriceTier::Uncategorizable);

        let flat = stats(vec![100, 100, 120, 130, 140, 150, 160, 170, 180]);
        assert_eq!(classify(Some(100), Some(&flat)), PriceTier::Uncategorizable);
    }

    #[test]
    fn test_classification_is_monotonic() {
        let mut last_rank = 0;
        for price in 50..250 {
            let rank = classify_with_thresholds(price, &CUTS).rank().unwrap();
            assert!(rank >= last_rank, "rank dropped at price {}", price);
            last_rank = rank;
        }
        assert_eq!(last_rank, 9);
    }

    #[test]
    fn test_rank_roundtrip() {
        for tier in PriceTier::all() {
            match tier.rank() {
                Some(rank) => assert_eq!(PriceTier::from_rank(rank), Some(tier)),
                None => assert!(matches!(tier, PriceTier::None | PriceTier::Uncategorizable)),
            }
        }
        assert_eq!(PriceTier::from_rank(10), None);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&PriceTier::Bottom20).unwrap();
        assert_eq!(json, "\"bottom20\"");
        let back: PriceTier = serde_json::from_str("\"uncategorizable\"").unwrap();
        assert_eq!(back, PriceTier::Uncategorizable);
    }
}
