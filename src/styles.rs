// 🎨 Tier Style Table
//
// Every price tier maps to the tint key, display priority and clustering key
// the map layer applies to a marker. Higher priority markers survive label
// collisions when zoomed out.

use serde::Serialize;

use crate::tiers::PriceTier;

/// Visual style descriptor for one tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierStyle {
    pub tint_key: &'static str,
    pub display_priority: i32,
    pub cluster_key: &'static str,
}

/// Tint used by cluster markers; never used by a single tier
pub const CLUSTER_TINT: &str = "cluster";

const fn style(tint_key: &'static str, display_priority: i32) -> TierStyle {
    TierStyle { tint_key, display_priority, cluster_key: tint_key }
}

// ============================================================================
// STYLE TABLE
// ============================================================================

/// Style for a tier
pub fn style_for(tier: PriceTier) -> TierStyle {
    match tier {
        PriceTier::Bottom10 => style("per10", 900),
        PriceTier::Bottom20 => style("per20", 890),
        PriceTier::Bottom30 => style("per30", 880),
        PriceTier::Bottom40 => style("per40", 870),
        PriceTier::Bottom50 => style("per50", 860),
        PriceTier::Top50 => style("per60", 850),
        PriceTier::Top40 => style("per70", 835),
        PriceTier::Top30 => style("per80", 825),
        PriceTier::Top20 => style("per90", 815),
        PriceTier::Top10 => style("per100", 800),
        PriceTier::None => style("noPrice", 100),
        // Sits between the top50 and top40 bands
        PriceTier::Uncategorizable => style("uncategorized", 840),
    }
}

/// Whole table, cheapest tier first
pub fn style_table() -> Vec<(PriceTier, TierStyle)> {
    PriceTier::all().into_iter().map(|t| (t, style_for(t))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_covers_every_tier() {
        let table = style_table();
        assert_eq!(table.len(), 12);
        for tier in PriceTier::all() {
            assert!(table.iter().any(|(t, _)| *t == tier), "{:?} missing", tier);
        }
    }

    #[test]
    fn test_literal_entries() {
        assert_eq!(
            style_for(PriceTier::Bottom20),
            TierStyle { tint_key: "per20", display_priority: 890, cluster_key: "per20" }
        );
        assert_eq!(style_for(PriceTier::Top10).display_priority, 800);
        assert_eq!(style_for(PriceTier::None).display_priority, 100);
        assert_eq!(style_for(PriceTier::Uncategorizable).display_priority, 840);
    }

    #[test]
    fn test_cheaper_tiers_outrank_dearer() {
        let priorities: Vec<i32> = (0..10)
            .filter_map(PriceTier::from_rank)
            .map(|t| style_for(t).display_priority)
            .collect();

        assert!(priorities.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_sentinel_priorities() {
        let none = style_for(PriceTier::None);
        let uncategorized = style_for(PriceTier::Uncategorizable);

        assert_ne!(none, uncategorized);
        assert!(uncategorized.display_priority > none.display_priority);
        for tier in PriceTier::all().into_iter().filter(|t| *t != PriceTier::None) {
            assert!(style_for(tier).display_priority > none.display_priority);
        }
    }

    #[test]
    fn test_style_is_deterministic() {
        for tier in PriceTier::all() {
            assert_eq!(style_for(tier), style_for(tier));
        }
    }

    #[test]
    fn test_cluster_tint_is_distinct() {
        for (_, style) in style_table() {
            assert_ne!(style.tint_key, CLUSTER_TINT);
        }
    }
}
