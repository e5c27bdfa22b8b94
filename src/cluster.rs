// Cluster marker summaries
//
// A cluster shows how many stations it merges, tinted with the fixed cluster
// color. Its members' prices are not aggregated.

use serde::Serialize;

use crate::annotation::StationAnnotation;
use crate::styles::CLUSTER_TINT;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub glyph_text: String,
    pub tint_key: &'static str,
}

pub fn summarize(members: &[StationAnnotation]) -> ClusterSummary {
    ClusterSummary {
        glyph_text: members.len().to_string(),
        tint_key: CLUSTER_TINT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::StationAnnotation;
    use crate::callout;
    use crate::entities::Station;
    use crate::tiers::PriceTier;

    fn member(name: &str) -> StationAnnotation {
        let station = Station::new(name);
        StationAnnotation::new(
            &station,
            None,
            PriceTier::None,
            callout::build(&station, None, None, None, &[]),
        )
    }

    #[test]
    fn test_cluster_of_seven() {
        let members: Vec<StationAnnotation> = (0..7).map(|i| member(&format!("Station {}", i))).collect();
        let summary = summarize(&members);

        assert_eq!(summary.glyph_text, "7");
        assert_eq!(summary.tint_key, "cluster");
    }

    #[test]
    fn test_empty_cluster() {
        assert_eq!(summarize(&[]).glyph_text, "0");
    }
}
