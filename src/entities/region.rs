// 🗺️ Region + Suburb Entities
//
// Suburbs belong to one major region; price statistics are published per region.
// Both are read-mostly reference data populated by the data layer.

use serde::{Deserialize, Serialize};

// ============================================================================
// REGION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Stable identity (UUID)
    pub id: String,

    /// Region name (e.g., "Metro", "South-West")
    pub name: String,
}

impl Region {
    pub fn new(name: impl Into<String>) -> Self {
        Region {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
        }
    }
}

// ============================================================================
// SUBURB
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suburb {
    /// Stable identity (UUID)
    pub id: String,

    pub name: String,

    /// Major region this suburb reports into
    pub region_id: Option<String>,
}

impl Suburb {
    pub fn new(name: impl Into<String>, region_id: Option<String>) -> Self {
        Suburb {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            region_id,
        }
    }
}

// ============================================================================
// REGISTRIES
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: Vec<Region>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, region: Region) {
        self.regions.retain(|r| r.id != region.id);
        self.regions.push(region);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    /// Case-insensitive lookup by name
    pub fn find_by_name(&self, name: &str) -> Option<&Region> {
        let wanted = name.trim().to_lowercase();
        self.regions.iter().find(|r| r.name.to_lowercase() == wanted)
    }

    pub fn all_regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn count(&self) -> usize {
        self.regions.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuburbRegistry {
    suburbs: Vec<Suburb>,
}

impl SuburbRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, suburb: Suburb) {
        self.suburbs.retain(|s| s.id != suburb.id);
        self.suburbs.push(suburb);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Suburb> {
        self.suburbs.iter().find(|s| s.id == id)
    }

    /// Case-insensitive lookup by name
    pub fn find_by_name(&self, name: &str) -> Option<&Suburb> {
        let wanted = name.trim().to_lowercase();
        self.suburbs.iter().find(|s| s.name.to_lowercase() == wanted)
    }

    /// All suburbs reporting into a region
    pub fn in_region(&self, region_id: &str) -> Vec<&Suburb> {
        self.suburbs
            .iter()
            .filter(|s| s.region_id.as_deref() == Some(region_id))
            .collect()
    }

    pub fn all_suburbs(&self) -> &[Suburb] {
        &self.suburbs
    }

    pub fn count(&self) -> usize {
        self.suburbs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_lookup_by_name() {
        let mut regions = RegionRegistry::new();
        let metro = Region::new("Metro");
        let metro_id = metro.id.clone();
        regions.register(metro);
        regions.register(Region::new("Peel"));

        assert_eq!(regions.count(), 2);
        assert_eq!(regions.find_by_name("metro").map(|r| r.id.clone()), Some(metro_id));
        assert!(regions.find_by_name("Kimberley").is_none());
    }

    #[test]
    fn test_suburbs_in_region() {
        let metro = Region::new("Metro");
        let mut suburbs = SuburbRegistry::new();
        suburbs.register(Suburb::new("Subiaco", Some(metro.id.clone())));
        suburbs.register(Suburb::new("Leederville", Some(metro.id.clone())));
        suburbs.register(Suburb::new("Nowhere", None));

        assert_eq!(suburbs.in_region(&metro.id).len(), 2);
        assert_eq!(
            suburbs.find_by_name("SUBIACO").and_then(|s| s.region_id.clone()),
            Some(metro.id)
        );
    }

    #[test]
    fn test_register_same_id_replaces() {
        let mut suburbs = SuburbRegistry::new();
        let suburb = Suburb::new("Como", None);
        let mut moved = suburb.clone();
        moved.region_id = Some("region-1".to_string());

        suburbs.register(suburb);
        suburbs.register(moved);

        assert_eq!(suburbs.count(), 1);
        assert_eq!(suburbs.all_suburbs()[0].region_id.as_deref(), Some("region-1"));
    }
}
