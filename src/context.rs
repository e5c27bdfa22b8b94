// 📚 Reference Context
//
// Read-only bundle of the reference registries, passed explicitly to the
// renderer. Lookups go through `ReferenceLookup` so callers can back them
// with something other than the in-memory registries.

use chrono::NaiveDate;

use crate::entities::{
    Brand, BrandRegistry, FuelType, Region, RegionRegistry, Station, StationRegistry, Statistics,
    StatisticsRegistry, Suburb, SuburbRegistry,
};

/// Identity lookups the rendering core needs
pub trait ReferenceLookup {
    fn station(&self, trading_name: &str) -> Option<&Station>;
    fn stations(&self) -> Vec<&Station>;
    fn brand(&self, id: &str) -> Option<&Brand>;
    fn suburb(&self, id: &str) -> Option<&Suburb>;
    fn region(&self, id: &str) -> Option<&Region>;
    fn statistics(&self, region_id: &str, fuel_type: FuelType, date: NaiveDate) -> Option<&Statistics>;

    /// Resolve station → brand and station → suburb → region
    fn relations(&self, station: &Station) -> Relations<'_> {
        let brand = station.brand_id.as_deref().and_then(|id| self.brand(id));
        let suburb = station.suburb_id.as_deref().and_then(|id| self.suburb(id));
        let region = suburb
            .and_then(|s| s.region_id.as_deref())
            .and_then(|id| self.region(id));

        Relations { brand, suburb, region }
    }
}

/// A station's resolved references. Each link may be missing.
#[derive(Debug, Clone, Copy)]
pub struct Relations<'a> {
    pub brand: Option<&'a Brand>,
    pub suburb: Option<&'a Suburb>,
    pub region: Option<&'a Region>,
}

// ============================================================================
// MAP CONTEXT
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MapContext {
    pub brands: BrandRegistry,
    pub regions: RegionRegistry,
    pub suburbs: SuburbRegistry,
    pub statistics: StatisticsRegistry,
    pub stations: StationRegistry,
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-line count of everything loaded
    pub fn summary(&self) -> String {
        format!(
            "{} stations, {} brands, {} suburbs, {} regions, {} statistics records",
            self.stations.count(),
            self.brands.count(),
            self.suburbs.count(),
            self.regions.count(),
            self.statistics.count()
        )
    }
}

impl ReferenceLookup for MapContext {
    fn station(&self, trading_name: &str) -> Option<&Station> {
        self.stations.find_by_name(trading_name)
    }

    fn stations(&self) -> Vec<&Station> {
        self.stations.all_stations().iter().collect()
    }

    fn brand(&self, id: &str) -> Option<&Brand> {
        self.brands.find_by_id(id)
    }

    fn suburb(&self, id: &str) -> Option<&Suburb> {
        self.suburbs.find_by_id(id)
    }

    fn region(&self, id: &str) -> Option<&Region> {
        self.regions.find_by_id(id)
    }

    fn statistics(&self, region_id: &str, fuel_type: FuelType, date: NaiveDate) -> Option<&Statistics> {
        self.statistics.find(region_id, fuel_type, date)
    }
}
