// ⛽ Station Entity
//
// Identity is the trading name (unique across the data set). Brand and suburb
// are optional references by id; prices are daily observations per product.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::fuel::{FuelType, PriceObservation};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// Trading name - unique identity
    pub trading_name: String,

    #[serde(default)]
    pub address: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub brand_id: Option<String>,

    #[serde(default)]
    pub suburb_id: Option<String>,

    #[serde(default)]
    pub prices: Vec<PriceObservation>,

    /// Site features, e.g. "Car wash", "24 hours"
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub latitude: Option<f64>,

    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Station {
    pub fn new(trading_name: impl Into<String>) -> Self {
        Station {
            trading_name: trading_name.into(),
            address: None,
            phone: None,
            brand_id: None,
            suburb_id: None,
            prices: Vec::new(),
            features: Vec::new(),
            latitude: None,
            longitude: None,
        }
    }

    /// Record a price; replaces an existing observation for the same fuel/date
    pub fn record_price(&mut self, observation: PriceObservation) {
        self.prices
            .retain(|p| !(p.fuel_type == observation.fuel_type && p.date == observation.date));
        self.prices.push(observation);
    }

    /// Price for a product on a given day
    pub fn price_on(&self, fuel_type: FuelType, date: NaiveDate) -> Option<i64> {
        self.prices
            .iter()
            .find(|p| p.fuel_type == fuel_type && p.date == date)
            .map(|p| p.price)
    }

    pub fn add_feature(&mut self, feature: impl Into<String>) {
        let feature = feature.into();
        if !self.features.contains(&feature) {
            self.features.push(feature);
        }
    }
}

// ============================================================================
// STATION REGISTRY
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: Vec<Station>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a station; trading names are unique so a match replaces
    pub fn register(&mut self, station: Station) {
        self.stations.retain(|s| s.trading_name != station.trading_name);
        self.stations.push(station);
    }

    pub fn find_by_name(&self, trading_name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.trading_name == trading_name)
    }

    pub fn all_stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn count(&self) -> usize {
        self.stations.len()
    }
}
