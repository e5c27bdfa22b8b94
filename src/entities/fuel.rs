// Fuel products and price observations

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fuel product. Discriminants are the published product codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Unleaded = 1,
    PremiumUnleaded = 2,
    Diesel = 4,
    Lpg = 5,
    Ron98 = 6,
    E85 = 10,
    BrandDiesel = 11,
}

impl FuelType {
    pub fn all() -> [FuelType; 7] {
        [
            FuelType::Unleaded,
            FuelType::PremiumUnleaded,
            FuelType::Diesel,
            FuelType::Lpg,
            FuelType::Ron98,
            FuelType::E85,
            FuelType::BrandDiesel,
        ]
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<FuelType> {
        FuelType::all().into_iter().find(|f| f.code() == code)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FuelType::Unleaded => "Unleaded Petrol",
            FuelType::PremiumUnleaded => "Premium Unleaded",
            FuelType::Diesel => "Diesel",
            FuelType::Lpg => "LPG",
            FuelType::Ron98 => "98 RON",
            FuelType::E85 => "E85",
            FuelType::BrandDiesel => "Brand diesel",
        }
    }

    /// Parse a product label as it appears in price feeds
    pub fn parse(label: &str) -> Option<FuelType> {
        let wanted = label.trim().to_lowercase();
        if let Some(fuel) = wanted.parse::<u8>().ok().and_then(FuelType::from_code) {
            return Some(fuel);
        }
        match wanted.as_str() {
            "ulp" | "unleaded" => Some(FuelType::Unleaded),
            "pulp" | "premium" => Some(FuelType::PremiumUnleaded),
            "98" | "ron98" => Some(FuelType::Ron98),
            _ => FuelType::all()
                .into_iter()
                .find(|f| f.as_str().to_lowercase() == wanted),
        }
    }
}

impl Default for FuelType {
    fn default() -> Self {
        FuelType::Unleaded
    }
}

/// One day's price for one product at one station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceObservation {
    pub fuel_type: FuelType,

    /// Price in tenths of a cent per litre (145.9c → 1459)
    pub price: i64,

    pub date: NaiveDate,
}

impl PriceObservation {
    pub fn new(fuel_type: FuelType, price: i64, date: NaiveDate) -> Self {
        PriceObservation { fuel_type, price, date }
    }
}

/// Convert a cents-per-litre value (e.g. 145.9) to tenths of a cent
pub fn tenths_from_cents(cents: f64) -> i64 {
    (cents * 10.0).round() as i64
}

/// Render tenths of a cent as cents with one decimal (1459 → "145.9")
pub fn format_tenths(price: i64) -> String {
    let sign = if price < 0 { "-" } else { "" };
    let abs = price.abs();
    format!("{}{}.{}", sign, abs / 10, abs % 10)
}
