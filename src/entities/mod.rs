// Entity Models
//
// Reference data owned by the data layer. The rendering core only reads it:
// - Brand, Region, Suburb have stable UUID identity
// - Station identity is its trading name
// - Statistics are keyed by (region, fuel type, date)

pub mod brand;
pub mod fuel;
pub mod region;
pub mod station;
pub mod statistics;

pub use brand::{Brand, BrandRegistry, INDEPENDENT_BRAND};
pub use fuel::{format_tenths, tenths_from_cents, FuelType, PriceObservation};
pub use region::{Region, RegionRegistry, Suburb, SuburbRegistry};
pub use station::{Station, StationRegistry};
pub use statistics::{Statistics, StatisticsRegistry, PERCENTILE_COUNT};
