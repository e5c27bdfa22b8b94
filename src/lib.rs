// Fuel Locator - Core Library
// Price-tier classification and map annotation rendering, shared by the CLI,
// the terminal map list and the API server

pub mod db;
pub mod entities;
pub mod tiers;       // Price tier classification
pub mod styles;      // Tier → tint / priority / cluster key
pub mod callout;     // Callout glyph + detail text
pub mod cluster;     // Cluster marker summaries
pub mod context;     // Read-only reference registries
pub mod annotation;  // Compute-then-apply rendering
pub mod settings;

// Re-export commonly used types
pub use db::{
    PriceRecord, ImportSummary,
    setup_database, load_price_csv, read_price_records, import_prices, apply_records,
    load_context, save_context, verify_count, regional_statistics, set_personal_discount,
};
pub use entities::{
    Brand, BrandRegistry, FuelType, PriceObservation, Region, RegionRegistry, Station,
    StationRegistry, Statistics, StatisticsRegistry, Suburb, SuburbRegistry,
    format_tenths, tenths_from_cents,
};
pub use tiers::{classify, classify_with_thresholds, PriceTier};
pub use styles::{style_for, style_table, TierStyle, CLUSTER_TINT};
pub use callout::{build as build_callout, Callout, PLACEHOLDER};
pub use cluster::{summarize, ClusterSummary};
pub use context::{MapContext, ReferenceLookup, Relations};
pub use annotation::{AnnotationPresenter, AnnotationRenderer, CollectingPresenter, StationAnnotation};
pub use settings::{Settings, SettingDefinition, SettingValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
