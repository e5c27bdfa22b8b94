// 💬 Callout Text Builder
//
// Assembles the marker glyph and the multi-line detail text shown when a
// station marker is selected. Line structure is identical for every station:
// missing values render as a placeholder instead of being dropped.

use serde::Serialize;

use crate::entities::{format_tenths, Brand, Region, Station, Suburb};

/// Stand-in for any missing address, suburb, region or phone value
pub const PLACEHOLDER: &str = "--------";

/// Glyph for stations with no brand on record
pub const UNKNOWN_BRAND_GLYPH: &str = "?";

/// Glyph for independent stations
pub const INDEPENDENT_GLYPH: &str = "Ind";

const FEATURE_SEPARATOR: &str = "\n  ";

// ============================================================================
// CALLOUT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Callout {
    /// Trading name
    pub title: String,

    /// Current price, set once a price has been resolved
    pub subtitle: Option<String>,

    pub glyph_text: Option<String>,
    pub glyph_image_key: Option<String>,
    pub detail_text: String,
    pub left_accessory_image_key: Option<String>,
}

impl Callout {
    /// Attach the price line shown under the title
    pub fn with_price(mut self, price: Option<i64>) -> Self {
        self.subtitle = Some(price.map(format_tenths).unwrap_or_else(|| PLACEHOLDER.to_string()));
        self
    }

    pub fn has_brand_line(&self) -> bool {
        self.detail_text.lines().any(|l| l.starts_with("Brand:"))
    }

    pub fn has_discount_line(&self) -> bool {
        self.detail_text.lines().any(|l| l.starts_with("Discount:"))
    }
}

// ============================================================================
// BUILDER
// ============================================================================

/// Build the callout for a station.
///
/// Three branches by brand:
/// 1. no brand → glyph "?", no brand or discount lines
/// 2. independent → glyph "Ind", no brand or discount lines
/// 3. any other brand → brand glyph image, brand line and discount line
pub fn build(
    station: &Station,
    brand: Option<&Brand>,
    suburb: Option<&Suburb>,
    region: Option<&Region>,
    features: &[String],
) -> Callout {
    let mut lines: Vec<String> = Vec::with_capacity(8);

    let (glyph_text, glyph_image_key, left_accessory_image_key) = match brand {
        None => (Some(UNKNOWN_BRAND_GLYPH.to_string()), None, None),
        Some(b) if b.independent => (Some(INDEPENDENT_GLYPH.to_string()), None, None),
        Some(b) => {
            lines.push(format!("Brand: {}", b.name));
            lines.push(format!("Discount: {}", discount_text(b)));
            (None, b.glyph_key.clone(), b.image_key.clone())
        }
    };

    lines.push(format!("Address: {}", or_placeholder(station.address.as_deref())));
    lines.push(format!("Suburb: {}", or_placeholder(suburb.map(|s| s.name.as_str()))));
    lines.push(format!("Region: {}", or_placeholder(region.map(|r| r.name.as_str()))));
    lines.push(format!("Phone: {}", or_placeholder(station.phone.as_deref())));
    lines.push(format!("Features:{}{}", FEATURE_SEPARATOR, features_text(features)));

    Callout {
        title: station.trading_name.clone(),
        subtitle: None,
        glyph_text,
        glyph_image_key,
        detail_text: lines.join("\n"),
        left_accessory_image_key,
    }
}

/// `"<amount>c/l"` when discounts are active, else `"Not active"`
pub fn discount_text(brand: &Brand) -> String {
    match brand.effective_discount() {
        Some(amount) => format!("{}c/l", format_amount(amount)),
        None => "Not active".to_string(),
    }
}

/// Features joined one per line, or `"None"`
pub fn features_text(features: &[String]) -> String {
    if features.is_empty() {
        return "None".to_string();
    }
    features.join(FEATURE_SEPARATOR)
}

fn or_placeholder(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => PLACEHOLDER,
    }
}

// 4.0 → "4", 3.5 → "3.5"
fn format_amount(amount: f64) -> String {
    if amount.fract().abs() < f64::EPSILON {
        format!("{:.0}", amount)
    } else {
        format!("{:.1}", amount)
    }
}

// ============================================================================
// TESTS
// ============================================================================
