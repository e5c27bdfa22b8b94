// ⛽ Brand Entity - Stable identity + discount settings
//
// "Brand name is a VALUE (can change), Brand UUID is IDENTITY (never changes)"
//
// Problem solved:
// - "BP", "B.P.", "BP Connect" in imported data → same brand entity
// - Discounts (standard + personal override) live on the brand, not the station
// - The "Independent" brand is a sentinel: no logo, no discount line

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name of the sentinel brand for unbranded sites
pub const INDEPENDENT_BRAND: &str = "Independent";

// ============================================================================
// BRAND ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brand {
    /// Stable identity (UUID) - NEVER changes
    pub id: String,

    /// Display name (e.g., "Caltex Woolworths")
    pub name: String,

    /// Alternative spellings seen in imported price data
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Standard discount in cents per litre
    #[serde(default)]
    pub discount: f64,

    /// User's own discount, overrides `discount` when set
    #[serde(default)]
    pub personal_discount: Option<f64>,

    /// Whether any discount should be shown for this brand
    #[serde(default)]
    pub use_discount: bool,

    /// Asset key of the small marker glyph
    #[serde(default)]
    pub glyph_key: Option<String>,

    /// Asset key of the full logo used as the callout accessory
    #[serde(default)]
    pub image_key: Option<String>,

    /// True only for the sentinel "Independent" brand
    #[serde(default)]
    pub independent: bool,

    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Brand {
    /// Create new brand entity with UUID
    pub fn new(name: impl Into<String>) -> Self {
        Brand {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            aliases: Vec::new(),
            discount: 0.0,
            personal_discount: None,
            use_discount: false,
            glyph_key: None,
            image_key: None,
            independent: false,
            version: 1,
            updated_at: Utc::now(),
        }
    }

    /// The sentinel brand for sites without a corporate brand
    pub fn independent() -> Self {
        let mut brand = Brand::new(INDEPENDENT_BRAND);
        brand.independent = true;
        brand
    }

    /// Builder: attach glyph and logo asset keys
    pub fn with_assets(mut self, glyph_key: impl Into<String>, image_key: impl Into<String>) -> Self {
        self.glyph_key = Some(glyph_key.into());
        self.image_key = Some(image_key.into());
        self
    }

    /// Builder: enable a standard discount
    pub fn with_discount(mut self, cents_per_litre: f64) -> Self {
        self.discount = cents_per_litre;
        self.use_discount = true;
        self
    }

    /// Add an alias to this brand
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if !self.aliases.contains(&alias) && alias != self.name {
            self.aliases.push(alias);
        }
    }

    /// Case-insensitive match on the display name or any alias
    pub fn matches(&self, brand_string: &str) -> bool {
        let wanted = brand_string.trim().to_lowercase();
        if wanted.is_empty() {
            return false;
        }

        self.name.to_lowercase() == wanted
            || self.aliases.iter().any(|alias| alias.to_lowercase() == wanted)
    }

    /// Discount to display, if discounts are active for this brand.
    /// A personal override wins over the standard amount.
    pub fn effective_discount(&self) -> Option<f64> {
        if !self.use_discount {
            return None;
        }
        Some(self.personal_discount.unwrap_or(self.discount))
    }
}

// ============================================================================
// BRAND REGISTRY
// ============================================================================

/// Registry of all known brands.
///
/// Always contains the "Independent" sentinel brand.
#[derive(Debug, Clone)]
pub struct BrandRegistry {
    brands: Vec<Brand>,
}

impl BrandRegistry {
    /// Create new registry holding only the independent brand
    pub fn new() -> Self {
        BrandRegistry {
            brands: vec![Brand::independent()],
        }
    }

    /// Register a brand; an existing brand with the same id is replaced
    pub fn register(&mut self, brand: Brand) {
        if brand.independent {
            self.brands.retain(|b| !b.independent);
        }
        self.brands.retain(|b| b.id != brand.id);
        self.brands.push(brand);
    }

    /// Find brand by UUID
    pub fn find_by_id(&self, id: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| b.id == id)
    }

    /// Find brand by display name or alias
    pub fn find_by_string(&self, brand_string: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| b.matches(brand_string))
    }

    /// The sentinel independent brand
    pub fn independent(&self) -> &Brand {
        // register() never removes the sentinel without replacing it
        self.brands
            .iter()
            .find(|b| b.independent)
            .unwrap_or(&self.brands[0])
    }

    /// Update brand values in place, bumping its version
    pub fn update_brand<F>(&mut self, id: &str, mut update_fn: F) -> Result<(), String>
    where
        F: FnMut(&mut Brand),
    {
        let brand = self
            .brands
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| format!("Brand not found: {}", id))?;

        update_fn(brand);
        brand.version += 1;
        brand.updated_at = Utc::now();
        Ok(())
    }

    /// All brands, sorted by name
    pub fn all_brands(&self) -> Vec<&Brand> {
        let mut all: Vec<&Brand> = self.brands.iter().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    pub fn count(&self) -> usize {
        self.brands.len()
    }
}

impl Default for BrandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_creation() {
        let brand = Brand::new("Caltex");

        assert!(!brand.id.is_empty());
        assert_eq!(brand.name, "Caltex");
        assert!(!brand.independent);
        assert!(!brand.use_discount);
        assert_eq!(brand.version, 1);
    }

    #[test]
    fn test_brand_matches_aliases() {
        let mut bp = Brand::new("BP");
        bp.add_alias("B.P.");
        bp.add_alias("B.P."); // Duplicate - should not add

        assert_eq!(bp.aliases.len(), 1);
        assert!(bp.matches("bp"));
        assert!(bp.matches(" B.P. "));
        assert!(!bp.matches("BP Connect"));
        assert!(!bp.matches(""));
    }

    #[test]
    fn test_effective_discount() {
        let mut brand = Brand::new("Coles Express").with_discount(4.0);
        assert_eq!(brand.effective_discount(), Some(4.0));

        brand.personal_discount = Some(8.0);
        assert_eq!(brand.effective_discount(), Some(8.0));

        brand.use_discount = false;
        assert_eq!(brand.effective_discount(), None);
    }

    #[test]
    fn test_registry_seeds_independent() {
        let registry = BrandRegistry::new();

        assert_eq!(registry.count(), 1);
        assert!(registry.independent().independent);
        assert_eq!(
            registry.find_by_string("independent").map(|b| b.independent),
            Some(true)
        );
    }

    #[test]
    fn test_registry_find_by_id_and_string() {
        let mut registry = BrandRegistry::new();
        let mut shell = Brand::new("Shell");
        shell.add_alias("Shell Coles Express");
        let shell_id = shell.id.clone();
        registry.register(shell);

        assert_eq!(registry.find_by_id(&shell_id).map(|b| b.name.as_str()), Some("Shell"));
        assert_eq!(
            registry.find_by_string("shell coles express").map(|b| b.id.clone()),
            Some(shell_id)
        );
        assert!(registry.find_by_string("Puma").is_none());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = BrandRegistry::new();
        let brand = Brand::new("Puma");
        let mut renamed = brand.clone();
        renamed.name = "Puma Energy".to_string();

        registry.register(brand);
        registry.register(renamed);

        assert_eq!(registry.count(), 2);
        assert!(registry.find_by_string("Puma Energy").is_some());
    }

    #[test]
    fn test_update_brand_bumps_version() {
        let mut registry = BrandRegistry::new();
        let brand = Brand::new("Vibe");
        let id = brand.id.clone();
        registry.register(brand);

        registry
            .update_brand(&id, |b| b.personal_discount = Some(6.0))
            .unwrap();

        let updated = registry.find_by_id(&id).unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.personal_discount, Some(6.0));
    }

    #[test]
    fn test_update_nonexistent_brand_fails() {
        let mut registry = BrandRegistry::new();
        let result = registry.update_brand("missing", |b| b.use_discount = true);

        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Brand not found"));
    }
}
