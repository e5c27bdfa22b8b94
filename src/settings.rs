// ⚙️ Settings - string-keyed flags with registered defaults
//
// Every setting is registered with a default before it can be read or set.
// A JSON object file can override any registered key; unknown keys and
// mismatched value types are rejected.

use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entities::FuelType;

/// Environment variable naming the settings file
pub const CONFIG_ENV: &str = "FUEL_LOCATOR_CONFIG";

pub const KEY_FUEL_TYPE: &str = "fuel_type";
pub const KEY_USE_DISCOUNTS: &str = "use_discounts";
pub const KEY_SHOW_CLUSTERS: &str = "show_clusters";
pub const KEY_DATABASE_PATH: &str = "database_path";
pub const KEY_SERVER_ADDR: &str = "server_addr";

// ============================================================================
// SETTING VALUES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl SettingValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "integer",
            SettingValue::Text(_) => "string",
        }
    }

    fn same_type(&self, other: &SettingValue) -> bool {
        self.type_name() == other.type_name()
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{}", b),
            SettingValue::Int(i) => write!(f, "{}", i),
            SettingValue::Text(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingDefinition {
    pub key: String,
    pub description: String,
    pub default: SettingValue,
}

impl SettingDefinition {
    pub fn new(key: impl Into<String>, default: SettingValue) -> Self {
        SettingDefinition {
            key: key.into(),
            description: String::new(),
            default,
        }
    }

    /// Builder: add description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    definitions: HashMap<String, SettingDefinition>,
    values: HashMap<String, SettingValue>,
}

impl Settings {
    /// Create settings with all core keys at their defaults
    pub fn new() -> Self {
        let mut settings = Settings {
            definitions: HashMap::new(),
            values: HashMap::new(),
        };

        settings.register_defaults();
        settings
    }

    fn register_defaults(&mut self) {
        self.register(
            SettingDefinition::new(KEY_FUEL_TYPE, SettingValue::Int(FuelType::Unleaded.code() as i64))
                .with_description("Product code of the fuel shown on the map"),
        );
        self.register(
            SettingDefinition::new(KEY_USE_DISCOUNTS, SettingValue::Bool(true))
                .with_description("Show brand discounts in station callouts"),
        );
        self.register(
            SettingDefinition::new(KEY_SHOW_CLUSTERS, SettingValue::Bool(true))
                .with_description("Merge nearby markers into clusters"),
        );
        self.register(
            SettingDefinition::new(KEY_DATABASE_PATH, SettingValue::Text("fuel-locator.db".to_string()))
                .with_description("SQLite snapshot of stations, brands and prices"),
        );
        self.register(
            SettingDefinition::new(KEY_SERVER_ADDR, SettingValue::Text("0.0.0.0:3000".to_string()))
                .with_description("Bind address of the HTTP API"),
        );
    }

    /// Register a setting and its default
    pub fn register(&mut self, definition: SettingDefinition) {
        self.definitions.insert(definition.key.clone(), definition);
    }

    pub fn definition(&self, key: &str) -> Option<&SettingDefinition> {
        self.definitions.get(key)
    }

    /// All registered keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.definitions.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// One row per key: key, current value, description
    pub fn describe(&self) -> Vec<(String, String, String)> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let definition = self.definition(&key)?;
                let value = self.get(&key)?.to_string();
                Some((key, value, definition.description.clone()))
            })
            .collect()
    }

    /// Current value, falling back to the registered default
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values
            .get(key)
            .or_else(|| self.definitions.get(key).map(|d| &d.default))
    }

    /// Override a registered key. The value must match the default's type.
    pub fn set(&mut self, key: &str, value: SettingValue) -> Result<()> {
        let definition = self
            .definitions
            .get(key)
            .ok_or_else(|| anyhow!("Unknown setting: {}", key))?;

        if !definition.default.same_type(&value) {
            bail!(
                "Setting {} expects a {}, got a {}",
                key,
                definition.default.type_name(),
                value.type_name()
            );
        }

        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Drop an override, returning the key to its default
    pub fn reset(&mut self, key: &str) {
        self.values.remove(key);
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(SettingValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(SettingValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(SettingValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    // ========================================================================
    // LOADING
    // ========================================================================

    /// Load overrides from a JSON object file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;

        Self::from_json(&content)
            .with_context(|| format!("Invalid settings file: {:?}", path.as_ref()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let overrides: HashMap<String, SettingValue> =
            serde_json::from_str(json).context("Failed to parse settings JSON")?;

        let mut settings = Settings::new();
        for (key, value) in overrides {
            settings.set(&key, value)?;
        }
        Ok(settings)
    }

    /// Settings from the file named by `FUEL_LOCATOR_CONFIG`, or defaults
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                tracing::info!(path = %path, "loading settings");
                Self::from_file(path)
            }
            Err(_) => Ok(Settings::new()),
        }
    }

    // ========================================================================
    // TYPED ACCESSORS
    // ========================================================================

    /// Selected fuel; an unknown product code falls back to unleaded
    pub fn fuel_type(&self) -> FuelType {
        self.get_int(KEY_FUEL_TYPE)
            .and_then(|code| u8::try_from(code).ok())
            .and_then(FuelType::from_code)
            .unwrap_or_default()
    }

    pub fn use_discounts(&self) -> bool {
        self.get_bool(KEY_USE_DISCOUNTS).unwrap_or(true)
    }

    pub fn show_clusters(&self) -> bool {
        self.get_bool(KEY_SHOW_CLUSTERS).unwrap_or(true)
    }

    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(self.get_text(KEY_DATABASE_PATH).unwrap_or("fuel-locator.db"))
    }

    pub fn server_addr(&self) -> String {
        self.get_text(KEY_SERVER_ADDR).unwrap_or("0.0.0.0:3000").to_string()
    }
}

impl Default for Settings {
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
    fn test_defaults_registered() {
        let settings = Settings::new();

        assert_eq!(settings.keys().len(), 5);
        assert_eq!(settings.fuel_type(), FuelType::Unleaded);
        assert!(settings.use_discounts());
        assert!(settings.show_clusters());
        assert_eq!(settings.database_path(), PathBuf::from("fuel-locator.db"));
        assert_eq!(settings.server_addr(), "0.0.0.0:3000");
    }

    #[test]
    fn test_set_and_reset() {
        let mut settings = Settings::new();
        settings.set(KEY_USE_DISCOUNTS, SettingValue::Bool(false)).unwrap();
        assert!(!settings.use_discounts());

        settings.reset(KEY_USE_DISCOUNTS);
        assert!(settings.use_discounts());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut settings = Settings::new();
        let err = settings.set("colour_scheme", SettingValue::Text("dark".into())).unwrap_err();
        assert!(err.to_string().contains("Unknown setting"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let mut settings = Settings::new();
        let err = settings.set(KEY_SHOW_CLUSTERS, SettingValue::Int(1)).unwrap_err();
        assert!(err.to_string().contains("expects a bool"));
    }

    #[test]
    fn test_from_json_overrides() {
        let settings = Settings::from_json(
            r#"{"fuel_type": 4, "show_clusters": false, "database_path": "/tmp/prices.db"}"#,
        )
        .unwrap();

        assert_eq!(settings.fuel_type(), FuelType::Diesel);
        assert!(!settings.show_clusters());
        assert_eq!(settings.database_path(), PathBuf::from("/tmp/prices.db"));
        // Untouched keys keep defaults
        assert!(settings.use_discounts());
    }

    #[test]
    fn test_unknown_fuel_code_falls_back() {
        let settings = Settings::from_json(r#"{"fuel_type": 3}"#).unwrap();
        assert_eq!(settings.fuel_type(), FuelType::Unleaded);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(Settings::from_json("not json").is_err());
        assert!(Settings::from_json(r#"{"nope": true}"#).is_err());
    }

    #[test]
    fn test_from_missing_file() {
        let err = Settings::from_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read settings file"));
    }

    #[test]
    fn test_describe_lists_current_values() {
        let mut settings = Settings::new();
        settings.set(KEY_SHOW_CLUSTERS, SettingValue::Bool(false)).unwrap();

        let rows = settings.describe();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].0, KEY_DATABASE_PATH);
        assert_eq!(rows[0].1, "\"fuel-locator.db\"");

        let clusters = rows.iter().find(|(key, _, _)| key == KEY_SHOW_CLUSTERS).unwrap();
        assert_eq!(clusters.1, "false");
        assert_eq!(clusters.2, "Merge nearby markers into clusters");
    }

    #[test]
    fn test_register_custom_setting() {
        let mut settings = Settings::new();
        settings.register(
            SettingDefinition::new("map_style", SettingValue::Text("standard".into()))
                .with_description("Base map style"),
        );

        assert_eq!(settings.get_text("map_style"), Some("standard"));
        settings.set("map_style", SettingValue::Text("satellite".into())).unwrap();
        assert_eq!(settings.get_text("map_style"), Some("satellite"));
    }
}
