use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::context::MapContext;
use crate::entities::{
    tenths_from_cents, Brand, FuelType, PriceObservation, Region, Station, Statistics, Suburb,
    INDEPENDENT_BRAND,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One row of a daily price feed
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PriceRecord {
    #[serde(rename = "Trading_Name")]
    pub trading_name: String,

    #[serde(rename = "Brand")]
    pub brand: Option<String>,

    #[serde(rename = "Address")]
    pub address: Option<String>,

    #[serde(rename = "Suburb")]
    pub suburb: Option<String>,

    #[serde(rename = "Region")]
    pub region: Option<String>,

    #[serde(rename = "Phone")]
    pub phone: Option<String>,

    #[serde(rename = "Date")]
    pub date: NaiveDate,

    /// Product label or code ("ULP", "Diesel", "4")
    #[serde(rename = "Product")]
    pub product: String,

    /// Cents per litre, e.g. 145.9
    #[serde(rename = "Price")]
    pub price: Option<f64>,

    /// Semicolon separated
    #[serde(rename = "Features", default)]
    pub features: Option<String>,

    #[serde(rename = "Latitude", default)]
    pub latitude: Option<f64>,

    #[serde(rename = "Longitude", default)]
    pub longitude: Option<f64>,
}

/// Counts from one import run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub records: usize,
    pub stations: usize,
    pub prices: usize,
    pub skipped: usize,
    pub statistics: usize,
}

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS brands (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            aliases TEXT NOT NULL,
            discount REAL NOT NULL DEFAULT 0,
            personal_discount REAL,
            use_discount INTEGER NOT NULL DEFAULT 0,
            glyph_key TEXT,
            image_key TEXT,
            independent INTEGER NOT NULL DEFAULT 0,
            version INTEGER NOT NULL DEFAULT 1,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS regions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS suburbs (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            region_id TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS stations (
            trading_name TEXT PRIMARY KEY,
            address TEXT,
            phone TEXT,
            brand_id TEXT,
            suburb_id TEXT,
            features TEXT NOT NULL,
            latitude REAL,
            longitude REAL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS prices (
            trading_name TEXT NOT NULL,
            fuel_type INTEGER NOT NULL,
            date TEXT NOT NULL,
            price INTEGER NOT NULL,
            PRIMARY KEY (trading_name, fuel_type, date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS statistics (
            region_id TEXT NOT NULL,
            fuel_type INTEGER NOT NULL,
            date TEXT NOT NULL,
            percentiles TEXT NOT NULL,
            median INTEGER,
            PRIMARY KEY (region_id, fuel_type, date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_prices_date ON prices(date)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_suburbs_region ON suburbs(region_id)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// WRITES (upserts)
// ============================================================================

pub fn insert_brand(conn: &Connection, brand: &Brand) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO brands (
            id, name, aliases, discount, personal_discount, use_discount,
            glyph_key, image_key, independent, version, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            brand.id,
            brand.name,
            serde_json::to_string(&brand.aliases)?,
            brand.discount,
            brand.personal_discount,
            brand.use_discount,
            brand.glyph_key,
            brand.image_key,
            brand.independent,
            brand.version,
            brand.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn insert_region(conn: &Connection, region: &Region) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO regions (id, name) VALUES (?1, ?2)",
        params![region.id, region.name],
    )?;
    Ok(())
}

pub fn insert_suburb(conn: &Connection, suburb: &Suburb) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO suburbs (id, name, region_id) VALUES (?1, ?2, ?3)",
        params![suburb.id, suburb.name, suburb.region_id],
    )?;
    Ok(())
}

/// Upsert a station and all of its price observations
pub fn insert_station(conn: &Connection, station: &Station) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO stations (
            trading_name, address, phone, brand_id, suburb_id, features, latitude, longitude
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            station.trading_name,
            station.address,
            station.phone,
            station.brand_id,
            station.suburb_id,
            serde_json::to_string(&station.features)?,
            station.latitude,
            station.longitude,
        ],
    )?;

    for observation in &station.prices {
        conn.execute(
            "INSERT OR REPLACE INTO prices (trading_name, fuel_type, date, price)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                station.trading_name,
                observation.fuel_type.code(),
                observation.date.format(DATE_FORMAT).to_string(),
                observation.price,
            ],
        )?;
    }
    Ok(())
}

pub fn insert_statistics(conn: &Connection, stats: &Statistics) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO statistics (region_id, fuel_type, date, percentiles, median)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            stats.region_id,
            stats.fuel_type.code(),
            stats.date.format(DATE_FORMAT).to_string(),
            serde_json::to_string(&stats.percentiles)?,
            stats.median,
        ],
    )?;
    Ok(())
}

/// Write every registry of a context in one transaction
pub fn save_context(conn: &mut Connection, ctx: &MapContext) -> Result<()> {
    let tx = conn.transaction()?;

    for brand in ctx.brands.all_brands() {
        insert_brand(&tx, brand)?;
    }
    for region in ctx.regions.all_regions() {
        insert_region(&tx, region)?;
    }
    for suburb in ctx.suburbs.all_suburbs() {
        insert_suburb(&tx, suburb)?;
    }
    for station in ctx.stations.all_stations() {
        insert_station(&tx, station)?;
    }
    for stats in ctx.statistics.all_statistics() {
        insert_statistics(&tx, stats)?;
    }

    tx.commit().context("Failed to commit context snapshot")?;
    Ok(())
}

// ============================================================================
// READS
// ============================================================================

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("Invalid date: {}", s))
}

fn parse_fuel(code: i64) -> Result<FuelType> {
    u8::try_from(code)
        .ok()
        .and_then(FuelType::from_code)
        .ok_or_else(|| anyhow!("Unknown fuel product code: {}", code))
}

/// Load the full reference context from the snapshot
pub fn load_context(conn: &Connection) -> Result<MapContext> {
    let mut ctx = MapContext::new();

    // Brands
    let mut stmt = conn.prepare(
        "SELECT id, name, aliases, discount, personal_discount, use_discount,
                glyph_key, image_key, independent, version, updated_at
         FROM brands",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, Option<f64>>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, Option<String>>(6)?,
                row.get::<_, Option<String>>(7)?,
                row.get::<_, bool>(8)?,
                row.get::<_, i64>(9)?,
                row.get::<_, String>(10)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (id, name, aliases, discount, personal_discount, use_discount, glyph_key, image_key, independent, version, updated_at) in rows {
        let aliases: Vec<String> = serde_json::from_str(&aliases)
            .with_context(|| format!("Failed to parse aliases JSON for brand {}", name))?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        ctx.brands.register(Brand {
            id,
            name,
            aliases,
            discount,
            personal_discount,
            use_discount,
            glyph_key,
            image_key,
            independent,
            version,
            updated_at,
        });
    }

    // Regions
    let mut stmt = conn.prepare("SELECT id, name FROM regions")?;
    let regions = stmt
        .query_map([], |row| Ok(Region { id: row.get(0)?, name: row.get(1)? }))?
        .collect::<Result<Vec<_>, _>>()?;
    for region in regions {
        ctx.regions.register(region);
    }

    // Suburbs
    let mut stmt = conn.prepare("SELECT id, name, region_id FROM suburbs")?;
    let suburbs = stmt
        .query_map([], |row| {
            Ok(Suburb {
                id: row.get(0)?,
                name: row.get(1)?,
                region_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for suburb in suburbs {
        ctx.suburbs.register(suburb);
    }

    // Stations
    let mut stmt = conn.prepare(
        "SELECT trading_name, address, phone, brand_id, suburb_id, features, latitude, longitude
         FROM stations ORDER BY trading_name",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let station = Station {
                trading_name: row.get(0)?,
                address: row.get(1)?,
                phone: row.get(2)?,
                brand_id: row.get(3)?,
                suburb_id: row.get(4)?,
                prices: Vec::new(),
                features: Vec::new(),
                latitude: row.get(6)?,
                longitude: row.get(7)?,
            };
            Ok((station, row.get::<_, String>(5)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut by_name: HashMap<String, Station> = HashMap::with_capacity(rows.len());
    for (mut station, features) in rows {
        station.features = serde_json::from_str(&features).with_context(|| {
            format!("Failed to parse features JSON for station {}", station.trading_name)
        })?;
        by_name.insert(station.trading_name.clone(), station);
    }

    // Prices
    let mut stmt = conn.prepare("SELECT trading_name, fuel_type, date, price FROM prices")?;
    let prices = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (trading_name, fuel, date, price) in prices {
        match by_name.get_mut(&trading_name) {
            Some(station) => station.record_price(PriceObservation::new(
                parse_fuel(fuel)?,
                price,
                parse_date(&date)?,
            )),
            None => tracing::warn!(station = %trading_name, "price for unknown station ignored"),
        }
    }

    let mut stations: Vec<Station> = by_name.into_values().collect();
    stations.sort_by(|a, b| a.trading_name.cmp(&b.trading_name));
    for station in stations {
        ctx.stations.register(station);
    }

    // Statistics
    let mut stmt = conn.prepare("SELECT region_id, fuel_type, date, percentiles, median FROM statistics")?;
    let stats = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<i64>>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (region_id, fuel, date, percentiles, median) in stats {
        ctx.statistics.register(Statistics {
            region_id,
            fuel_type: parse_fuel(fuel)?,
            date: parse_date(&date)?,
            percentiles: serde_json::from_str(&percentiles)
                .context("Failed to parse percentiles JSON")?,
            median,
        });
    }

    tracing::info!("loaded {}", ctx.summary());
    Ok(ctx)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM stations", [], |row| row.get(0))?;

    Ok(count)
}

// ============================================================================
// CSV IMPORT
// ============================================================================

pub fn load_price_csv(csv_path: &Path) -> Result<Vec<PriceRecord>> {
    let rdr = csv::Reader::from_path(csv_path).context("Failed to open CSV file")?;
    read_price_records(rdr)
}

pub fn read_price_records<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<PriceRecord>> {
    let mut records = Vec::new();

    for result in rdr.deserialize() {
        let record: PriceRecord = result.context("Failed to deserialize price record")?;
        records.push(record);
    }

    Ok(records)
}

/// Merge feed records into a context: creates missing brands, regions and
/// suburbs, upserts stations and prices, then derives statistics for every
/// (region, fuel, date) the records touched.
pub fn apply_records(ctx: &mut MapContext, records: &[PriceRecord]) -> ImportSummary {
    let mut summary = ImportSummary {
        records: records.len(),
        ..Default::default()
    };
    let mut touched: Vec<(String, FuelType, NaiveDate)> = Vec::new();

    for record in records {
        let Some(fuel) = FuelType::parse(&record.product) else {
            tracing::warn!(product = %record.product, "unknown product, record skipped");
            summary.skipped += 1;
            continue;
        };

        let brand_id = record.brand.as_deref().map(|name| resolve_brand(ctx, name));
        let region_id = record.region.as_deref().map(|name| resolve_region(ctx, name));
        let suburb_id = record
            .suburb
            .as_deref()
            .map(|name| resolve_suburb(ctx, name, region_id.clone()));

        let mut station = ctx
            .stations
            .find_by_name(&record.trading_name)
            .cloned()
            .unwrap_or_else(|| {
                summary.stations += 1;
                Station::new(record.trading_name.clone())
            });

        station.address = record.address.clone().or(station.address);
        station.phone = record.phone.clone().or(station.phone);
        station.brand_id = brand_id.or(station.brand_id);
        station.suburb_id = suburb_id.or(station.suburb_id);
        station.latitude = record.latitude.or(station.latitude);
        station.longitude = record.longitude.or(station.longitude);
        for feature in record.features.iter().flat_map(|f| f.split(';')) {
            let feature = feature.trim();
            if !feature.is_empty() {
                station.add_feature(feature);
            }
        }

        if let Some(cents) = record.price {
            station.record_price(PriceObservation::new(fuel, tenths_from_cents(cents), record.date));
            summary.prices += 1;

            if let Some(region_id) = region_id.clone() {
                let key = (region_id, fuel, record.date);
                if !touched.contains(&key) {
                    touched.push(key);
                }
            }
        }

        ctx.stations.register(station);
    }

    for (region_id, fuel, date) in touched {
        if let Some(stats) = regional_statistics(ctx, &region_id, fuel, date) {
            ctx.statistics.register(stats);
            summary.statistics += 1;
        }
    }

    summary
}

/// Statistics over every priced station whose suburb reports into a region
pub fn regional_statistics(
    ctx: &MapContext,
    region_id: &str,
    fuel: FuelType,
    date: NaiveDate,
) -> Option<Statistics> {
    let suburb_ids: Vec<&str> = ctx
        .suburbs
        .in_region(region_id)
        .into_iter()
        .map(|s| s.id.as_str())
        .collect();

    let prices: Vec<i64> = ctx
        .stations
        .all_stations()
        .iter()
        .filter(|s| s.suburb_id.as_deref().map_or(false, |id| suburb_ids.contains(&id)))
        .filter_map(|s| s.price_on(fuel, date))
        .collect();

    Statistics::from_prices(region_id, fuel, date, &prices)
}

/// Import a CSV feed into the snapshot database
pub fn import_prices(conn: &mut Connection, records: &[PriceRecord]) -> Result<ImportSummary> {
    let mut ctx = load_context(conn)?;
    let summary = apply_records(&mut ctx, records);
    save_context(conn, &ctx)?;

    tracing::info!(
        records = summary.records,
        new_stations = summary.stations,
        prices = summary.prices,
        skipped = summary.skipped,
        statistics = summary.statistics,
        "import complete"
    );
    Ok(summary)
}

/// Set or clear the user's own discount for a brand, matched by name or alias.
/// Setting a discount also switches discounts on for that brand.
pub fn set_personal_discount(conn: &Connection, brand_name: &str, cents: Option<f64>) -> Result<Brand> {
    let mut ctx = load_context(conn)?;
    let id = ctx
        .brands
        .find_by_string(brand_name)
        .map(|b| b.id.clone())
        .ok_or_else(|| anyhow!("Unknown brand: {}", brand_name))?;

    ctx.brands
        .update_brand(&id, |brand| {
            brand.personal_discount = cents;
            if cents.is_some() {
                brand.use_discount = true;
            }
        })
        .map_err(|e| anyhow!(e))?;

    let brand = ctx
        .brands
        .find_by_id(&id)
        .cloned()
        .ok_or_else(|| anyhow!("Brand vanished during update: {}", id))?;
    insert_brand(conn, &brand)?;

    tracing::info!(brand = %brand.name, discount = ?cents, version = brand.version, "personal discount updated");
    Ok(brand)
}

fn resolve_brand(ctx: &mut MapContext, name: &str) -> String {
    if name.trim().eq_ignore_ascii_case(INDEPENDENT_BRAND) {
        return ctx.brands.independent().id.clone();
    }
    if let Some(brand) = ctx.brands.find_by_string(name) {
        return brand.id.clone();
    }
    let brand = Brand::new(name.trim());
    let id = brand.id.clone();
    ctx.brands.register(brand);
    id
}

fn resolve_region(ctx: &mut MapContext, name: &str) -> String {
    if let Some(region) = ctx.regions.find_by_name(name) {
        return region.id.clone();
    }
    let region = Region::new(name.trim());
    let id = region.id.clone();
    ctx.regions.register(region);
    id
}

fn resolve_suburb(ctx: &mut MapContext, name: &str, region_id: Option<String>) -> String {
    if let Some(existing) = ctx.suburbs.find_by_name(name) {
        let id = existing.id.clone();

        // A suburb first seen without a region picks up the first one reported
        if existing.region_id.is_none() && region_id.is_some() {
            let mut suburb = existing.clone();
            suburb.region_id = region_id;
            ctx.suburbs.register(suburb);
        }
        return id;
    }
    let suburb = Suburb::new(name.trim(), region_id);
    let id = suburb.id.clone();
    ctx.suburbs.register(suburb);
    id
}

// ============================================================================
// TESTS
// ============================================================================
