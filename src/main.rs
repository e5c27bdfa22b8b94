// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use std::env;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fuel_locator::{
    import_prices, load_context, load_price_csv, set_personal_discount, setup_database,
    verify_count, AnnotationPresenter, AnnotationRenderer, Settings, StationAnnotation,
};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuel_locator=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    let settings = Settings::from_env()?;

    match args.get(1).map(String::as_str) {
        Some("import") => {
            let csv_path = args
                .get(2)
                .context("Usage: fuel-locator import <prices.csv>")?;
            run_import(&settings, Path::new(csv_path))?;
        }
        Some("annotate") => {
            let date = parse_date_arg(args.get(2))?;
            run_annotate(&settings, date)?;
        }
        Some("discount") => {
            let usage = "Usage: fuel-locator discount <brand> <cents|off>";
            let brand = args.get(2).context(usage)?;
            let amount = args.get(3).context(usage)?;
            run_discount(&settings, brand, amount)?;
        }
        Some("settings") => print_settings(&settings),
        _ => run_ui_mode(&settings)?,
    }

    Ok(())
}

fn parse_date_arg(arg: Option<&String>) -> Result<NaiveDate> {
    match arg {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("Invalid date {:?}, expected YYYY-MM-DD", s)),
        None => Ok(Local::now().date_naive()),
    }
}

fn open_database(settings: &Settings) -> Result<Connection> {
    let db_path = settings.database_path();
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;
    Ok(conn)
}

fn run_import(settings: &Settings, csv_path: &Path) -> Result<()> {
    tracing::info!(csv = ?csv_path, "importing price feed");

    let records = load_price_csv(csv_path)?;
    let mut conn = open_database(settings)?;
    let summary = import_prices(&mut conn, &records)?;
    let count = verify_count(&conn)?;

    println!("✓ {} records read", summary.records);
    println!("✓ {} new stations, {} stations total", summary.stations, count);
    println!("✓ {} prices stored, {} skipped", summary.prices, summary.skipped);
    println!("✓ {} statistics records derived", summary.statistics);

    Ok(())
}

fn run_discount(settings: &Settings, brand: &str, amount: &str) -> Result<()> {
    let cents = match amount {
        "off" => None,
        _ => Some(
            amount
                .parse::<f64>()
                .with_context(|| format!("Invalid discount {:?}, expected cents per litre or \"off\"", amount))?,
        ),
    };

    let conn = open_database(settings)?;
    let brand = set_personal_discount(&conn, brand, cents)?;

    match brand.effective_discount() {
        Some(amount) => println!("✓ {}: {}c/l", brand.name, amount),
        None => println!("✓ {}: discount not active", brand.name),
    }
    Ok(())
}

fn print_settings(settings: &Settings) {
    for (key, value, description) in settings.describe() {
        println!("{:<16} {:<20} {}", key, value, description);
    }
}

/// Prints each annotation as one JSON line
struct JsonLinesPresenter;

impl AnnotationPresenter for JsonLinesPresenter {
    fn present(&mut self, annotation: &StationAnnotation) {
        match serde_json::to_string(annotation) {
            Ok(line) => println!("{}", line),
            Err(e) => tracing::error!(station = %annotation.trading_name, "failed to encode annotation: {}", e),
        }
    }
}

fn run_annotate(settings: &Settings, date: NaiveDate) -> Result<()> {
    let conn = open_database(settings)?;
    let ctx = load_context(&conn)?;

    let renderer = AnnotationRenderer::new(&ctx, settings.fuel_type())
        .with_discounts(settings.use_discounts());
    let count = renderer.present_all(date, &mut JsonLinesPresenter);

    tracing::info!(count, %date, fuel = settings.fuel_type().as_str(), "annotations written");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(settings: &Settings) -> Result<()> {
    let db_path = settings.database_path();

    if !db_path.exists() {
        tracing::error!(path = ?db_path, "database not found, run `fuel-locator import <prices.csv>` first");
        std::process::exit(1);
    }

    let conn = open_database(settings)?;
    let ctx = load_context(&conn)?;
    let date = Local::now().date_naive();

    let renderer = AnnotationRenderer::new(&ctx, settings.fuel_type())
        .with_discounts(settings.use_discounts());
    let mut app = ui::App::new(renderer.fuel_type(), date).with_clusters(settings.show_clusters());
    app.reload(&renderer, date);

    ui::run_ui(&mut app, &renderer)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_settings: &Settings) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: fuel-locator annotate [YYYY-MM-DD]");
    std::process::exit(1);
}
