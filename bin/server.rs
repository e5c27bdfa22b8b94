// Fuel Locator - Web Server
// Map annotations over a REST API with Axum

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fuel_locator::{
    load_context, setup_database, style_table, AnnotationRenderer, FuelType, MapContext,
    PriceTier, Settings, StationAnnotation, TierStyle,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    ctx: Arc<MapContext>,
    fuel_type: FuelType,
    use_discounts: bool,
    show_clusters: bool,
}

impl AppState {
    fn renderer(&self, fuel: Option<FuelType>) -> AnnotationRenderer<'_, MapContext> {
        AnnotationRenderer::new(self.ctx.as_ref(), fuel.unwrap_or(self.fuel_type))
            .with_discounts(self.use_discounts)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Optional `date` and `fuel` parameters shared by the annotation routes
#[derive(Debug, Default, Deserialize)]
struct AnnotationQuery {
    date: Option<String>,
    fuel: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClusterQuery {
    stations: Option<String>,
    date: Option<String>,
    fuel: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TierStyleResponse {
    tier: PriceTier,
    label: &'static str,
    #[serde(flatten)]
    style: TierStyle,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClusterResponse {
    glyph_text: String,
    tint_key: &'static str,
    members: Vec<StationAnnotation>,
}

fn parse_date(date: Option<&str>) -> Result<NaiveDate, String> {
    match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| format!("Invalid date {:?}, expected YYYY-MM-DD", s)),
        None => Ok(Local::now().date_naive()),
    }
}

fn parse_fuel(fuel: Option<&str>) -> Result<Option<FuelType>, String> {
    match fuel {
        Some(s) => FuelType::parse(s)
            .map(Some)
            .ok_or_else(|| format!("Unknown fuel type {:?}", s)),
        None => Ok(None),
    }
}

fn bad_request(message: String) -> axum::response::Response {
    tracing::warn!("{}", message);
    (StatusCode::BAD_REQUEST, Json(ApiResponse::<()>::err(message))).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.ctx.summary()))
}

/// GET /api/tiers - Style for every tier
async fn get_tiers() -> impl IntoResponse {
    let tiers: Vec<TierStyleResponse> = style_table()
        .into_iter()
        .map(|(tier, style)| TierStyleResponse {
            tier,
            label: tier.label(),
            style,
        })
        .collect();

    Json(ApiResponse::ok(tiers))
}

/// GET /api/annotations?date=YYYY-MM-DD&fuel=... - Every station
async fn get_annotations(
    State(state): State<AppState>,
    Query(query): Query<AnnotationQuery>,
) -> impl IntoResponse {
    let date = match parse_date(query.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return bad_request(e),
    };
    let fuel = match parse_fuel(query.fuel.as_deref()) {
        Ok(fuel) => fuel,
        Err(e) => return bad_request(e),
    };

    let annotations = state.renderer(fuel).render_all(date);
    (StatusCode::OK, Json(ApiResponse::ok(annotations))).into_response()
}

/// GET /api/annotations/:station - One station by trading name
async fn get_station_annotation(
    State(state): State<AppState>,
    Path(trading_name): Path<String>,
    Query(query): Query<AnnotationQuery>,
) -> impl IntoResponse {
    let date = match parse_date(query.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return bad_request(e),
    };
    let fuel = match parse_fuel(query.fuel.as_deref()) {
        Ok(fuel) => fuel,
        Err(e) => return bad_request(e),
    };

    match state.renderer(fuel).render(&trading_name, date) {
        Some(annotation) => (StatusCode::OK, Json(ApiResponse::ok(annotation))).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(format!("Station not found: {}", trading_name))),
        )
            .into_response(),
    }
}

/// GET /api/clusters?stations=a,b,c - Summary marker for a group of stations
async fn get_cluster(
    State(state): State<AppState>,
    Query(query): Query<ClusterQuery>,
) -> impl IntoResponse {
    if !state.show_clusters {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::err("Clustering is disabled")),
        )
            .into_response();
    }

    let date = match parse_date(query.date.as_deref()) {
        Ok(date) => date,
        Err(e) => return bad_request(e),
    };
    let fuel = match parse_fuel(query.fuel.as_deref()) {
        Ok(fuel) => fuel,
        Err(e) => return bad_request(e),
    };

    let renderer = state.renderer(fuel);
    let members: Vec<StationAnnotation> = query
        .stations
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .filter_map(|name| renderer.render(name, date))
        .collect();

    let summary = renderer.cluster(&members);
    let response = ClusterResponse {
        glyph_text: summary.glyph_text,
        tint_key: summary.tint_key,
        members,
    };

    (StatusCode::OK, Json(ApiResponse::ok(response))).into_response()
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fuel_locator=info,fuel_locator_server=info,tower_http=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🌐 Fuel Locator - Web Server");

    let settings = Settings::from_env()?;
    let db_path = settings.database_path();

    if !db_path.exists() {
        tracing::error!(path = ?db_path, "database not found, run `fuel-locator import <prices.csv>` first");
        std::process::exit(1);
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;
    setup_database(&conn)?;
    let ctx = load_context(&conn)?;
    tracing::info!(path = ?db_path, "{}", ctx.summary());

    // Create shared state
    let state = AppState {
        ctx: Arc::new(ctx),
        fuel_type: settings.fuel_type(),
        use_discounts: settings.use_discounts(),
        show_clusters: settings.show_clusters(),
    };

    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/tiers", get(get_tiers))
        .route("/annotations", get(get_annotations))
        .route("/annotations/:station", get(get_station_annotation))
        .route("/clusters", get(get_cluster))
        .with_state(state);

    let app = Router::new().nest("/api", api_routes).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    // Start server
    let addr = settings.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);
    tracing::info!("   API: http://{}/api/annotations", addr);

    axum::serve(listener, app)
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fuel_locator::Station;

    fn state(show_clusters: bool) -> AppState {
        let mut ctx = MapContext::new();
        ctx.stations.register(Station::new("Caltex Subiaco"));
        ctx.stations.register(Station::new("Fuel 100%25 Depot"));

        AppState {
            ctx: Arc::new(ctx),
            fuel_type: FuelType::Unleaded,
            use_discounts: true,
            show_clusters,
        }
    }

    fn on_day() -> AnnotationQuery {
        AnnotationQuery {
            date: Some("2024-03-01".to_string()),
            fuel: None,
        }
    }

    fn cluster_query() -> ClusterQuery {
        ClusterQuery {
            stations: Some("Caltex Subiaco, Fuel 100%25 Depot".to_string()),
            date: Some("2024-03-01".to_string()),
            fuel: None,
        }
    }

    #[tokio::test]
    async fn test_station_name_used_as_extracted() {
        // Path has already percent-decoded the segment once
        let response = get_station_annotation(
            State(state(true)),
            Path("Fuel 100%25 Depot".to_string()),
            Query(on_day()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let missing = get_station_annotation(
            State(state(true)),
            Path("Fuel 100% Depot".to_string()),
            Query(on_day()),
        )
        .await
        .into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clusters_follow_setting() {
        let enabled = get_cluster(State(state(true)), Query(cluster_query()))
            .await
            .into_response();
        assert_eq!(enabled.status(), StatusCode::OK);

        let disabled = get_cluster(State(state(false)), Query(cluster_query()))
            .await
            .into_response();
        assert_eq!(disabled.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2024-03-01")),
            Ok(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
        );
        assert!(parse_date(Some("01/03/2024")).is_err());
        assert!(parse_date(None).is_ok());
    }

    #[test]
    fn test_parse_fuel() {
        assert_eq!(parse_fuel(Some("4")), Ok(Some(FuelType::Diesel)));
        assert_eq!(parse_fuel(None), Ok(None));
        assert!(parse_fuel(Some("rocket")).is_err());
    }
}
