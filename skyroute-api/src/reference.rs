use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skyroute_core::{Airport, CabinClass, PassengerType};

use crate::{error::AppError, extract::AppQuery, state::AppState};

const DEFAULT_AIRPORT_LIMIT: usize = 10;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AirportQuery {
    #[serde(default, alias = "search")]
    pub q: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct AirportEntry {
    #[serde(flatten)]
    pub airport: Airport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<&Airport> for AirportEntry {
    fn from(airport: &Airport) -> Self {
        Self {
            airport: *airport,
            distance_km: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AirportsResponse {
    pub airports: Vec<AirportEntry>,
}

#[derive(Debug, Serialize)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CabinClassesResponse {
    pub cabin_classes: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct PassengerTypesResponse {
    pub passenger_types: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct ConnectionTestResponse {
    pub status: &'static str,
    pub sample: Value,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/duffel/airports", get(list_airports))
        .route("/api/duffel/cabin-classes", get(cabin_classes))
        .route("/api/duffel/passenger-types", get(passenger_types))
        .route("/api/duffel/test", get(connection_test))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/duffel/airports
/// `code` wins over `lat`/`lon`, which win over `q`.
async fn list_airports(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AirportQuery>,
) -> Result<Json<AirportsResponse>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_AIRPORT_LIMIT);
    let directory = &state.airports;

    let airports = match (query.code.as_deref(), query.lat, query.lon) {
        (Some(code), _, _) if !code.trim().is_empty() => {
            directory.find_by_code(code).map(AirportEntry::from).into_iter().collect()
        }
        (_, Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::ValidationError("lat/lon out of range".to_string()));
            }
            directory
                .nearest(lat, lon, limit)
                .into_iter()
                .map(|(airport, km)| AirportEntry {
                    airport: *airport,
                    distance_km: Some((km * 10.0).round() / 10.0),
                })
                .collect()
        }
        _ => directory
            .search(query.q.as_deref().unwrap_or_default(), limit)
            .into_iter()
            .map(AirportEntry::from)
            .collect(),
    };

    Ok(Json(AirportsResponse { airports }))
}

/// GET /api/duffel/cabin-classes
async fn cabin_classes() -> Json<CabinClassesResponse> {
    Json(CabinClassesResponse {
        cabin_classes: CabinClass::ALL
            .iter()
            .map(|c| Choice {
                value: c.as_str(),
                label: c.label(),
            })
            .collect(),
    })
}

/// GET /api/duffel/passenger-types
async fn passenger_types() -> Json<PassengerTypesResponse> {
    Json(PassengerTypesResponse {
        passenger_types: PassengerType::ALL
            .iter()
            .map(|p| Choice {
                value: p.as_str(),
                label: p.label(),
            })
            .collect(),
    })
}

/// GET /api/duffel/test
async fn connection_test(State(state): State<AppState>) -> Result<Json<ConnectionTestResponse>, AppError> {
    let sample = state.offers.ping().await?;
    Ok(Json(ConnectionTestResponse { status: "ok", sample }))
}
