use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use skyroute_core::search::{ResultsQuery, SearchCriteria, SearchResults};

use crate::{
    error::AppError,
    extract::{AppJson, AppQuery},
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct InitiateSearchResponse {
    pub offer_request_id: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/flights/initiate-search", post(initiate_search))
        .route("/api/flights/results", get(search_results))
}

/// POST /api/flights/initiate-search
/// Opens an offer request upstream; the browser then polls `results`.
async fn initiate_search(
    State(state): State<AppState>,
    AppJson(criteria): AppJson<SearchCriteria>,
) -> Result<Json<InitiateSearchResponse>, AppError> {
    let params = criteria.validate()?;
    let request = state.offers.create_offer_request(&params).await?;

    tracing::debug!("Search {} -> {} on {} opened {}", params.origin, params.destination, params.departure_date, request.id);

    Ok(Json(InitiateSearchResponse {
        offer_request_id: request.id,
    }))
}

/// GET /api/flights/results
async fn search_results(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ResultsQuery>,
) -> Result<Json<SearchResults>, AppError> {
    let query = query.validate()?;
    let page = state.offers.list_offers(&query).await?;

    tracing::debug!(
        "Offer request {}: {} offers on this page",
        query.offer_request_id,
        page.offers.len()
    );

    Ok(Json(SearchResults::from(page)))
}
