use axum::{
    extract::State,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use skyroute_core::user::normalize_currency;
use skyroute_core::{UserChanges, UserProfile};
use uuid::Uuid;

use crate::{error::AppError, extract::AppJson, middleware::SessionClaims, state::AppState};

#[derive(Debug, Deserialize)]
pub struct UpdateCurrencyRequest {
    #[serde(default)]
    pub currency: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/account", get(get_account))
        .route("/api/account/currency", put(update_currency))
}

fn session_user_id(claims: &SessionClaims) -> Result<Uuid, AppError> {
    Uuid::parse_str(&claims.sub).map_err(|_| AppError::unauthorized())
}

/// GET /api/account
async fn get_account(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<UserProfile>, AppError> {
    let id = session_user_id(&claims)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFoundError("Account not found".to_string()))?;

    Ok(Json(UserProfile::from(&user)))
}

/// PUT /api/account/currency
async fn update_currency(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    AppJson(req): AppJson<UpdateCurrencyRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let id = session_user_id(&claims)?;
    let currency = req
        .currency
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::ValidationError("currency is required".to_string()))?;
    let currency = normalize_currency(&currency)?;

    let user = state.users.update(id, &UserChanges::currency(currency)).await?;
    tracing::info!("User {} set currency to {}", user.id, user.currency.as_deref().unwrap_or_default());

    Ok(Json(UserProfile::from(&user)))
}
