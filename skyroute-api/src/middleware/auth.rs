use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use skyroute_core::User;

use crate::{
    error::AppError,
    state::{AppState, AuthConfig},
};

pub const SESSION_COOKIE: &str = "skyroute_session";

// ============================================================================
// Path lists
// ============================================================================

/// Everything under these prefixes needs a session...
pub const PROTECTED_PREFIXES: &[&str] = &["/api", "/account", "/bookings"];

/// ...except these.
pub const PUBLIC_PREFIXES: &[&str] = &[
    "/api/auth",
    "/api/flights",
    "/api/duffel",
    "/api/track-unsplash-download",
];

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

pub fn is_protected(path: &str) -> bool {
    PROTECTED_PREFIXES.iter().any(|p| under(path, p)) && !PUBLIC_PREFIXES.iter().any(|p| under(path, p))
}

// ============================================================================
// JWT Claims
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

pub fn issue_token(auth: &AuthConfig, user: &User) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = SessionClaims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::seconds(auth.expiration as i64)).timestamp() as usize,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(auth.secret.expose().as_bytes()))
        .map_err(|e| AppError::InternalServerError(format!("Token encoding failed: {}", e)))
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Option<SessionClaims> {
    decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.expose().as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

pub fn session_cookie(auth: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .build()
}

/// Bearer header first, then the session cookie.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Session guard middleware
// ============================================================================

pub async fn session_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !is_protected(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = extract_token(req.headers()).ok_or_else(AppError::unauthorized)?;
    let claims = verify_token(&state.auth, &token).ok_or_else(|| {
        tracing::debug!("Rejected session token for {}", req.uri().path());
        AppError::unauthorized()
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
