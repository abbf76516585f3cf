use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use skyroute_core::credentials::{
    generate_reset_token, hash_password, hash_reset_token, validate_password, verify_password,
    verify_unknown_account,
};
use skyroute_core::user::{normalize_currency, normalize_email};
use skyroute_core::{NewUser, User, UserChanges, UserProfile};
use skyroute_shared::Masked;
use tracing::info;

use crate::{
    error::AppError,
    extract::AppJson,
    middleware::auth::{issue_token, session_cookie, SESSION_COOKIE},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";
const INVALID_RESET_TOKEN: &str = "Invalid or expired reset token";
const RESET_REQUESTED: &str = "If an account exists for that email, a reset link has been sent";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<Masked<String>>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<Masked<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: Option<Masked<String>>,
    #[serde(default)]
    pub password: Option<Masked<String>>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/reset-password", post(reset_password))
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

fn required_secret(value: Option<Masked<String>>, field: &str) -> Result<String, AppError> {
    value
        .map(Masked::into_inner)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError(format!("{field} is required")))
}

/// bcrypt runs on the blocking pool.
async fn hash_blocking(password: String, cost: u32) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AppError::InternalServerError(format!("Password hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// `None` checks against a throwaway hash so unknown accounts cost the same.
async fn verify_blocking(password: String, hash: Option<String>, cost: u32) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || match hash {
        Some(hash) => verify_password(&password, &hash),
        None => verify_unknown_account(&password, cost),
    })
    .await
    .map_err(|e| AppError::InternalServerError(format!("Password check task failed: {e}")))
}

fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, SessionResponse), AppError> {
    let token = issue_token(&state.auth, user)?;
    let jar = jar.add(session_cookie(&state.auth, token.clone()));
    Ok((
        jar,
        SessionResponse {
            token,
            user: UserProfile::from(user),
        },
    ))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/signup
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<SignupRequest>,
) -> Result<(StatusCode, CookieJar, Json<SessionResponse>), AppError> {
    let email = normalize_email(&required(req.email, "email")?);
    let password = required_secret(req.password, "password")?;
    validate_password(&password)?;
    let currency = req
        .currency
        .filter(|c| !c.trim().is_empty())
        .map(|c| normalize_currency(&c))
        .transpose()?;

    let password_hash = hash_blocking(password, state.auth.bcrypt_cost).await?;
    let user = state
        .users
        .create(&NewUser {
            email,
            password_hash: Masked::new(password_hash),
            currency,
        })
        .await?;

    info!("User {} signed up", user.id);

    let (jar, body) = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(body)))
}

/// POST /api/auth/login
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>), AppError> {
    let email = normalize_email(&required(req.email, "email")?);
    let password = required_secret(req.password, "password")?;

    let user = state.users.find_by_email(&email).await?;
    let stored_hash = user.as_ref().map(|u| u.password_hash.expose().clone());

    let verified = verify_blocking(password, stored_hash, state.auth.bcrypt_cost).await?;
    let user = match user {
        Some(user) if verified => user,
        _ => return Err(AppError::AuthenticationError(INVALID_CREDENTIALS.to_string())),
    };

    info!("User {} logged in", user.id);

    let (jar, body) = start_session(&state, jar, &user)?;
    Ok((jar, Json(body)))
}

/// POST /api/auth/logout
/// Sessions are stateless JWTs, so this only clears the cookie.
async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(MessageResponse {
            message: "Logged out",
        }),
    )
}

/// POST /api/auth/forgot-password
/// Answers the same way whether or not the account exists.
async fn forgot_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, AppError> {
    let email = normalize_email(&required(req.email, "email")?);

    let Some(user) = state.users.find_by_email(&email).await? else {
        tracing::debug!("Password reset requested for unknown account");
        return Ok(Json(ForgotPasswordResponse {
            message: RESET_REQUESTED,
            reset_token: None,
        }));
    };

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::seconds(state.auth.reset_token_ttl as i64);
    state
        .users
        .update(user.id, &UserChanges::reset_requested(hash_reset_token(&token), expires_at))
        .await?;

    info!("Password reset token issued for user {} (expires {})", user.id, expires_at);

    Ok(Json(ForgotPasswordResponse {
        message: RESET_REQUESTED,
        reset_token: state.auth.expose_reset_token.then_some(token),
    }))
}

/// POST /api/auth/reset-password
async fn reset_password(
    State(state): State<AppState>,
    AppJson(req): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let token = required_secret(req.token, "token")?;
    let password = required_secret(req.password, "password")?;
    validate_password(&password)?;

    let token_hash = hash_reset_token(&token);
    let user = state
        .users
        .find_by_reset_token(&token_hash)
        .await?
        .filter(|u| u.reset_token_valid_at(Utc::now()))
        .ok_or_else(|| AppError::ValidationError(INVALID_RESET_TOKEN.to_string()))?;

    let password_hash = hash_blocking(password, state.auth.bcrypt_cost).await?;
    state
        .users
        .consume_reset_token(user.id, &token_hash, password_hash, Utc::now())
        .await?
        .ok_or_else(|| AppError::ValidationError(INVALID_RESET_TOKEN.to_string()))?;

    info!("Password reset for user {}", user.id);

    Ok(Json(MessageResponse {
        message: "Password has been reset",
    }))
}
