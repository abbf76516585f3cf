use axum::{http::Method, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod account;
pub mod auth;
pub mod error;
pub mod extract;
pub mod flights;
pub mod middleware;
pub mod reference;
pub mod state;
pub mod unsplash;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    // CORS Middleware
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    Router::new()
        .merge(flights::routes())
        .merge(reference::routes())
        .merge(auth::routes())
        .merge(account::routes())
        .merge(unsplash::routes())
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::session_guard))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
