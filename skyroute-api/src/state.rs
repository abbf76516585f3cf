use std::sync::Arc;
use skyroute_core::{AirportDirectory, DownloadTracker, OfferProvider, UserRepository};
use skyroute_shared::Masked;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Masked<String>,
    /// Session lifetime in seconds
    pub expiration: u64,
    pub reset_token_ttl: u64,
    pub bcrypt_cost: u32,
    pub cookie_secure: bool,
    pub expose_reset_token: bool,
}

impl From<&skyroute_store::app_config::AuthConfig> for AuthConfig {
    fn from(config: &skyroute_store::app_config::AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration: config.jwt_expiration_seconds,
            reset_token_ttl: config.reset_token_ttl_seconds,
            bcrypt_cost: config.bcrypt_cost,
            cookie_secure: config.cookie_secure,
            expose_reset_token: config.expose_reset_token,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub offers: Arc<dyn OfferProvider>,
    pub users: Arc<dyn UserRepository>,
    pub downloads: Arc<dyn DownloadTracker>,
    pub airports: AirportDirectory,
    pub auth: AuthConfig,
}
