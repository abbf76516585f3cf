use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use skyroute_api::{app, state::{AppState, AuthConfig}};
use skyroute_core::AirportDirectory;
use skyroute_store::{Config, DuffelClient, SupabaseUserRepository, UnsplashClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skyroute_api=debug,skyroute_store=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    if config.auth.jwt_secret.is_blank() {
        anyhow::bail!("auth.jwt_secret is not set (JWT_SECRET or SKYROUTE__AUTH__JWT_SECRET)");
    }
    for missing in config.missing_credentials() {
        tracing::warn!("{} is not configured; routes that depend on it will fail", missing);
    }

    let offers = DuffelClient::new(&config.duffel).context("Failed to build flights API client")?;
    let users = SupabaseUserRepository::new(&config.supabase).context("Failed to build database client")?;
    let downloads = UnsplashClient::new(&config.unsplash)?;

    let app_state = AppState {
        offers: Arc::new(offers),
        users: Arc::new(users),
        downloads: Arc::new(downloads),
        airports: AirportDirectory::new(),
        auth: AuthConfig::from(&config.auth),
    };

    let host: IpAddr = config
        .server
        .host
        .parse()
        .with_context(|| format!("Invalid server.host {}", config.server.host))?;
    let addr = SocketAddr::new(host, config.server.port);
    tracing::info!("Starting SkyRoute API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
