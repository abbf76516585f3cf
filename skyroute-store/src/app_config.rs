use serde::Deserialize;
use skyroute_shared::Masked;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub duffel: DuffelConfig,
    #[serde(default)]
    pub supabase: SupabaseConfig,
    #[serde(default)]
    pub unsplash: UnsplashConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: Masked<String>,
    #[serde(default = "default_session_seconds")]
    pub jwt_expiration_seconds: u64,
    #[serde(default = "default_reset_ttl")]
    pub reset_token_ttl_seconds: u64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    /// Return the raw reset token in the forgot-password response. Local setups only.
    #[serde(default)]
    pub expose_reset_token: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DuffelConfig {
    #[serde(default = "default_duffel_url")]
    pub api_url: String,
    #[serde(default)]
    pub access_token: Masked<String>,
    #[serde(default = "default_duffel_version")]
    pub version: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SupabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub service_role_key: Masked<String>,
    #[serde(default = "default_users_table")]
    pub users_table: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UnsplashConfig {
    #[serde(default = "default_unsplash_url")]
    pub api_url: String,
    #[serde(default)]
    pub access_key: Masked<String>,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_session_seconds() -> u64 { 7 * 24 * 60 * 60 }
fn default_reset_ttl() -> u64 { 60 * 60 }
fn default_bcrypt_cost() -> u32 { 12 }
fn default_true() -> bool { true }
fn default_duffel_url() -> String { "https://api.duffel.com".to_string() }
fn default_duffel_version() -> String { "v2".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_users_table() -> String { "users".to_string() }
fn default_unsplash_url() -> String { "https://api.unsplash.com".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Masked::default(),
            jwt_expiration_seconds: default_session_seconds(),
            reset_token_ttl_seconds: default_reset_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
            cookie_secure: true,
            expose_reset_token: false,
        }
    }
}

impl Default for DuffelConfig {
    fn default() -> Self {
        Self {
            api_url: default_duffel_url(),
            access_token: Masked::default(),
            version: default_duffel_version(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: Masked::default(),
            users_table: default_users_table(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for UnsplashConfig {
    fn default() -> Self {
        Self { api_url: default_unsplash_url(), access_key: Masked::default() }
    }
}

/// Conventional variable names honoured on top of the `SKYROUTE__*` scheme.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("duffel.access_token", "DUFFEL_ACCESS_TOKEN"),
    ("supabase.url", "SUPABASE_URL"),
    ("supabase.service_role_key", "SUPABASE_SERVICE_ROLE_KEY"),
    ("unsplash.access_key", "UNSPLASH_ACCESS_KEY"),
    ("auth.jwt_secret", "JWT_SECRET"),
    ("server.port", "PORT"),
];

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // SKYROUTE__DUFFEL__ACCESS_TOKEN=... sets duffel.access_token
            .add_source(config::Environment::with_prefix("SKYROUTE").separator("__"));

        for (key, var) in ENV_ALIASES {
            builder = builder.set_override_option(*key, env::var(var).ok())?;
        }

        builder.build()?.try_deserialize()
    }

    /// Names of upstream credentials that are not configured. Routes depending
    /// on them will fail with the upstream's error until they are set.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.duffel.access_token.is_blank() {
            missing.push("duffel.access_token");
        }
        if self.supabase.url.trim().is_empty() {
            missing.push("supabase.url");
        }
        if self.supabase.service_role_key.is_blank() {
            missing.push("supabase.service_role_key");
        }
        if self.unsplash.access_key.is_blank() {
            missing.push("unsplash.access_key");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_source() {
        let config: Config = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize()
            .expect("empty config should fall back to defaults");

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.duffel.api_url, "https://api.duffel.com");
        assert_eq!(config.duffel.version, "v2");
        assert_eq!(config.supabase.users_table, "users");
        assert_eq!(config.auth.reset_token_ttl_seconds, 3600);
        assert!(config.auth.cookie_secure);
        assert!(!config.auth.expose_reset_token);
        assert_eq!(config.missing_credentials().len(), 4);
    }

    #[test]
    fn test_overrides_and_masking() {
        let config: Config = config::Config::builder()
            .set_override("duffel.access_token", "duffel_test_xyz")
            .unwrap()
            .set_override("server.port", "8080")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.duffel.access_token.expose(), "duffel_test_xyz");
        assert!(!format!("{:?}", config).contains("duffel_test_xyz"));
        assert!(!config.missing_credentials().contains(&"duffel.access_token"));
    }
}
