use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use skyroute_core::user::{NewUser, User, UserChanges};
use skyroute_core::{CoreError, CoreResult, UserRepository};
use skyroute_shared::Masked;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app_config::SupabaseConfig;

/// User records stored in the hosted Postgres, reached through its PostgREST
/// endpoint with the service-role key. Row level security does not apply.
#[derive(Clone)]
pub struct SupabaseUserRepository {
    http: Client,
    table_url: String,
    service_key: Masked<String>,
}

impl SupabaseUserRepository {
    pub fn new(config: &SupabaseConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            table_url: format!("{}/rest/v1/{}", config.url.trim_end_matches('/'), config.users_table),
            service_key: config.service_role_key.clone(),
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.http
            .request(method, &self.table_url)
            .header("apikey", self.service_key.expose())
            .bearer_auth(self.service_key.expose())
    }

    async fn rows<T: DeserializeOwned>(&self, builder: RequestBuilder) -> CoreResult<Vec<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| CoreError::UpstreamError(format!("Database request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| CoreError::UpstreamError(format!("Failed to read database response: {e}")))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| format!("Database returned {status}"));
            warn!("PostgREST error {}: {}", status, message);
            return Err(CoreError::UpstreamError(message));
        }

        serde_json::from_str(&body)
            .map_err(|e| CoreError::UpstreamError(format!("Failed to parse database response: {e}")))
    }

    async fn find_one(&self, column: &str, value: &str) -> CoreResult<Option<User>> {
        let builder = self.request(Method::GET).query(&[
            ("select", "*".to_string()),
            (column, format!("eq.{value}")),
            ("limit", "1".to_string()),
        ]);
        Ok(self.rows::<User>(builder).await?.into_iter().next())
    }
}

/// PostgREST error bodies carry `message`, sometimes with `details`.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let message = value.get("message")?.as_str()?;
    match value.get("details").and_then(Value::as_str) {
        Some(details) if !details.is_empty() => Some(format!("{message}: {details}")),
        _ => Some(message.to_string()),
    }
}

#[async_trait]
impl UserRepository for SupabaseUserRepository {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        self.find_one("id", &id.to_string()).await
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> CoreResult<Option<User>> {
        self.find_one("reset_token", token_hash).await
    }

    async fn create(&self, user: &NewUser) -> CoreResult<User> {
        let builder = self
            .request(Method::POST)
            .header("Prefer", "return=representation")
            .json(user);

        let created = self
            .rows::<User>(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::UpstreamError("Database returned no row for insert".to_string()))?;

        info!("Created user {}", created.id);
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User> {
        let builder = self
            .request(Method::PATCH)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(changes);

        self.rows::<User>(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NotFound(format!("User {id} not found")))
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<User>> {
        let builder = self
            .request(Method::PATCH)
            .query(&consume_filter(id, token_hash, now))
            .header("Prefer", "return=representation")
            .json(&UserChanges::password_reset(password_hash));

        Ok(self.rows::<User>(builder).await?.into_iter().next())
    }
}

/// Row filter for a conditional password reset. A concurrent reset that
/// already cleared the token matches nothing.
pub fn consume_filter(id: Uuid, token_hash: &str, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![
        ("id", format!("eq.{id}")),
        ("reset_token", format!("eq.{token_hash}")),
        ("reset_token_expires", format!("gt.{}", now.to_rfc3339_opts(SecondsFormat::Secs, true))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let repo = SupabaseUserRepository::new(&SupabaseConfig {
            url: "https://abc.supabase.co/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(repo.table_url, "https://abc.supabase.co/rest/v1/users");
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"code":"23505","details":"Key (email)=(a@b.c) already exists.","hint":null,"message":"duplicate key value violates unique constraint \"users_email_key\""}"#;
        assert_eq!(
            error_message(body).unwrap(),
            "duplicate key value violates unique constraint \"users_email_key\": Key (email)=(a@b.c) already exists."
        );
        assert_eq!(error_message(r#"{"message":"JWT expired"}"#).unwrap(), "JWT expired");
        assert!(error_message("").is_none());
    }

    #[test]
    fn test_consume_filter() {
        let id = Uuid::parse_str("2b1c3f6e-3f43-4a4e-9a53-0c8c2f6b6d11").unwrap();
        let now = DateTime::parse_from_rfc3339("2025-01-01T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            consume_filter(id, "abc123", now),
            vec![
                ("id", "eq.2b1c3f6e-3f43-4a4e-9a53-0c8c2f6b6d11".to_string()),
                ("reset_token", "eq.abc123".to_string()),
                ("reset_token_expires", "gt.2025-01-01T10:00:00Z".to_string()),
            ]
        );
    }

    #[test]
    fn test_user_row_deserialization() {
        let row = r#"{"id":"2b1c3f6e-3f43-4a4e-9a53-0c8c2f6b6d11","email":"ada@example.com",
            "password_hash":"$2b$12$abc","currency":"EUR","reset_token":null,
            "reset_token_expires":"2025-01-01T10:00:00+00:00","created_at":"2024-12-01T09:00:00.123456+00:00"}"#;
        let user: User = serde_json::from_str(row).unwrap();
        assert_eq!(user.currency.as_deref(), Some("EUR"));
        assert!(user.reset_token.is_none());
        assert!(user.reset_token_expires.is_some());
    }
}
