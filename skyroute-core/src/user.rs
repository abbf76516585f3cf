use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skyroute_shared::Masked;
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// A row of the hosted `users` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Masked<String>,
    #[serde(default)]
    pub currency: Option<String>,
    /// SHA-256 hex of the outstanding reset token, never the raw token.
    #[serde(default)]
    pub reset_token: Option<String>,
    #[serde(default)]
    pub reset_token_expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn reset_token_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.reset_token.is_some() && self.reset_token_expires.is_some_and(|expires| expires > now)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password_hash: Masked<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// Partial update. `None` leaves a column alone; `Some(None)` writes NULL.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<Masked<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token_expires: Option<Option<DateTime<Utc>>>,
}

impl UserChanges {
    pub fn reset_requested(token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            reset_token: Some(Some(token_hash)),
            reset_token_expires: Some(Some(expires_at)),
            ..Default::default()
        }
    }

    /// New password; the consumed token is cleared in the same write.
    pub fn password_reset(password_hash: String) -> Self {
        Self {
            password_hash: Some(Masked::new(password_hash)),
            reset_token: Some(None),
            reset_token_expires: Some(None),
            ..Default::default()
        }
    }

    pub fn currency(currency: String) -> Self {
        Self {
            currency: Some(currency),
            ..Default::default()
        }
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(hash) = &self.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(currency) = &self.currency {
            user.currency = Some(currency.clone());
        }
        if let Some(token) = &self.reset_token {
            user.reset_token = token.clone();
        }
        if let Some(expires) = &self.reset_token_expires {
            user.reset_token_expires = *expires;
        }
    }
}

/// What the account endpoints expose about a user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub currency: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            currency: user.currency.clone(),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// ISO 4217-shaped: three ASCII letters, stored upper-case.
pub fn normalize_currency(currency: &str) -> CoreResult<String> {
    let currency = currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!("Invalid currency code: {currency}")));
    }
    Ok(currency.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".into(),
            password_hash: Masked::from("$2b$04$hash"),
            currency: None,
            reset_token: None,
            reset_token_expires: None,
            created_at: None,
        }
    }

    #[test]
    fn test_reset_token_validity() {
        let now = Utc::now();
        let mut u = user();
        assert!(!u.reset_token_valid_at(now));

        UserChanges::reset_requested("abc".into(), now + Duration::minutes(30)).apply_to(&mut u);
        assert!(u.reset_token_valid_at(now));
        assert!(!u.reset_token_valid_at(now + Duration::hours(1)));
    }

    #[test]
    fn test_password_reset_clears_token() {
        let mut u = user();
        UserChanges::reset_requested("abc".into(), Utc::now()).apply_to(&mut u);
        UserChanges::password_reset("$2b$04$new".into()).apply_to(&mut u);

        assert_eq!(u.password_hash.expose(), "$2b$04$new");
        assert!(u.reset_token.is_none());
        assert!(u.reset_token_expires.is_none());
    }

    #[test]
    fn test_changes_serialize_nulls_only_when_clearing() {
        let json = serde_json::to_value(UserChanges::password_reset("h".into())).unwrap();
        assert_eq!(json["password_hash"], "h");
        assert!(json["reset_token"].is_null());
        assert!(json.as_object().unwrap().contains_key("reset_token"));
        assert!(!json.as_object().unwrap().contains_key("currency"));

        let json = serde_json::to_value(UserChanges::currency("EUR".into())).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_currency_normalization() {
        assert_eq!(normalize_currency(" eur ").unwrap(), "EUR");
        assert!(normalize_currency("EURO").is_err());
        assert!(normalize_currency("U$D").is_err());
    }

    #[test]
    fn test_profile_hides_hash() {
        let json = serde_json::to_value(UserProfile::from(&user())).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }
}
