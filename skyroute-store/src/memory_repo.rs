use async_trait::async_trait;
use chrono::{DateTime, Utc};
use skyroute_core::user::{NewUser, User, UserChanges};
use skyroute_core::{CoreError, CoreResult, UserRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local user store for tests and offline development.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }

    async fn find_where(&self, predicate: impl Fn(&User) -> bool) -> Option<User> {
        self.users.read().await.values().find(|u| predicate(u)).cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>> {
        Ok(self.find_where(|u| u.email == email).await)
    }

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str) -> CoreResult<Option<User>> {
        Ok(self.find_where(|u| u.reset_token.as_deref() == Some(token_hash)).await)
    }

    async fn create(&self, user: &NewUser) -> CoreResult<User> {
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            currency: user.currency.clone(),
            reset_token: None,
            reset_token_expires: None,
            created_at: Some(Utc::now()),
        };
        self.users.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(format!("User {id} not found")))?;
        changes.apply_to(user);
        Ok(user.clone())
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if user.reset_token.as_deref() != Some(token_hash) || !user.reset_token_valid_at(now) {
            return Ok(None);
        }
        UserChanges::password_reset(password_hash).apply_to(user);
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyroute_shared::Masked;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: Masked::from("$2b$04$hash"),
            currency: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(&new_user("grace@example.com")).await.unwrap();

        assert_eq!(repo.len().await, 1);
        assert_eq!(repo.find_by_email("grace@example.com").await.unwrap().unwrap().id, user.id);
        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
        assert!(repo.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_reset_token_lookup_and_update() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(&new_user("linus@example.com")).await.unwrap();

        repo.update(user.id, &UserChanges::reset_requested("tokenhash".into(), Utc::now()))
            .await
            .unwrap();
        assert_eq!(repo.find_by_reset_token("tokenhash").await.unwrap().unwrap().id, user.id);

        repo.update(user.id, &UserChanges::password_reset("$2b$04$new".into())).await.unwrap();
        assert!(repo.find_by_reset_token("tokenhash").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reset_token_consumed_once() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(&new_user("ken@example.com")).await.unwrap();
        let now = Utc::now();
        repo.update(user.id, &UserChanges::reset_requested("tokenhash".into(), now + chrono::Duration::hours(1)))
            .await
            .unwrap();

        assert!(repo.consume_reset_token(user.id, "otherhash", "$2b$04$x".into(), now).await.unwrap().is_none());

        let first = repo.consume_reset_token(user.id, "tokenhash", "$2b$04$first".into(), now).await.unwrap();
        assert_eq!(first.unwrap().password_hash.expose(), "$2b$04$first");

        let second = repo.consume_reset_token(user.id, "tokenhash", "$2b$04$second".into(), now).await.unwrap();
        assert!(second.is_none());
        let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash.expose(), "$2b$04$first");
    }

    #[tokio::test]
    async fn test_expired_reset_token_not_consumed() {
        let repo = InMemoryUserRepository::new();
        let user = repo.create(&new_user("dennis@example.com")).await.unwrap();
        let now = Utc::now();
        repo.update(user.id, &UserChanges::reset_requested("tokenhash".into(), now - chrono::Duration::seconds(1)))
            .await
            .unwrap();

        assert!(repo.consume_reset_token(user.id, "tokenhash", "$2b$04$x".into(), now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_user() {
        let repo = InMemoryUserRepository::new();
        let err = repo.update(Uuid::new_v4(), &UserChanges::currency("USD".into())).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }
}
