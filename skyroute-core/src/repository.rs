use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::search::{FlightSearchParams, OfferPage, OfferQuery, OfferRequest};
use crate::user::{NewUser, User, UserChanges};
use crate::CoreResult;

/// Hosted flight-offers API
#[async_trait]
pub trait OfferProvider: Send + Sync {
    /// Open an offer request without waiting for offers; they are polled separately.
    async fn create_offer_request(&self, params: &FlightSearchParams) -> CoreResult<OfferRequest>;

    /// One page of offers for a previously created request.
    async fn list_offers(&self, query: &OfferQuery) -> CoreResult<OfferPage>;

    /// Cheapest authenticated call, used to check credentials and reachability.
    async fn ping(&self) -> CoreResult<serde_json::Value>;
}

/// Repository trait for user records held by the hosted database
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> CoreResult<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> CoreResult<Option<User>>;

    /// Lookup by the stored SHA-256 of a reset token.
    async fn find_by_reset_token(&self, token_hash: &str) -> CoreResult<Option<User>>;

    async fn create(&self, user: &NewUser) -> CoreResult<User>;

    async fn update(&self, id: Uuid, changes: &UserChanges) -> CoreResult<User>;

    /// Set a new password only while `token_hash` is still the user's unexpired
    /// reset token, clearing it in the same write. `None` when it no longer is.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<User>>;
}

/// Photo-download attribution ping required by the image API's terms.
#[async_trait]
pub trait DownloadTracker: Send + Sync {
    async fn track_download(&self, download_location: &str) -> CoreResult<()>;
}
