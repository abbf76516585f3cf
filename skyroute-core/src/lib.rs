pub mod airport;
pub mod credentials;
pub mod repository;
pub mod search;
pub mod user;

pub use airport::{Airport, AirportDirectory};
pub use repository::{DownloadTracker, OfferProvider, UserRepository};
pub use search::{CabinClass, FlightSearchParams, OfferPage, OfferQuery, PassengerType, SearchStatus};
pub use user::{NewUser, User, UserChanges, UserProfile};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream service error: {0}")]
    UpstreamError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// The bare message, without the variant prefix. This is what clients see.
    pub fn message(&self) -> &str {
        match self {
            CoreError::ValidationError(msg)
            | CoreError::AuthenticationError(msg)
            | CoreError::NotFound(msg)
            | CoreError::UpstreamError(msg)
            | CoreError::InternalError(msg) => msg,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
