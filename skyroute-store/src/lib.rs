pub mod app_config;
pub mod duffel;
pub mod memory_repo;
pub mod supabase;
pub mod unsplash;

pub use app_config::Config;
pub use duffel::DuffelClient;
pub use memory_repo::InMemoryUserRepository;
pub use supabase::SupabaseUserRepository;
pub use unsplash::UnsplashClient;
