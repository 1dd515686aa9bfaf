//! Database module
//!
//! Pool management, schema bootstrap, repositories and the service facade
//! handlers talk to.

pub mod connection;
pub mod schema;
pub mod stores;
pub mod repositories;
pub mod service;

// Re-export commonly used database components
pub use connection::{create_pool, health_check, DatabaseConfig, DatabasePool};
pub use schema::ensure_schema;
pub use stores::{ListingStore, PromoStore};
pub use repositories::{
    EngagementRepository, ListingRepository, ListingSearch, PromoRepository, RequestRepository,
    UserRepository,
};
pub use service::DatabaseService;
