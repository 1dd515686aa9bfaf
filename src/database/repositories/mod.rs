//! Database repositories module
//!
//! One repository per aggregate, each a thin wrapper around the shared pool.

pub mod user;
pub mod listing;
pub mod promo;
pub mod request;
pub mod engagement;

// Re-export repositories
pub use user::UserRepository;
pub use listing::{ListingRepository, ListingSearch};
pub use promo::PromoRepository;
pub use request::RequestRepository;
pub use engagement::EngagementRepository;
