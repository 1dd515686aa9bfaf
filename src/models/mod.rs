//! Data models module
//!
//! This module contains all data structures used throughout the application

pub mod user;
pub mod listing;
pub mod promo;
pub mod request;
pub mod engagement;

// Re-export commonly used models
pub use user::{User, UpsertUserRequest, CabinetSummary};
pub use listing::{Listing, ListingDetails, ListingDraft, ListingField, ListingFieldValue, MediaItem, MediaKind};
pub use promo::{PromoCode, PromoKind, PromoPoolSummary};
pub use request::{GuestRequest, RequestKind};
pub use engagement::{BroadcastSegment, GiveawayEntry, Referral, StatsReport, StatsWindow, TopListing};
