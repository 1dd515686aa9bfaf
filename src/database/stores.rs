//! Storage seams used by the pure wizard and promo logic.
//!
//! The PostgreSQL repositories implement these traits; tests provide
//! in-memory implementations.

use std::future::Future;

use crate::models::{Listing, ListingDraft, PromoKind};
use crate::utils::errors::Result;

/// Listing persistence needed by the wizard.
pub trait ListingStore: Send + Sync {
    /// Insert a new active listing and return its id.
    fn insert_listing(&self, draft: &ListingDraft) -> impl Future<Output = Result<i64>> + Send;

    /// Replace the content of an existing listing.
    ///
    /// # Errors
    ///
    /// `ListingNotFound` when no row has `listing_id`.
    fn update_listing(
        &self,
        listing_id: i64,
        draft: &ListingDraft,
    ) -> impl Future<Output = Result<()>> + Send;

    fn find_listing(&self, listing_id: i64) -> impl Future<Output = Result<Option<Listing>>> + Send;
}

/// Promo pool operations needed to hand out codes.
pub trait PromoStore: Send + Sync {
    /// Whether `user_id` already holds a code of `kind`.
    fn has_code_of_kind(
        &self,
        user_id: i64,
        kind: PromoKind,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Atomically assign the lowest-id free code of `kind` to `user_id`.
    /// `None` when the pool is exhausted.
    fn claim_free_code(
        &self,
        kind: PromoKind,
        user_id: i64,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}
