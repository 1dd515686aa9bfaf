//! In-memory store implementations

use std::sync::Mutex;

use chrono::Utc;
use sqlx::types::Json;
use StayBuddy::database::{ListingStore, PromoStore};
use StayBuddy::models::{Listing, ListingDraft, PromoKind};
use StayBuddy::{Result, StayBuddyError};

/// Listings kept in a vector, ids assigned from 1.
#[derive(Default)]
pub struct MemoryListings {
    pub rows: Mutex<Vec<Listing>>,
}

impl MemoryListings {
    pub fn get(&self, listing_id: i64) -> Option<Listing> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.id == listing_id)
            .cloned()
    }
}

fn apply_draft(listing: &mut Listing, draft: &ListingDraft) {
    listing.title = draft.title.clone();
    listing.address_short = draft.address_short.clone();
    listing.guests_max = draft.guests_max;
    listing.amenities = draft.amenities.clone();
    listing.tags = draft.tags.clone();
    listing.map_url = draft.map_url.clone();
    listing.details_json = Json(draft.details.clone());
    listing.media_urls = draft.media_urls.clone();
    listing.updated_at = Utc::now();
}

impl ListingStore for MemoryListings {
    async fn insert_listing(&self, draft: &ListingDraft) -> Result<i64> {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        let mut listing = super::listing(id, draft.guests_max, &[]);
        apply_draft(&mut listing, draft);
        rows.push(listing);
        Ok(id)
    }

    async fn update_listing(&self, listing_id: i64, draft: &ListingDraft) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let listing = rows
            .iter_mut()
            .find(|l| l.id == listing_id)
            .ok_or(StayBuddyError::ListingNotFound { listing_id })?;
        apply_draft(listing, draft);
        Ok(())
    }

    async fn find_listing(&self, listing_id: i64) -> Result<Option<Listing>> {
        Ok(self.get(listing_id))
    }
}

#[derive(Debug, Clone)]
pub struct MemoryCode {
    pub code: String,
    pub kind: PromoKind,
    pub assigned_to: Option<i64>,
}

/// Promo pool in insertion order.
#[derive(Default)]
pub struct MemoryPromos {
    pub codes: Mutex<Vec<MemoryCode>>,
}

impl MemoryPromos {
    pub fn with_codes(kind: PromoKind, codes: &[&str]) -> Self {
        let pool = Self::default();
        pool.codes.lock().unwrap().extend(codes.iter().map(|code| MemoryCode {
            code: code.to_string(),
            kind,
            assigned_to: None,
        }));
        pool
    }

    pub fn free_count(&self, kind: PromoKind) -> usize {
        self.codes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.kind == kind && c.assigned_to.is_none())
            .count()
    }
}

impl PromoStore for MemoryPromos {
    async fn has_code_of_kind(&self, user_id: i64, kind: PromoKind) -> Result<bool> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .iter()
            .any(|c| c.kind == kind && c.assigned_to == Some(user_id)))
    }

    async fn claim_free_code(&self, kind: PromoKind, user_id: i64) -> Result<Option<String>> {
        let mut codes = self.codes.lock().unwrap();
        Ok(codes
            .iter_mut()
            .find(|c| c.kind == kind && c.assigned_to.is_none())
            .map(|c| {
                c.assigned_to = Some(user_id);
                c.code.clone()
            }))
    }
}
