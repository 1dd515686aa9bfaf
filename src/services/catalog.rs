//! Catalog query service
//!
//! Turns the per-user filter into a listing search and slices the result
//! into fixed-size pages. Pages are 1-based; asking past the end yields an
//! empty page.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::repositories::{ListingRepository, ListingSearch};
use crate::models::Listing;
use crate::utils::errors::Result;
use crate::utils::helpers::{calculate_offset, total_pages};

/// Tags offered as filter toggles.
pub const FILTER_TAGS: &[&str] = &["parking", "quiet", "center", "kids", "pets", "balcony"];

/// Guest-count filter bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuestBucket {
    UpToTwo,
    UpToFour,
    FivePlus,
}

impl GuestBucket {
    pub const ALL: [GuestBucket; 3] = [GuestBucket::UpToTwo, GuestBucket::UpToFour, GuestBucket::FivePlus];

    pub fn code(self) -> &'static str {
        match self {
            GuestBucket::UpToTwo => "1-2",
            GuestBucket::UpToFour => "3-4",
            GuestBucket::FivePlus => "5+",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            GuestBucket::UpToTwo => "Up to 2 guests",
            GuestBucket::UpToFour => "Up to 4 guests",
            GuestBucket::FivePlus => "5+ guests",
        }
    }

    /// Minimum `guests_max` a listing needs to match.
    ///
    /// The labels read as upper bounds but the predicate is a lower bound on
    /// capacity: "Up to 4 guests" matches every listing that fits at least 4.
    /// Kept as is; changing it changes what guests see.
    pub fn min_guests(self) -> i32 {
        match self {
            GuestBucket::UpToTwo => 2,
            GuestBucket::UpToFour => 4,
            GuestBucket::FivePlus => 5,
        }
    }
}

/// A user's catalog filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    pub guests: Option<GuestBucket>,
    /// Lowercase.
    pub tags: BTreeSet<String>,
}

impl CatalogFilter {
    /// Select `bucket`, or clear it when it is already selected.
    pub fn toggle_guests(&mut self, bucket: GuestBucket) {
        self.guests = if self.guests == Some(bucket) { None } else { Some(bucket) };
    }

    pub fn toggle_tag(&mut self, tag: &str) {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            return;
        }
        if !self.tags.remove(&tag) {
            self.tags.insert(tag);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.guests.is_none() && self.tags.is_empty()
    }

    pub fn to_search(&self) -> ListingSearch {
        ListingSearch {
            min_guests: self.guests.map(GuestBucket::min_guests),
            tags: self.tags.iter().cloned().collect(),
        }
    }

    /// Whether `listing` belongs in the filtered catalog.
    pub fn matches(&self, listing: &Listing) -> bool {
        if !listing.is_active {
            return false;
        }
        if let Some(bucket) = self.guests {
            if listing.guests_max < bucket.min_guests() {
                return false;
            }
        }
        self.tags.is_empty()
            || listing
                .tags
                .iter()
                .any(|tag| self.tags.contains(&tag.to_lowercase()))
    }

    pub fn describe(&self) -> String {
        let guests = self.guests.map(GuestBucket::label).unwrap_or("any");
        let tags = if self.tags.is_empty() {
            "none".to_string()
        } else {
            self.tags.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        format!(
            "Current filters:\n• Guests: {}\n• Tags: {}\n\nThe guest filter looks at listing capacity (max guests).",
            guests, tags
        )
    }
}

/// Filter, order and page `listings` in memory with the same rules the
/// database query applies.
pub fn filter_page(listings: &[Listing], filter: &CatalogFilter, page: u32, page_size: u32) -> (Vec<Listing>, i64) {
    let mut matching: Vec<&Listing> = listings.iter().filter(|l| filter.matches(l)).collect();
    matching.sort_by_key(|listing| (listing.sort_order, listing.id));

    let total = matching.len() as i64;
    let offset = calculate_offset(page, page_size) as usize;
    let items = matching
        .into_iter()
        .skip(offset)
        .take(page_size as usize)
        .cloned()
        .collect();
    (items, total)
}

/// One page of the catalog.
#[derive(Debug, Clone)]
pub struct CatalogPage {
    pub listings: Vec<Listing>,
    pub page: u32,
    pub total: i64,
    pub total_pages: u32,
}

impl CatalogPage {
    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    listings: ListingRepository,
    page_size: u32,
}

impl CatalogService {
    pub fn new(listings: ListingRepository, page_size: u32) -> Self {
        Self {
            listings,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub async fn page(&self, filter: &CatalogFilter, page: u32) -> Result<CatalogPage> {
        let page = page.max(1);
        let search = filter.to_search();
        let total = self.listings.count_matching(&search).await?;
        let listings = self
            .listings
            .search(&search, i64::from(self.page_size), calculate_offset(page, self.page_size))
            .await?;

        debug!(page = page, total = total, returned = listings.len(), "Catalog page loaded");
        Ok(CatalogPage {
            listings,
            page,
            total,
            total_pages: total_pages(total, self.page_size),
        })
    }
}
