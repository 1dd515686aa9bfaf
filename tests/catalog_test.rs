//! Catalog filtering and paging

mod helpers;

use helpers::*;
use proptest::prelude::*;
use StayBuddy::models::Listing;
use StayBuddy::services::catalog::filter_page;
use StayBuddy::services::{CatalogFilter, GuestBucket};
use StayBuddy::utils::helpers::total_pages;

const TAGS: [&str; 4] = ["parking", "quiet", "Sea", "pets"];

fn arb_listing(id: i64) -> impl Strategy<Value = Listing> {
    (1..8i32, proptest::sample::subsequence(TAGS.to_vec(), 0..=3), any::<bool>(), 0..3i32).prop_map(
        move |(guests, tags, active, sort_order)| {
            let mut listing = listing(id, guests, &tags);
            listing.is_active = active;
            listing.sort_order = sort_order;
            listing
        },
    )
}

fn arb_catalog() -> impl Strategy<Value = Vec<Listing>> {
    (0..25usize).prop_flat_map(|n| (1..=n as i64).map(arb_listing).collect::<Vec<_>>())
}

/// Guest bucket and lowercase tags a filter is built from.
fn arb_filter_input() -> impl Strategy<Value = (Option<GuestBucket>, Vec<&'static str>)> {
    (
        proptest::option::of(proptest::sample::select(GuestBucket::ALL.to_vec())),
        proptest::sample::subsequence(vec!["parking", "sea", "pets"], 0..=2),
    )
}

fn build_filter(guests: Option<GuestBucket>, tags: &[&str]) -> CatalogFilter {
    let mut filter = CatalogFilter { guests, ..Default::default() };
    for tag in tags {
        filter.toggle_tag(tag);
    }
    filter
}

/// Visibility written out from the catalog rules: active, enough beds for
/// the bucket, and any selected tag present ignoring case.
fn visible(listing: &Listing, guests: Option<GuestBucket>, tags: &[&str]) -> bool {
    let min_guests = match guests {
        None => 0,
        Some(GuestBucket::UpToTwo) => 2,
        Some(GuestBucket::UpToFour) => 4,
        Some(GuestBucket::FivePlus) => 5,
    };
    listing.is_active
        && listing.guests_max >= min_guests
        && (tags.is_empty()
            || listing
                .tags
                .iter()
                .any(|tag| tags.iter().any(|wanted| tag.eq_ignore_ascii_case(wanted))))
}

proptest! {
    #[test]
    fn pages_cover_matching_listings_once(
        catalog in arb_catalog(),
        (guests, tags) in arb_filter_input(),
        page_size in 1..6u32,
    ) {
        let filter = build_filter(guests, &tags);
        let (_, total) = filter_page(&catalog, &filter, 1, page_size);
        let expected = catalog.iter().filter(|l| visible(l, guests, &tags)).count() as i64;
        prop_assert_eq!(total, expected);

        let mut seen = Vec::new();
        for page in 1..=total_pages(total, page_size) {
            let (items, page_total) = filter_page(&catalog, &filter, page, page_size);
            prop_assert_eq!(page_total, total);
            prop_assert!(items.len() <= page_size as usize);
            for item in &items {
                prop_assert!(visible(item, guests, &tags));
            }
            seen.extend(items.into_iter().map(|l| (l.sort_order, l.id)));
        }

        prop_assert_eq!(seen.len() as i64, total);
        prop_assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_guest_bucket_is_a_lower_bound() {
    let catalog = vec![listing(1, 2, &[]), listing(2, 4, &[]), listing(3, 6, &[])];
    let filter = CatalogFilter {
        guests: Some(GuestBucket::UpToFour),
        ..Default::default()
    };

    let (items, total) = filter_page(&catalog, &filter, 1, 10);
    assert_eq!(total, 2);
    assert_eq!(items.iter().map(|l| l.id).collect::<Vec<_>>(), vec![2, 3]);
}

#[test]
fn test_tags_match_any_case_insensitively() {
    let catalog = vec![listing(1, 2, &["Sea"]), listing(2, 2, &["parking"]), listing(3, 2, &[])];
    let mut filter = CatalogFilter::default();
    filter.toggle_tag("sea");
    filter.toggle_tag("PARKING");

    let (items, total) = filter_page(&catalog, &filter, 1, 10);
    assert_eq!(total, 2);
    assert_eq!(items.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1, 2]);
}

#[test]
fn test_page_past_the_end_is_empty() {
    let catalog = vec![listing(1, 2, &[]), listing(2, 2, &[])];
    let (items, total) = filter_page(&catalog, &CatalogFilter::default(), 3, 1);
    assert!(items.is_empty());
    assert_eq!(total, 2);
}
