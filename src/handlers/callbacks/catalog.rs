//! Catalog, filters, listing cards and booking buttons

use teloxide::utils::html;
use tracing::debug;

use super::action::CallbackAction;
use crate::handlers::display::{listing_card_text, send_main, send_main_media, Screen};
use crate::handlers::{keyboards, qualify_referral, track_event};
use crate::models::engagement::{booking_click_source, event_types, CLICK_SOURCE_CARD};
use crate::models::Listing;
use crate::services::catalog::{CatalogFilter, CatalogPage, FILTER_TAGS};
use crate::state::Dialog;
use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::helpers::create_pagination_info;

pub use crate::services::channel::CAPTION_LIMIT;

const BOOKING_TEXT: &str =
    "📅 <b>Booking</b>\n\nOpen the booking page to pick dates and confirm your stay.";

pub(super) async fn handle(screen: &Screen<'_>, action: CallbackAction) -> Result<()> {
    let ctx = screen.ctx;
    let user_id = screen.user_id;

    match action {
        CallbackAction::Catalog { page } => {
            if !ctx.throttle.check(user_id, "catalog") {
                return Ok(());
            }
            show_catalog(screen, page).await
        }
        CallbackAction::FilterOpen => show_filters(screen).await,
        CallbackAction::FilterGuests(bucket) => {
            ctx.filters.upsert_with(user_id, |filter| filter.toggle_guests(bucket));
            show_filters(screen).await
        }
        CallbackAction::FilterTag(tag) => {
            if FILTER_TAGS.contains(&tag.as_str()) {
                ctx.filters.upsert_with(user_id, |filter| filter.toggle_tag(&tag));
            }
            show_filters(screen).await
        }
        CallbackAction::FilterReset => {
            ctx.filters.upsert_with(user_id, CatalogFilter::reset);
            show_filters(screen).await
        }
        CallbackAction::FilterApply => show_catalog(screen, 1).await,
        CallbackAction::ListingCard { listing_id, page } => show_card(screen, listing_id, page).await,
        CallbackAction::ListingMedia {
            listing_id,
            index,
            page,
        } => show_media(screen, listing_id, index, page).await,
        CallbackAction::BookListing { listing_id } => {
            if !ctx.throttle.check(user_id, "book") {
                return Ok(());
            }
            ctx.db
                .engagement
                .log_click(user_id, Some(listing_id), CLICK_SOURCE_CARD)
                .await?;
            qualify_referral(ctx, user_id).await;
            screen
                .show(
                    BOOKING_TEXT,
                    keyboards::booking(
                        &ctx.settings.storefront.booking_url,
                        CallbackAction::ListingCard { listing_id, page: 1 },
                    ),
                )
                .await
        }
        CallbackAction::Booking { source } => {
            if !ctx.throttle.check(user_id, "book") {
                return Ok(());
            }
            ctx.db
                .engagement
                .log_click(user_id, None, &booking_click_source(&source))
                .await?;
            qualify_referral(ctx, user_id).await;
            screen
                .show(
                    BOOKING_TEXT,
                    keyboards::booking(&ctx.settings.storefront.booking_url, CallbackAction::Home),
                )
                .await
        }
        CallbackAction::StayDates { listing_id } => {
            let listing = active_listing(screen, listing_id).await?;
            ctx.dialogs.insert(user_id, Dialog::StayDates { listing_id });
            let text = format!(
                "🗓 <b>{}</b>\n\nWrite the dates you have in mind and the number of guests, \
                 e.g. <i>12-15 June, 2 guests</i>. The manager will get back to you.",
                html::escape(&listing.title)
            );
            screen
                .show(&text, keyboards::back_to(CallbackAction::ListingCard { listing_id, page: 1 }))
                .await
        }
        other => {
            debug!(action = ?other, "Not a catalog action");
            Ok(())
        }
    }
}

pub fn catalog_text(page: &CatalogPage, filter: &CatalogFilter) -> String {
    let mut text = String::from("🏙 <b>Catalog</b>\n\n");
    if !filter.is_empty() {
        text.push_str(&html::escape(&filter.describe()));
        text.push_str("\n\n");
    }

    if page.listings.is_empty() {
        text.push_str("Nothing here yet. Try other filters or an earlier page.");
        return text;
    }

    text.push_str(&create_pagination_info(page.page, page.total_pages, page.total));
    text.push('\n');
    for listing in &page.listings {
        text.push_str(&format!(
            "\n• <b>{}</b> · 👥 up to {}",
            html::escape(&listing.title),
            listing.guests_max
        ));
        if !listing.address_short.is_empty() {
            text.push_str(&format!(" · 📍 {}", html::escape(&listing.address_short)));
        }
    }
    text
}

pub async fn show_catalog(screen: &Screen<'_>, page: u32) -> Result<()> {
    let filter = screen.ctx.filter_for(screen.user_id);
    let page = screen.ctx.services.catalog_service.page(&filter, page).await?;
    screen
        .show(&catalog_text(&page, &filter), keyboards::catalog(&page))
        .await
}

async fn show_filters(screen: &Screen<'_>) -> Result<()> {
    let filter = screen.ctx.filter_for(screen.user_id);
    let text = format!("⚙️ <b>Filters</b>\n\n{}", html::escape(&filter.describe()));
    screen.show(&text, keyboards::filters(&filter)).await
}

async fn active_listing(screen: &Screen<'_>, listing_id: i64) -> Result<Listing> {
    match screen.ctx.db.listings.find_by_id(listing_id).await? {
        Some(listing) if listing.is_active => Ok(listing),
        _ => Err(StayBuddyError::ListingNotFound { listing_id }),
    }
}

async fn show_card(screen: &Screen<'_>, listing_id: i64, page: u32) -> Result<()> {
    let ctx = screen.ctx;
    let listing = active_listing(screen, listing_id).await?;
    track_event(
        ctx,
        screen.user_id,
        event_types::VIEW_LISTING,
        serde_json::json!({ "listing_id": listing_id }),
    )
    .await;
    qualify_referral(ctx, screen.user_id).await;

    let text = listing_card_text(&listing);
    let media = listing.media();
    let fits_caption = text.chars().count() <= CAPTION_LIMIT;
    let with_gallery = media.len() > 1 || (!media.is_empty() && !fits_caption);
    let keyboard = keyboards::listing_card(&listing, page, with_gallery);

    match media.first() {
        Some(primary) if fits_caption => {
            send_main_media(screen.bot, ctx, screen.chat_id, primary, &text, keyboard).await?;
        }
        _ => {
            send_main(screen.bot, ctx, screen.chat_id, &text, keyboard).await?;
        }
    }
    Ok(())
}

async fn show_media(screen: &Screen<'_>, listing_id: i64, index: usize, page: u32) -> Result<()> {
    let listing = active_listing(screen, listing_id).await?;
    let media = listing.media();
    if media.is_empty() {
        return show_card(screen, listing_id, page).await;
    }

    let index = index.min(media.len() - 1);
    let caption = format!(
        "📷 {}/{} · <b>{}</b>",
        index + 1,
        media.len(),
        html::escape(listing.header())
    );
    send_main_media(
        screen.bot,
        screen.ctx,
        screen.chat_id,
        &media[index],
        &caption,
        keyboards::media_carousel(listing_id, index, media.len(), page),
    )
    .await?;
    Ok(())
}
