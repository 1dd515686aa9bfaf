//! Inline keyboards
//!
//! Every button the bot shows is built here from a [`CallbackAction`].
//! URL buttons whose link does not parse are dropped rather than failing
//! the whole message.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use super::callbacks::action::{AdminAction, CallbackAction, WizardAction};
use crate::models::{BroadcastSegment, GuestRequest, Listing, ListingField, PromoCode, RequestKind};
use crate::services::catalog::{CatalogFilter, CatalogPage, GuestBucket, FILTER_TAGS};
use crate::state::steps::{StepKind, CUSTOM_CHOICE};
use crate::state::wizard::StepPrompt;

pub fn button(text: impl Into<String>, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.encode())
}

fn admin_button(text: impl Into<String>, action: AdminAction) -> InlineKeyboardButton {
    button(text, CallbackAction::Admin(action))
}

/// A link button, or `None` when `link` is not a valid URL.
pub fn url_button(text: impl Into<String>, link: &str) -> Option<InlineKeyboardButton> {
    Url::parse(link.trim())
        .ok()
        .map(|url| InlineKeyboardButton::url(text, url))
}

fn back_row(target: CallbackAction) -> Vec<InlineKeyboardButton> {
    vec![button("⬅️ Back", target), button("🏠 Menu", CallbackAction::Home)]
}

pub fn main_menu(is_admin: bool) -> InlineKeyboardMarkup {
    let mut rows = vec![
        vec![button("🏙 Catalog", CallbackAction::Catalog { page: 1 })],
        vec![
            button("📅 Book", CallbackAction::Booking { source: "menu".to_string() }),
            button("📘 Rules", CallbackAction::Rules),
        ],
        vec![
            button("🎁 Promo codes", CallbackAction::PromoMenu),
            button("🎉 Giveaway", CallbackAction::GiveawayMenu),
        ],
        vec![button("👤 My cabinet", CallbackAction::Cabinet)],
    ];
    if is_admin {
        rows.push(vec![admin_button("🛠 Admin", AdminAction::Menu)]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn welcome() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🏠 Open menu", CallbackAction::StartMenu)],
        vec![button("🗓 Ask for an entry date", CallbackAction::EntryDate)],
    ])
}

pub fn home_only() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🏠 Menu", CallbackAction::Home)]])
}

pub fn back_to(target: CallbackAction) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![back_row(target)])
}

pub fn catalog(page: &CatalogPage) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = page
        .listings
        .iter()
        .map(|listing| {
            vec![button(
                format!("🏙 {}", listing.title),
                CallbackAction::ListingCard {
                    listing_id: listing.id,
                    page: page.page,
                },
            )]
        })
        .collect();

    let mut nav = Vec::new();
    if page.has_previous() {
        nav.push(button("◀️", CallbackAction::Catalog { page: page.page - 1 }));
    }
    nav.push(button(
        format!("Page {}/{}", page.page, page.total_pages),
        CallbackAction::Noop,
    ));
    if page.has_next() {
        nav.push(button("▶️", CallbackAction::Catalog { page: page.page + 1 }));
    }
    rows.push(nav);
    rows.push(vec![
        button("⚙️ Filters", CallbackAction::FilterOpen),
        button("📅 Book", CallbackAction::Booking { source: "catalog".to_string() }),
    ]);
    rows.push(vec![button("🏠 Menu", CallbackAction::Home)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn filters(filter: &CatalogFilter) -> InlineKeyboardMarkup {
    let mark = |selected: bool| if selected { "✅ " } else { "" };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = vec![GuestBucket::ALL
        .into_iter()
        .map(|bucket| {
            button(
                format!("{}{}", mark(filter.guests == Some(bucket)), bucket.label()),
                CallbackAction::FilterGuests(bucket),
            )
        })
        .collect()];

    for pair in FILTER_TAGS.chunks(2) {
        rows.push(
            pair.iter()
                .map(|tag| {
                    let selected = filter.tags.contains(*tag);
                    button(
                        format!("{} {}", if selected { "✅" } else { "🏷" }, tag),
                        CallbackAction::FilterTag(tag.to_string()),
                    )
                })
                .collect(),
        );
    }
    rows.push(vec![
        button("✅ Apply", CallbackAction::FilterApply),
        button("♻️ Reset", CallbackAction::FilterReset),
    ]);
    rows.push(back_row(CallbackAction::Catalog { page: 1 }));
    InlineKeyboardMarkup::new(rows)
}

/// `with_gallery` adds the media carousel entry.
pub fn listing_card(listing: &Listing, page: u32, with_gallery: bool) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if with_gallery {
        rows.push(vec![button(
            "🖼 Photos",
            CallbackAction::ListingMedia {
                listing_id: listing.id,
                index: 0,
                page,
            },
        )]);
    }

    let links: Vec<InlineKeyboardButton> = [
        url_button("🗺 Map", &listing.map_url),
        url_button("📣 Channel post", &listing.channel_post_url),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty() {
        rows.push(links);
    }

    rows.push(vec![
        button(
            "📅 Book",
            CallbackAction::BookListing {
                listing_id: listing.id,
            },
        ),
        button(
            "🤔 Not sure about dates",
            CallbackAction::StayDates {
                listing_id: listing.id,
            },
        ),
    ]);
    rows.push(back_row(CallbackAction::Catalog { page }));
    InlineKeyboardMarkup::new(rows)
}

pub fn media_carousel(listing_id: i64, index: usize, total: usize, page: u32) -> InlineKeyboardMarkup {
    let mut nav = Vec::new();
    if index > 0 {
        nav.push(button(
            "◀️",
            CallbackAction::ListingMedia {
                listing_id,
                index: index - 1,
                page,
            },
        ));
    }
    nav.push(button(format!("{}/{}", index + 1, total), CallbackAction::Noop));
    if index + 1 < total {
        nav.push(button(
            "▶️",
            CallbackAction::ListingMedia {
                listing_id,
                index: index + 1,
                page,
            },
        ));
    }
    InlineKeyboardMarkup::new(vec![
        nav,
        back_row(CallbackAction::ListingCard { listing_id, page }),
    ])
}

pub fn booking(booking_url: &str, back: CallbackAction) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if let Some(open) = url_button("📅 Open booking", booking_url) {
        rows.push(vec![open]);
    }
    rows.push(back_row(back));
    InlineKeyboardMarkup::new(rows)
}

pub fn promo_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🎁 Get welcome code", CallbackAction::PromoWelcome)],
        vec![button("🔗 Referral link", CallbackAction::PromoReferral)],
        vec![button("📦 My codes", CallbackAction::PromoMine)],
        vec![button("🏠 Menu", CallbackAction::Home)],
    ])
}

pub fn giveaway() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📜 Rules and entry", CallbackAction::GiveawayRules)],
        vec![button("🏠 Menu", CallbackAction::Home)],
    ])
}

pub fn giveaway_rules() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("✅ I agree, count me in", CallbackAction::GiveawayJoin)],
        back_row(CallbackAction::GiveawayMenu),
    ])
}

pub fn cabinet() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("📦 My codes", CallbackAction::PromoMine)],
        vec![button("🏠 Menu", CallbackAction::Home)],
    ])
}

pub fn reminder_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("🏙 Open catalog", CallbackAction::Catalog { page: 1 })],
        vec![button("🔕 Stop reminders", CallbackAction::RemindersOff)],
        vec![button("🏠 Menu", CallbackAction::Home)],
    ])
}

pub fn reply_to_admin() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("✍️ Reply", CallbackAction::ReplyToAdmin)]])
}

/// Buttons under the notification an operator gets for a new request.
pub fn request_notification(kind: RequestKind, request_id: i64) -> InlineKeyboardMarkup {
    let mut row = vec![admin_button("✍️ Reply", AdminAction::RequestReply { kind, request_id })];
    if kind == RequestKind::Dates {
        row.push(admin_button("🎁 Send promo", AdminAction::RequestPromo { kind, request_id }));
    }
    row.push(admin_button("✅ Done", AdminAction::RequestDone { kind, request_id }));
    InlineKeyboardMarkup::new(vec![row])
}

// Wizard

pub fn wizard_step(prompt: &StepPrompt) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    if !prompt.awaiting_custom {
        match prompt.step.kind {
            StepKind::MediaCollection => rows.push(vec![button(
                "✅ Done with media",
                CallbackAction::Wizard(WizardAction::MediaDone),
            )]),
            StepKind::SingleChoice { choices, .. } => {
                for choice in choices {
                    rows.push(vec![button(
                        choice.label,
                        CallbackAction::Wizard(WizardAction::Pick(choice.value.to_string())),
                    )]);
                }
                rows.push(vec![button(
                    "✏️ Custom",
                    CallbackAction::Wizard(WizardAction::Pick(CUSTOM_CHOICE.to_string())),
                )]);
            }
            StepKind::FreeText | StepKind::Integer | StepKind::Url => {}
        }
    }
    rows.push(vec![button("❌ Cancel", CallbackAction::Wizard(WizardAction::Cancel))]);
    InlineKeyboardMarkup::new(rows)
}

pub fn wizard_preview() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![button("💾 Save", CallbackAction::Wizard(WizardAction::Commit))],
        vec![button("🔄 Start over", CallbackAction::Wizard(WizardAction::Restart))],
        vec![button("❌ Cancel", CallbackAction::Wizard(WizardAction::Cancel))],
    ])
}

// Admin

pub fn admin_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            admin_button("🏙 Listings", AdminAction::Listings),
            admin_button("🎟 Promo codes", AdminAction::Codes),
        ],
        vec![
            admin_button("📅 Date requests", AdminAction::Requests(RequestKind::Dates)),
            admin_button("🗓 Entry dates", AdminAction::Requests(RequestKind::EntryDate)),
        ],
        vec![
            admin_button("🎉 Giveaway", AdminAction::Giveaway),
            admin_button("📊 Stats", AdminAction::Stats),
        ],
        vec![
            admin_button("📣 Broadcast", AdminAction::Broadcast),
            admin_button("📢 Channel buttons", AdminAction::Channel),
        ],
        vec![button("🏠 Menu", CallbackAction::Home)],
    ])
}

fn back_to_admin() -> Vec<InlineKeyboardButton> {
    vec![admin_button("⬅️ Admin", AdminAction::Menu)]
}

pub fn admin_listings(listings: &[Listing]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = listings
        .iter()
        .map(|listing| {
            let status = if listing.is_active { "🟢" } else { "⚪️" };
            vec![admin_button(
                format!("{} #{} {}", status, listing.id, listing.title),
                AdminAction::ListingOpen(listing.id),
            )]
        })
        .collect();
    rows.push(vec![admin_button("➕ Add listing", AdminAction::ListingAdd)]);
    rows.push(back_to_admin());
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_listing(listing: &Listing) -> InlineKeyboardMarkup {
    let id = listing.id;
    let toggle = if listing.is_active { "⏸ Hide" } else { "▶️ Show" };
    let mut rows = vec![
        vec![
            admin_button("🧙 Edit with wizard", AdminAction::ListingWizard(id)),
            admin_button(toggle, AdminAction::ListingToggle(id)),
        ],
        vec![admin_button("👁 Post preview", AdminAction::ListingPostPreview(id))],
    ];
    for pair in ListingField::ALL.chunks(2) {
        rows.push(
            pair.iter()
                .map(|&field| {
                    admin_button(
                        format!("✏️ {}", field.label()),
                        AdminAction::ListingField { listing_id: id, field },
                    )
                })
                .collect(),
        );
    }
    rows.push(vec![admin_button("⬅️ Listings", AdminAction::Listings)]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_post_preview(listing_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("📢 Publish", AdminAction::ListingPublish(listing_id))],
        vec![admin_button("⬅️ Back", AdminAction::ListingOpen(listing_id))],
    ])
}

/// Buttons under a published listing post.
pub fn listing_post(map_url: &str, bot_username: &str, manager_link: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();
    let mut top = Vec::new();
    if let Some(map) = url_button("🗺 Map", map_url) {
        top.push(map);
    }
    if let Some(bot) = url_button("🤖 Open bot", &format!("https://t.me/{}", bot_username)) {
        top.push(bot);
    }
    if !top.is_empty() {
        rows.push(top);
    }
    if let Some(manager) = manager_link.and_then(|link| url_button("💬 Manager", link)) {
        rows.push(vec![manager]);
    }
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_codes() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("➕ Add one", AdminAction::CodeAdd)],
        vec![admin_button("📥 Bulk upload", AdminAction::CodeBulk)],
        vec![admin_button("📋 Pool summary", AdminAction::CodeList)],
        back_to_admin(),
    ])
}

pub fn admin_giveaway() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("🎲 Draw a winner", AdminAction::Draw)],
        back_to_admin(),
    ])
}

pub fn admin_broadcast_segments() -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = BroadcastSegment::ALL
        .into_iter()
        .map(|segment| vec![admin_button(segment.label(), AdminAction::BroadcastSegment(segment))])
        .collect();
    rows.push(back_to_admin());
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_broadcast_confirm() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("🚀 Send", AdminAction::BroadcastSend)],
        vec![admin_button("❌ Cancel", AdminAction::Menu)],
    ])
}

pub fn admin_requests(kind: RequestKind, requests: &[GuestRequest]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = requests
        .iter()
        .map(|request| {
            let status = if request.is_handled() { "✅" } else { "🆕" };
            vec![admin_button(
                format!("{} #{} {}", status, request.id, request.requester()),
                AdminAction::RequestOpen {
                    kind,
                    request_id: request.id,
                },
            )]
        })
        .collect();
    rows.push(back_to_admin());
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_request(kind: RequestKind, request_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            admin_button("✍️ Reply", AdminAction::RequestReply { kind, request_id }),
            admin_button("🎁 Send promo", AdminAction::RequestPromo { kind, request_id }),
        ],
        vec![admin_button("✅ Done", AdminAction::RequestDone { kind, request_id })],
        vec![admin_button("⬅️ Requests", AdminAction::Requests(kind))],
    ])
}

pub fn admin_promo_pick(kind: RequestKind, request_id: i64, codes: &[PromoCode]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = codes
        .iter()
        .map(|code| {
            vec![admin_button(
                code.code.clone(),
                AdminAction::RequestPromoPick {
                    kind,
                    request_id,
                    code_id: code.id,
                },
            )]
        })
        .collect();
    rows.push(vec![admin_button(
        "⌨️ Type a code",
        AdminAction::RequestPromoManual { kind, request_id },
    )]);
    rows.push(vec![admin_button("⬅️ Back", AdminAction::RequestOpen { kind, request_id })]);
    InlineKeyboardMarkup::new(rows)
}

pub fn admin_channel() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("📢 Publish buttons", AdminAction::ChannelPublish)],
        vec![admin_button("📌 Pinned booking post", AdminAction::ChannelPin)],
        vec![admin_button("🏙 Catalog button post", AdminAction::ChannelCatalog)],
        vec![admin_button("🔗 Update catalog link", AdminAction::ChannelCatalogLink)],
        vec![admin_button("📝 Custom post", AdminAction::ChannelPost)],
        back_to_admin(),
    ])
}

pub fn channel_post_media() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("✅ Done", AdminAction::ChannelPostDone)],
        vec![admin_button("❌ Cancel", AdminAction::ChannelPostCancel)],
    ])
}

pub fn channel_post_preview() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![admin_button("🚀 Publish", AdminAction::ChannelPostPublish)],
        vec![admin_button("❌ Cancel", AdminAction::ChannelPostCancel)],
    ])
}

/// Single link button for a channel post; empty when the link is invalid.
pub fn channel_link(text: &str, link: &str) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(url_button(text, link).map(|button| vec![vec![button]]).unwrap_or_default())
}

/// Buttons under an operator-built channel post.
pub fn channel_post_buttons(
    bot_username: &str,
    booking_url: &str,
    manager_link: Option<&str>,
    whatsapp_link: Option<&str>,
) -> InlineKeyboardMarkup {
    let top: Vec<InlineKeyboardButton> = [
        url_button("🏙 Apartments", &format!("https://t.me/{}", bot_username)),
        url_button("📅 Book", booking_url),
    ]
    .into_iter()
    .flatten()
    .collect();
    let bottom: Vec<InlineKeyboardButton> = [
        manager_link.and_then(|link| url_button("💬 Manager", link)),
        whatsapp_link.and_then(|link| url_button("🟢 WhatsApp", link)),
    ]
    .into_iter()
    .flatten()
    .collect();
    InlineKeyboardMarkup::new([top, bottom].into_iter().filter(|row| !row.is_empty()))
}

/// Booking and catalog buttons pinned in the channel.
pub fn channel_buttons(booking_url: &str, catalog_url: &str) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = [
        url_button("📅 Book", booking_url),
        url_button("🏙 Catalog", catalog_url),
    ]
    .into_iter()
    .flatten()
    .map(|button| vec![button])
    .collect();
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    fn callback_data(markup: &InlineKeyboardMarkup) -> Vec<String> {
        markup
            .inline_keyboard
            .iter()
            .flatten()
            .filter_map(|button| match &button.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_main_menu_admin_entry() {
        let admin_data = "adm:menu".to_string();
        assert!(!callback_data(&main_menu(false)).contains(&admin_data));
        assert!(callback_data(&main_menu(true)).contains(&admin_data));
    }

    #[test]
    fn test_invalid_urls_are_dropped() {
        assert!(url_button("x", "not a url").is_none());
        assert!(url_button("x", "").is_none());
        assert!(url_button("x", "https://book.example").is_some());
        assert!(channel_buttons("https://book.example", "").inline_keyboard.len() == 1);
        assert!(channel_link("Book", "nope").inline_keyboard.is_empty());
    }

    #[test]
    fn test_channel_post_buttons_rows() {
        let full = channel_post_buttons(
            "stay_bot",
            "https://book.example",
            Some("tg://user?id=42"),
            Some("https://wa.me/15551234567"),
        );
        let texts: Vec<Vec<&str>> = full
            .inline_keyboard
            .iter()
            .map(|row| row.iter().map(|b| b.text.as_str()).collect())
            .collect();
        assert_eq!(
            texts,
            vec![vec!["🏙 Apartments", "📅 Book"], vec!["💬 Manager", "🟢 WhatsApp"]]
        );

        let bare = channel_post_buttons("stay_bot", "", None, None);
        assert_eq!(bare.inline_keyboard.len(), 1);
        assert_eq!(bare.inline_keyboard[0].len(), 1);
    }

    #[test]
    fn test_every_callback_parses() {
        let filter = CatalogFilter::default();
        let markups = [
            main_menu(true),
            welcome(),
            filters(&filter),
            reminder_keyboard(),
            wizard_preview(),
            admin_menu(),
            admin_codes(),
            admin_channel(),
            channel_post_media(),
            channel_post_preview(),
            admin_broadcast_segments(),
            admin_request(RequestKind::Dates, 5),
            request_notification(RequestKind::EntryDate, 6),
            media_carousel(1, 1, 3, 2),
        ];
        for markup in &markups {
            for data in callback_data(markup) {
                assert!(CallbackAction::parse(&data).is_some(), "unparsable: {}", data);
            }
        }
    }
}
