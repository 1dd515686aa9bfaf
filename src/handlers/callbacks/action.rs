//! Callback data
//!
//! Inline buttons carry a short `:`-separated string. [`CallbackAction`] is
//! the typed form; keyboards encode it and the dispatcher parses it back.
//! Telegram limits callback data to 64 bytes, so codes stay short.

use crate::models::{BroadcastSegment, ListingField, RequestKind};
use crate::services::GuestBucket;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    Pick(String),
    MediaDone,
    Commit,
    Restart,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminAction {
    Menu,
    Listings,
    ListingOpen(i64),
    ListingToggle(i64),
    ListingField { listing_id: i64, field: ListingField },
    ListingAdd,
    ListingWizard(i64),
    ListingPostPreview(i64),
    ListingPublish(i64),
    Codes,
    CodeAdd,
    CodeBulk,
    CodeList,
    Giveaway,
    Draw,
    Stats,
    Broadcast,
    BroadcastSegment(BroadcastSegment),
    BroadcastSend,
    Requests(RequestKind),
    RequestOpen { kind: RequestKind, request_id: i64 },
    RequestReply { kind: RequestKind, request_id: i64 },
    RequestPromo { kind: RequestKind, request_id: i64 },
    RequestPromoPick { kind: RequestKind, request_id: i64, code_id: i64 },
    RequestPromoManual { kind: RequestKind, request_id: i64 },
    RequestDone { kind: RequestKind, request_id: i64 },
    Channel,
    ChannelPublish,
    /// Pinned quick-booking post.
    ChannelPin,
    /// Post carrying only the catalog button.
    ChannelCatalog,
    ChannelCatalogLink,
    ChannelPost,
    ChannelPostDone,
    ChannelPostPublish,
    ChannelPostCancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Home,
    StartMenu,
    EntryDate,
    Catalog { page: u32 },
    FilterOpen,
    FilterGuests(GuestBucket),
    FilterTag(String),
    FilterReset,
    FilterApply,
    ListingCard { listing_id: i64, page: u32 },
    ListingMedia { listing_id: i64, index: usize, page: u32 },
    BookListing { listing_id: i64 },
    Booking { source: String },
    StayDates { listing_id: i64 },
    PromoMenu,
    PromoWelcome,
    PromoReferral,
    PromoMine,
    Cabinet,
    GiveawayMenu,
    GiveawayRules,
    GiveawayJoin,
    Rules,
    RemindersOff,
    ReplyToAdmin,
    Noop,
    Wizard(WizardAction),
    Admin(AdminAction),
}

impl CallbackAction {
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Home => "home".to_string(),
            CallbackAction::StartMenu => "start:menu".to_string(),
            CallbackAction::EntryDate => "start:date".to_string(),
            CallbackAction::Catalog { page } => format!("catalog:{}", page),
            CallbackAction::FilterOpen => "flt:open".to_string(),
            CallbackAction::FilterGuests(bucket) => format!("flt:g:{}", bucket.code()),
            CallbackAction::FilterTag(tag) => format!("flt:t:{}", tag),
            CallbackAction::FilterReset => "flt:reset".to_string(),
            CallbackAction::FilterApply => "flt:apply".to_string(),
            CallbackAction::ListingCard { listing_id, page } => format!("apt:{}:{}", listing_id, page),
            CallbackAction::ListingMedia { listing_id, index, page } => {
                format!("aptmedia:{}:{}:{}", listing_id, index, page)
            }
            CallbackAction::BookListing { listing_id } => format!("book:{}", listing_id),
            CallbackAction::Booking { source } => format!("booking:{}", source),
            CallbackAction::StayDates { listing_id } => format!("dates:{}", listing_id),
            CallbackAction::PromoMenu => "promo:menu".to_string(),
            CallbackAction::PromoWelcome => "promo:welcome".to_string(),
            CallbackAction::PromoReferral => "promo:ref".to_string(),
            CallbackAction::PromoMine => "promo:mine".to_string(),
            CallbackAction::Cabinet => "cabinet".to_string(),
            CallbackAction::GiveawayMenu => "giveaway:menu".to_string(),
            CallbackAction::GiveawayRules => "giveaway:rules".to_string(),
            CallbackAction::GiveawayJoin => "giveaway:join".to_string(),
            CallbackAction::Rules => "rules".to_string(),
            CallbackAction::RemindersOff => "rem:off".to_string(),
            CallbackAction::ReplyToAdmin => "reply_admin".to_string(),
            CallbackAction::Noop => "noop".to_string(),
            CallbackAction::Wizard(action) => match action {
                WizardAction::Pick(value) => format!("wz:pick:{}", value),
                WizardAction::MediaDone => "wz:media_done".to_string(),
                WizardAction::Commit => "wz:commit".to_string(),
                WizardAction::Restart => "wz:restart".to_string(),
                WizardAction::Cancel => "wz:cancel".to_string(),
            },
            CallbackAction::Admin(action) => format!("adm:{}", encode_admin(action)),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let (head, rest) = match data.split_once(':') {
            Some((head, rest)) => (head, Some(rest)),
            None => (data, None),
        };

        let action = match (head, rest) {
            ("home", None) => CallbackAction::Home,
            ("start", Some("menu")) => CallbackAction::StartMenu,
            ("start", Some("date")) => CallbackAction::EntryDate,
            ("catalog", Some(page)) => CallbackAction::Catalog { page: page.parse().ok()? },
            ("flt", Some(rest)) => match rest.split_once(':') {
                Some(("g", code)) => CallbackAction::FilterGuests(GuestBucket::parse(code)?),
                Some(("t", tag)) if !tag.is_empty() => CallbackAction::FilterTag(tag.to_string()),
                None if rest == "open" => CallbackAction::FilterOpen,
                None if rest == "reset" => CallbackAction::FilterReset,
                None if rest == "apply" => CallbackAction::FilterApply,
                _ => return None,
            },
            ("apt", Some(rest)) => {
                let (id, page) = rest.split_once(':')?;
                CallbackAction::ListingCard {
                    listing_id: id.parse().ok()?,
                    page: page.parse().ok()?,
                }
            }
            ("aptmedia", Some(rest)) => {
                let parts: Vec<&str> = rest.split(':').collect();
                let [id, index, page] = parts.as_slice() else {
                    return None;
                };
                CallbackAction::ListingMedia {
                    listing_id: id.parse().ok()?,
                    index: index.parse().ok()?,
                    page: page.parse().ok()?,
                }
            }
            ("book", Some(id)) => CallbackAction::BookListing { listing_id: id.parse().ok()? },
            ("booking", Some(source)) if !source.is_empty() => CallbackAction::Booking {
                source: source.to_string(),
            },
            ("dates", Some(id)) => CallbackAction::StayDates { listing_id: id.parse().ok()? },
            ("promo", Some("menu")) => CallbackAction::PromoMenu,
            ("promo", Some("welcome")) => CallbackAction::PromoWelcome,
            ("promo", Some("ref")) => CallbackAction::PromoReferral,
            ("promo", Some("mine")) => CallbackAction::PromoMine,
            ("cabinet", None) => CallbackAction::Cabinet,
            ("giveaway", Some("menu")) => CallbackAction::GiveawayMenu,
            ("giveaway", Some("rules")) => CallbackAction::GiveawayRules,
            ("giveaway", Some("join")) => CallbackAction::GiveawayJoin,
            ("rules", None) => CallbackAction::Rules,
            ("rem", Some("off")) => CallbackAction::RemindersOff,
            ("reply_admin", None) => CallbackAction::ReplyToAdmin,
            ("noop", None) => CallbackAction::Noop,
            ("wz", Some(rest)) => CallbackAction::Wizard(match rest {
                "media_done" => WizardAction::MediaDone,
                "commit" => WizardAction::Commit,
                "restart" => WizardAction::Restart,
                "cancel" => WizardAction::Cancel,
                other => WizardAction::Pick(other.strip_prefix("pick:")?.to_string()),
            }),
            ("adm", Some(rest)) => CallbackAction::Admin(parse_admin(rest)?),
            _ => return None,
        };
        Some(action)
    }
}

fn encode_admin(action: &AdminAction) -> String {
    match action {
        AdminAction::Menu => "menu".to_string(),
        AdminAction::Listings => "apts".to_string(),
        AdminAction::ListingOpen(id) => format!("apt:{}", id),
        AdminAction::ListingToggle(id) => format!("apt_toggle:{}", id),
        AdminAction::ListingField { listing_id, field } => {
            format!("apt_field:{}:{}", listing_id, field.code())
        }
        AdminAction::ListingAdd => "apt_add".to_string(),
        AdminAction::ListingWizard(id) => format!("apt_wizard:{}", id),
        AdminAction::ListingPostPreview(id) => format!("apt_post:{}", id),
        AdminAction::ListingPublish(id) => format!("apt_pub:{}", id),
        AdminAction::Codes => "codes".to_string(),
        AdminAction::CodeAdd => "code_add".to_string(),
        AdminAction::CodeBulk => "code_bulk".to_string(),
        AdminAction::CodeList => "code_list".to_string(),
        AdminAction::Giveaway => "giveaway".to_string(),
        AdminAction::Draw => "draw".to_string(),
        AdminAction::Stats => "stats".to_string(),
        AdminAction::Broadcast => "bc".to_string(),
        AdminAction::BroadcastSegment(segment) => format!("bc_seg:{}", segment.code()),
        AdminAction::BroadcastSend => "bc_send".to_string(),
        AdminAction::Requests(kind) => format!("reqs:{}", kind.code()),
        AdminAction::RequestOpen { kind, request_id } => format!("req:{}:{}", kind.code(), request_id),
        AdminAction::RequestReply { kind, request_id } => {
            format!("req_reply:{}:{}", kind.code(), request_id)
        }
        AdminAction::RequestPromo { kind, request_id } => {
            format!("req_promo:{}:{}", kind.code(), request_id)
        }
        AdminAction::RequestPromoPick { kind, request_id, code_id } => {
            format!("req_pick:{}:{}:{}", kind.code(), request_id, code_id)
        }
        AdminAction::RequestPromoManual { kind, request_id } => {
            format!("req_manual:{}:{}", kind.code(), request_id)
        }
        AdminAction::RequestDone { kind, request_id } => {
            format!("req_done:{}:{}", kind.code(), request_id)
        }
        AdminAction::Channel => "channel".to_string(),
        AdminAction::ChannelPublish => "channel_pub".to_string(),
        AdminAction::ChannelPin => "ch_pin".to_string(),
        AdminAction::ChannelCatalog => "ch_cat".to_string(),
        AdminAction::ChannelCatalogLink => "ch_cat_link".to_string(),
        AdminAction::ChannelPost => "cpost".to_string(),
        AdminAction::ChannelPostDone => "cpost_done".to_string(),
        AdminAction::ChannelPostPublish => "cpost_pub".to_string(),
        AdminAction::ChannelPostCancel => "cpost_cancel".to_string(),
    }
}

fn parse_admin(data: &str) -> Option<AdminAction> {
    let parts: Vec<&str> = data.split(':').collect();
    let id = |i: usize| parts.get(i).and_then(|p| p.parse::<i64>().ok());
    let kind = || parts.get(1).and_then(|p| RequestKind::parse(p));

    let action = match parts.as_slice() {
        ["menu"] => AdminAction::Menu,
        ["apts"] => AdminAction::Listings,
        ["apt", _] => AdminAction::ListingOpen(id(1)?),
        ["apt_toggle", _] => AdminAction::ListingToggle(id(1)?),
        ["apt_field", _, field] => AdminAction::ListingField {
            listing_id: id(1)?,
            field: ListingField::parse(field)?,
        },
        ["apt_add"] => AdminAction::ListingAdd,
        ["apt_wizard", _] => AdminAction::ListingWizard(id(1)?),
        ["apt_post", _] => AdminAction::ListingPostPreview(id(1)?),
        ["apt_pub", _] => AdminAction::ListingPublish(id(1)?),
        ["codes"] => AdminAction::Codes,
        ["code_add"] => AdminAction::CodeAdd,
        ["code_bulk"] => AdminAction::CodeBulk,
        ["code_list"] => AdminAction::CodeList,
        ["giveaway"] => AdminAction::Giveaway,
        ["draw"] => AdminAction::Draw,
        ["stats"] => AdminAction::Stats,
        ["bc"] => AdminAction::Broadcast,
        ["bc_seg", code] => AdminAction::BroadcastSegment(BroadcastSegment::parse(code)?),
        ["bc_send"] => AdminAction::BroadcastSend,
        ["reqs", _] => AdminAction::Requests(kind()?),
        ["req", _, _] => AdminAction::RequestOpen { kind: kind()?, request_id: id(2)? },
        ["req_reply", _, _] => AdminAction::RequestReply { kind: kind()?, request_id: id(2)? },
        ["req_promo", _, _] => AdminAction::RequestPromo { kind: kind()?, request_id: id(2)? },
        ["req_pick", _, _, _] => AdminAction::RequestPromoPick {
            kind: kind()?,
            request_id: id(2)?,
            code_id: id(3)?,
        },
        ["req_manual", _, _] => AdminAction::RequestPromoManual { kind: kind()?, request_id: id(2)? },
        ["req_done", _, _] => AdminAction::RequestDone { kind: kind()?, request_id: id(2)? },
        ["channel"] => AdminAction::Channel,
        ["channel_pub"] => AdminAction::ChannelPublish,
        ["ch_pin"] => AdminAction::ChannelPin,
        ["ch_cat"] => AdminAction::ChannelCatalog,
        ["ch_cat_link"] => AdminAction::ChannelCatalogLink,
        ["cpost"] => AdminAction::ChannelPost,
        ["cpost_done"] => AdminAction::ChannelPostDone,
        ["cpost_pub"] => AdminAction::ChannelPostPublish,
        ["cpost_cancel"] => AdminAction::ChannelPostCancel,
        _ => return None,
    };
    Some(action)
}
