//! Conversational context
//!
//! Per-user state outside the wizard: which free-text answer the bot is
//! waiting for, the catalog filter, and the ids of messages the bot keeps
//! on screen. Everything is handed to handlers through [`AppContext`].

use teloxide::types::MessageId;

use super::session::SessionStore;
use super::storage::{MemoryStore, StorageStats};
use super::wizard::WizardEngine;
use crate::config::Settings;
use crate::database::DatabaseService;
use crate::middleware::{AdminGuard, Throttle};
use crate::models::{BroadcastSegment, ListingField, RequestKind};
use crate::services::{CatalogFilter, ChannelPostDraft, ServiceFactory};

/// A free-text answer the bot is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dialog {
    /// Arrival date from the welcome screen.
    EntryDate,
    /// Stay dates for a listing.
    StayDates { listing_id: i64 },
    /// A user answering an operator reply.
    ReplyToAdmin,
    /// Operator reply to a request.
    AdminReply {
        kind: RequestKind,
        request_id: i64,
        user_id: i64,
    },
    /// Operator typing a promo code for a requester.
    ManualPromo {
        kind: RequestKind,
        request_id: i64,
        user_id: i64,
    },
    EditListingField { listing_id: i64, field: ListingField },
    AddPromoCode,
    BulkPromoCodes,
    BroadcastText { segment: BroadcastSegment },
    /// Text entered, waiting for the confirm button.
    BroadcastConfirm { segment: BroadcastSegment, text: String },
    /// New URL for the channel's catalog button.
    CatalogLink,
    /// Custom channel post being assembled.
    ChannelPost(ChannelPostDraft),
}

impl Dialog {
    pub fn name(&self) -> &'static str {
        match self {
            Dialog::EntryDate => "entry_date",
            Dialog::StayDates { .. } => "stay_dates",
            Dialog::ReplyToAdmin => "reply_to_admin",
            Dialog::AdminReply { .. } => "admin_reply",
            Dialog::ManualPromo { .. } => "manual_promo",
            Dialog::EditListingField { .. } => "edit_listing_field",
            Dialog::AddPromoCode => "add_promo_code",
            Dialog::BulkPromoCodes => "bulk_promo_codes",
            Dialog::BroadcastText { .. } => "broadcast_text",
            Dialog::BroadcastConfirm { .. } => "broadcast_confirm",
            Dialog::CatalogLink => "catalog_link",
            Dialog::ChannelPost(_) => "channel_post",
        }
    }

    /// Dialogs only operators can be in.
    pub fn is_admin_only(&self) -> bool {
        !matches!(
            self,
            Dialog::EntryDate | Dialog::StayDates { .. } | Dialog::ReplyToAdmin
        )
    }
}

/// Message ids the bot keeps track of for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayState {
    /// The welcome message; never deleted.
    pub anchor: Option<MessageId>,
    /// The current menu or card.
    pub main: Option<MessageId>,
    /// The live wizard prompt.
    pub prompt: Option<MessageId>,
}

/// Bookkeeping so each user sees one main screen and one wizard prompt.
#[derive(Debug, Clone)]
pub struct DisplayTracker {
    states: MemoryStore<DisplayState>,
}

impl Default for DisplayTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayTracker {
    pub fn new() -> Self {
        Self {
            states: MemoryStore::new("display"),
        }
    }

    pub fn get(&self, user_id: i64) -> DisplayState {
        self.states.get(user_id).unwrap_or_default()
    }

    pub fn set_anchor(&self, user_id: i64, message_id: MessageId) {
        self.states.upsert_with(user_id, |state| state.anchor = Some(message_id));
    }

    /// Record a new main screen. Returns the previous one if it should be
    /// deleted; the anchor is never returned.
    pub fn replace_main(&self, user_id: i64, message_id: MessageId) -> Option<MessageId> {
        self.states.upsert_with(user_id, |state| {
            let previous = state.main.replace(message_id);
            previous.filter(|old| Some(*old) != state.anchor && *old != message_id)
        })
    }

    /// Record a new wizard prompt, returning the one it supersedes.
    pub fn replace_prompt(&self, user_id: i64, message_id: MessageId) -> Option<MessageId> {
        self.states.upsert_with(user_id, |state| {
            state.prompt.replace(message_id).filter(|old| *old != message_id)
        })
    }

    pub fn take_prompt(&self, user_id: i64) -> Option<MessageId> {
        self.states
            .modify(user_id, |state| state.prompt.take())
            .flatten()
    }

    pub fn stats(&self) -> StorageStats {
        self.states.stats()
    }
}

/// Per-user pending free-text dialogs
pub type DialogStore = MemoryStore<Dialog>;
/// Per-user catalog filters
pub type FilterStore = MemoryStore<CatalogFilter>;

/// Everything a handler needs, shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub db: DatabaseService,
    pub services: ServiceFactory,
    pub wizard: WizardEngine,
    pub dialogs: DialogStore,
    pub filters: FilterStore,
    pub display: DisplayTracker,
    pub throttle: Throttle,
    pub admin: AdminGuard,
    /// Used to build referral links.
    pub bot_username: String,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        db: DatabaseService,
        services: ServiceFactory,
        bot_username: String,
    ) -> Self {
        Self {
            wizard: WizardEngine::new(SessionStore::new()),
            dialogs: MemoryStore::new("dialogs"),
            filters: MemoryStore::new("catalog_filters"),
            display: DisplayTracker::new(),
            throttle: Throttle::from_config(&settings.throttle),
            admin: AdminGuard::new(&settings),
            settings,
            db,
            services,
            bot_username,
        }
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin.is_admin(user_id)
    }

    pub fn filter_for(&self, user_id: i64) -> CatalogFilter {
        self.filters.get(user_id).unwrap_or_default()
    }

    /// Sizes of every in-memory store, for diagnostics.
    pub fn storage_stats(&self) -> Vec<StorageStats> {
        vec![
            self.wizard.sessions().stats(),
            self.dialogs.stats(),
            self.filters.stats(),
            self.display.stats(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_main_never_returns_anchor() {
        let display = DisplayTracker::new();
        assert_eq!(display.replace_main(1, MessageId(10)), None);
        assert_eq!(display.replace_main(1, MessageId(11)), Some(MessageId(10)));

        display.set_anchor(1, MessageId(20));
        display.replace_main(1, MessageId(20));
        assert_eq!(display.replace_main(1, MessageId(21)), None);
        assert_eq!(display.get(1).anchor, Some(MessageId(20)));
    }

    #[test]
    fn test_prompt_tracking() {
        let display = DisplayTracker::new();
        assert_eq!(display.replace_prompt(2, MessageId(1)), None);
        assert_eq!(display.replace_prompt(2, MessageId(2)), Some(MessageId(1)));
        assert_eq!(display.take_prompt(2), Some(MessageId(2)));
        assert_eq!(display.take_prompt(2), None);
        assert_eq!(display.take_prompt(3), None);
    }

    #[test]
    fn test_dialog_scope() {
        assert!(!Dialog::EntryDate.is_admin_only());
        assert!(!Dialog::StayDates { listing_id: 1 }.is_admin_only());
        assert!(Dialog::AddPromoCode.is_admin_only());
        assert!(Dialog::BroadcastText {
            segment: BroadcastSegment::All
        }
        .is_admin_only());
        assert!(Dialog::CatalogLink.is_admin_only());
        assert!(Dialog::ChannelPost(ChannelPostDraft::new()).is_admin_only());
        assert_eq!(Dialog::ChannelPost(ChannelPostDraft::new()).name(), "channel_post");
    }
}
