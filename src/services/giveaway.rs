//! Giveaway draw

use rand::seq::SliceRandom;
use teloxide::utils::html;
use tracing::{info, warn};

use crate::database::DatabaseService;
use crate::models::{GiveawayEntry, PromoKind, User};
use crate::services::notification::NotificationRelay;
use crate::utils::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawOutcome {
    NoParticipants,
    NoCodes,
    Winner {
        user_id: i64,
        code: String,
        notified: bool,
    },
}

/// Pick one participant uniformly at random.
pub fn pick_winner(candidates: &[GiveawayEntry]) -> Option<&GiveawayEntry> {
    candidates.choose(&mut rand::thread_rng())
}

/// Public name of the winner for the channel, HTML-escaped. Falls back to
/// the id when the user has neither a name nor a username.
pub fn winner_label(user: Option<&User>, user_id: i64) -> String {
    let name = user.and_then(|u| {
        let full_name = u.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        let username = u.username.as_deref().map(str::trim).filter(|n| !n.is_empty());
        full_name
            .map(str::to_string)
            .or_else(|| username.map(|n| format!("@{}", n)))
    });
    match name {
        Some(name) => html::escape(&name),
        None => format!("id {}", user_id),
    }
}

#[derive(Debug, Clone)]
pub struct GiveawayService {
    db: DatabaseService,
    relay: NotificationRelay,
}

impl GiveawayService {
    pub fn new(db: DatabaseService, relay: NotificationRelay) -> Self {
        Self { db, relay }
    }

    /// Enter `user_id`. Returns false when already entered.
    pub async fn join(&self, user_id: i64) -> Result<bool> {
        self.db.engagement.join_giveaway(user_id).await
    }

    /// Draw a winner among participants who have not won yet.
    pub async fn draw(&self) -> Result<DrawOutcome> {
        let candidates = self.db.engagement.giveaway_candidates().await?;
        let Some(entry) = pick_winner(&candidates) else {
            return Ok(DrawOutcome::NoParticipants);
        };
        if !self.db.promos.has_free(PromoKind::Giveaway).await? {
            return Ok(DrawOutcome::NoCodes);
        }
        let Some(code) = self.db.promos.claim_free(PromoKind::Giveaway, entry.user_id).await? else {
            return Ok(DrawOutcome::NoCodes);
        };

        self.db.engagement.mark_giveaway_winner(entry.id, &code).await?;

        let text = format!(
            "🎉 You won the giveaway! Your code: <b>{}</b>",
            html::escape(&code)
        );
        let notified = self.relay.send_to_user(entry.user_id, &text).await;
        if !notified {
            warn!(user_id = entry.user_id, "Giveaway winner is unreachable");
            self.db.users.mark_blocked(&[entry.user_id]).await?;
        }

        let winner = self
            .db
            .users
            .find_by_telegram_id(entry.user_id)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id = entry.user_id, error = %e, "Could not load the winner's profile");
                None
            });
        self.relay
            .announce(&format!(
                "🎁 Giveaway results: the winner is {}. Congratulations!",
                winner_label(winner.as_ref(), entry.user_id)
            ))
            .await;

        info!(user_id = entry.user_id, notified = notified, "Giveaway winner drawn");
        Ok(DrawOutcome::Winner {
            user_id: entry.user_id,
            code,
            notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(id: i64) -> GiveawayEntry {
        GiveawayEntry {
            id,
            user_id: 100 + id,
            is_winner: false,
            winner_code: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pick_winner() {
        assert!(pick_winner(&[]).is_none());
        let entries: Vec<GiveawayEntry> = (1..=5).map(entry).collect();
        for _ in 0..20 {
            let winner = pick_winner(&entries).expect("winner");
            assert!(entries.iter().any(|e| e.id == winner.id));
        }
    }

    fn user(full_name: Option<&str>, username: Option<&str>) -> User {
        User {
            id: 1,
            telegram_id: 555,
            username: username.map(str::to_string),
            full_name: full_name.map(str::to_string),
            phone: None,
            ref_code: None,
            inviter_id: None,
            is_blocked: false,
            reminders_opt_out: false,
            created_at: Utc::now(),
            last_seen_at: Utc::now(),
            last_reminder_at: None,
        }
    }

    #[test]
    fn test_winner_label_prefers_name_then_username() {
        let named = user(Some("Anna <K>"), Some("anna"));
        assert_eq!(winner_label(Some(&named), 555), "Anna &lt;K&gt;");

        let handle_only = user(Some("  "), Some("anna"));
        assert_eq!(winner_label(Some(&handle_only), 555), "@anna");

        let anonymous = user(None, None);
        assert_eq!(winner_label(Some(&anonymous), 555), "id 555");
        assert_eq!(winner_label(None, 777), "id 777");
    }
}
