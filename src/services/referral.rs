//! Referral qualification
//!
//! A referral counts once the invited user does something meaningful. The
//! inviter is then rewarded from the `referral_reward` pool and told about it.

use tracing::{debug, info};

use crate::database::DatabaseService;
use crate::models::PromoKind;
use crate::services::notification::NotificationRelay;
use crate::services::promo::PromoService;
use crate::utils::errors::Result;

/// What qualification did for one invited user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualification {
    /// No pending referral, or it was already qualified.
    NotPending,
    /// Strict phone mode and the invited user has not shared a phone yet.
    AwaitingPhone,
    Qualified {
        inviter_id: i64,
        reward: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ReferralService {
    db: DatabaseService,
    promos: PromoService,
    relay: NotificationRelay,
    strict_phone_mode: bool,
}

impl ReferralService {
    pub fn new(db: DatabaseService, relay: NotificationRelay, strict_phone_mode: bool) -> Self {
        Self {
            promos: PromoService::new(db.promos.clone()),
            db,
            relay,
            strict_phone_mode,
        }
    }

    /// Qualify the pending referral of `invitee_id`, if there is one.
    pub async fn maybe_qualify(&self, invitee_id: i64) -> Result<Qualification> {
        if !self.db.engagement.has_pending_referral(invitee_id).await? {
            return Ok(Qualification::NotPending);
        }
        if self.strict_phone_mode && !self.db.users.has_phone(invitee_id).await? {
            debug!(user_id = invitee_id, "Referral waits for a shared phone");
            return Ok(Qualification::AwaitingPhone);
        }

        let Some(referral) = self.db.engagement.qualify_referral(invitee_id).await? else {
            return Ok(Qualification::NotPending);
        };

        let reward = self
            .promos
            .issue(PromoKind::ReferralReward, referral.inviter_id)
            .await?;
        info!(
            inviter_id = referral.inviter_id,
            invitee_id = invitee_id,
            rewarded = reward.is_some(),
            "Referral qualified"
        );

        if let Some(code) = &reward {
            let text = format!(
                "🎉 A friend you invited has joined. Your reward code: <b>{}</b>",
                teloxide::utils::html::escape(code)
            );
            self.relay.send_to_user(referral.inviter_id, &text).await;
        }

        Ok(Qualification::Qualified {
            inviter_id: referral.inviter_id,
            reward,
        })
    }
}
