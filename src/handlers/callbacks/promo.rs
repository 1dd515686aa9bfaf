//! Promo codes, cabinet, giveaway and reminder opt-out

use teloxide::utils::html;
use tracing::debug;

use super::action::CallbackAction;
use crate::handlers::display::Screen;
use crate::handlers::{keyboards, track_event};
use crate::models::engagement::event_types;
use crate::services::promo::WelcomeClaim;
use crate::services::user::referral_link;
use crate::utils::errors::Result;
use crate::utils::helpers::format_timestamp;
use crate::utils::logging::log_user_action;

const GIVEAWAY_TEXT: &str = "🎉 <b>Giveaway</b>\n\n\
    Every month we draw a free night among our guests. \
    Join once and you stay in the draw until you win.";

const GIVEAWAY_RULES: &str = "📜 <b>Giveaway rules</b>\n\n\
    1. One entry per person.\n\
    2. The winner is picked at random among participants who have not won yet.\n\
    3. The winner gets a promo code in this chat.\n\
    4. The result may be announced in our channel.";

pub(super) async fn handle(screen: &Screen<'_>, action: CallbackAction) -> Result<()> {
    let ctx = screen.ctx;
    let user_id = screen.user_id;
    let back = || keyboards::back_to(CallbackAction::PromoMenu);

    match action {
        CallbackAction::PromoMenu => {
            screen
                .show(
                    "🎁 <b>Promo codes</b>\n\nGet a welcome discount, invite friends or check your codes.",
                    keyboards::promo_menu(),
                )
                .await
        }
        CallbackAction::PromoWelcome => {
            if !ctx.throttle.check(user_id, "promo_welcome") {
                return Ok(());
            }
            let text = match ctx.services.promo_service.claim_welcome(user_id).await? {
                WelcomeClaim::Issued(code) => {
                    track_event(
                        ctx,
                        user_id,
                        event_types::PROMO_WELCOME,
                        serde_json::json!({ "code": code }),
                    )
                    .await;
                    format!(
                        "🎁 Your welcome code: <code>{}</code>\n\nMention it to the manager when booking.",
                        html::escape(&code)
                    )
                }
                WelcomeClaim::AlreadyReceived => {
                    "You already have a welcome code. Find it under “My codes”.".to_string()
                }
                WelcomeClaim::PoolEmpty => {
                    "Welcome codes have run out for now. Please check back later.".to_string()
                }
            };
            screen.show(&text, back()).await
        }
        CallbackAction::PromoReferral => {
            let text = match ctx.services.user_service.get(user_id).await? {
                Some(user) => match user.ref_code.as_deref() {
                    Some(code) => format!(
                        "🔗 <b>Your referral link</b>\n\n{}\n\n\
                         When a friend opens it and looks at an apartment, you get a bonus code.",
                        html::escape(&referral_link(&ctx.bot_username, code))
                    ),
                    None => "Your referral link is not ready yet. Send /start and try again.".to_string(),
                },
                None => "Send /start first to get your referral link.".to_string(),
            };
            screen.show(&text, back()).await
        }
        CallbackAction::PromoMine => {
            let codes = ctx.db.promos.list_for_user(user_id).await?;
            let text = if codes.is_empty() {
                "📦 You have no promo codes yet.".to_string()
            } else {
                let lines: Vec<String> = codes
                    .iter()
                    .map(|code| {
                        let date = code
                            .assigned_at
                            .map(format_timestamp)
                            .unwrap_or_default();
                        format!("• <code>{}</code> · {} {}", html::escape(&code.code), code.kind, date)
                    })
                    .collect();
                format!("📦 <b>My codes</b>\n\n{}", lines.join("\n"))
            };
            screen.show(&text, back()).await
        }
        CallbackAction::Cabinet => {
            let summary = ctx.services.user_service.cabinet(user_id).await?;
            let phone = ctx
                .services
                .user_service
                .get(user_id)
                .await?
                .and_then(|user| user.phone)
                .unwrap_or_else(|| "not shared".to_string());
            let text = format!(
                "👤 <b>My cabinet</b>\n\n\
                 📞 Phone: {}\n\
                 👥 Friends invited: {}\n\
                 ✅ Friends qualified: {}\n\
                 🎁 Promo codes: {}",
                html::escape(&phone),
                summary.invited,
                summary.qualified,
                summary.codes
            );
            screen.show(&text, keyboards::cabinet()).await
        }
        CallbackAction::GiveawayMenu => screen.show(GIVEAWAY_TEXT, keyboards::giveaway()).await,
        CallbackAction::GiveawayRules => {
            screen.show(GIVEAWAY_RULES, keyboards::giveaway_rules()).await
        }
        CallbackAction::GiveawayJoin => {
            if !ctx.throttle.check(user_id, "giveaway_join") {
                return Ok(());
            }
            let text = if ctx.services.giveaway_service.join(user_id).await? {
                track_event(ctx, user_id, event_types::GIVEAWAY_JOIN, serde_json::json!({})).await;
                log_user_action(user_id, "giveaway_join", None);
                "🍀 You are in the giveaway. Good luck!"
            } else {
                "You are already taking part in the giveaway."
            };
            screen.show(text, keyboards::back_to(CallbackAction::GiveawayMenu)).await
        }
        CallbackAction::RemindersOff => {
            ctx.services.user_service.opt_out_of_reminders(user_id).await?;
            log_user_action(user_id, "reminders_off", None);
            screen
                .show("🔕 Reminders are off. You can still open the menu any time.", keyboards::home_only())
                .await
        }
        other => {
            debug!(action = ?other, "Not a promo action");
            Ok(())
        }
    }
}
