//! Listing wizard buttons
//!
//! Text and uploads reach the engine through the message handler; both
//! paths render the engine's reply with [`render_reply`].

use super::action::WizardAction;
use crate::handlers::display::{clear_prompt, Screen};
use crate::handlers::keyboards;
use crate::state::{CommitOutcome, StepInput, StepPrompt, WizardReply};
use crate::utils::errors::Result;
use crate::utils::logging::log_admin_action;

pub(super) async fn handle(screen: &Screen<'_>, action: WizardAction) -> Result<()> {
    let ctx = screen.ctx;
    let user_id = screen.user_id;

    match action {
        WizardAction::Pick(value) => {
            let reply = ctx.wizard.submit(user_id, StepInput::Choice(value))?;
            render_reply(screen, reply).await
        }
        WizardAction::MediaDone => {
            let reply = ctx.wizard.submit(user_id, StepInput::MediaDone)?;
            render_reply(screen, reply).await
        }
        WizardAction::Restart => {
            let prompt = ctx.wizard.restart(user_id, &ctx.db.listings).await?;
            send_step(screen, &prompt).await
        }
        WizardAction::Commit => {
            // On failure the session stays in preview and the error reaches the user
            let outcome = ctx.wizard.commit(user_id, &ctx.db.listings).await?;
            clear_prompt(screen.bot, ctx, screen.chat_id).await;

            let (verb, listing_id) = match outcome {
                CommitOutcome::Created { listing_id } => ("created", listing_id),
                CommitOutcome::Updated { listing_id } => ("updated", listing_id),
            };
            log_admin_action(user_id, "listing_commit", Some(&listing_id.to_string()), Some(verb));
            screen
                .replace(
                    &format!("✅ Listing #{} {}.", listing_id, verb),
                    keyboards::admin_menu(),
                )
                .await
        }
        WizardAction::Cancel => {
            ctx.wizard.cancel(user_id);
            clear_prompt(screen.bot, ctx, screen.chat_id).await;
            screen
                .replace("❌ Wizard cancelled.", keyboards::admin_menu())
                .await
        }
    }
}

pub async fn send_step(screen: &Screen<'_>, prompt: &StepPrompt) -> Result<()> {
    screen
        .prompt(&prompt.render(), keyboards::wizard_step(prompt))
        .await
}

/// Show whatever the engine answered.
pub async fn render_reply(screen: &Screen<'_>, reply: WizardReply) -> Result<()> {
    match reply {
        WizardReply::Prompt(prompt) => send_step(screen, &prompt).await,
        WizardReply::MediaAdded { added, prompt } => {
            let text = format!("✅ Added: {}\n\n{}", added, prompt.render());
            screen.prompt(&text, keyboards::wizard_step(&prompt)).await
        }
        WizardReply::Rejected { reason, prompt } => {
            let text = format!("⚠️ {}\n\n{}", reason.message(), prompt.render());
            screen.prompt(&text, keyboards::wizard_step(&prompt)).await
        }
        WizardReply::Ignored => Ok(()),
        WizardReply::Preview(summary) => {
            screen
                .prompt(&summary.render(), keyboards::wizard_preview())
                .await
        }
    }
}
