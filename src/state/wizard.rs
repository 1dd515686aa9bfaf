//! Listing wizard engine
//!
//! Drives one linear pass through a step table per session. Input is
//! validated per [`StepKind`]; invalid input never moves the session or
//! touches collected fields. After the last step the session sits in
//! preview until it is committed, restarted or cancelled.
//!
//! The engine knows nothing about Telegram: it returns [`WizardReply`]
//! values that the handlers render.

use std::collections::HashMap;

use teloxide::utils::html;
use tracing::{info, warn};

use super::session::{FieldValue, Session, SessionStore, WizardMode, WizardPhase};
use super::steps::{fields, validate_steps, StepDescriptor, StepKind, CUSTOM_CHOICE, LISTING_STEPS};
use crate::database::stores::ListingStore;
use crate::models::{Listing, ListingDetails, ListingDraft, MediaItem, MediaKind};
use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::helpers::{is_http_url, parse_tags};
use crate::utils::logging::log_wizard_transition;

/// One piece of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepInput {
    Text(String),
    /// An uploaded photo, video or document, already classified.
    Upload(MediaItem),
    /// A button press carrying a choice value.
    Choice(String),
    /// The "done with media" button.
    MediaDone,
}

/// Why input was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyText,
    NotAnInteger,
    NotAUrl,
    NoMediaAccepted,
    ExpectedButton,
    UnexpectedUpload,
}

impl Rejection {
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::EmptyText => "The value must not be empty.",
            Rejection::NotAnInteger => "Please enter a whole number using digits only.",
            Rejection::NotAUrl => "The link must start with http:// or https://",
            Rejection::NoMediaAccepted => {
                "Nothing to add. Send a photo, a video, a file or http(s) links one per line."
            }
            Rejection::ExpectedButton => "Please pick one of the buttons.",
            Rejection::UnexpectedUpload => "This step expects text, not a file.",
        }
    }
}

/// The prompt for a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPrompt {
    pub index: usize,
    pub total: usize,
    pub step: StepDescriptor,
    /// Media collected so far when the step is a media step.
    pub media_count: usize,
    /// The step's custom option was picked and free text is expected.
    pub awaiting_custom: bool,
}

impl StepPrompt {
    pub fn render(&self) -> String {
        let mut text = format!(
            "<b>Step {}/{}</b>\n\nNow enter: <b>{}</b>\n",
            self.index + 1,
            self.total,
            html::escape(self.step.prompt)
        );

        if self.awaiting_custom {
            text.push_str("Type your own value.");
            return text;
        }

        match self.step.kind {
            StepKind::MediaCollection => {
                text.push_str("Send photos and videos right here. Links work too, one per line.\n");
                text.push_str(&format!("Added so far: <b>{}</b>\n\n", self.media_count));
                text.push_str("Press \"Done with media\" when finished.");
            }
            StepKind::SingleChoice { .. } => text.push_str("Pick an option with the buttons."),
            StepKind::FreeText | StepKind::Integer | StepKind::Url => {
                text.push_str("Type the value as text.");
                if let Some(example) = self.step.example {
                    text.push_str(&format!("\nExample: <b>{}</b>", html::escape(example)));
                }
            }
        }
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewLine {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// Deterministic summary of a finished session, in step-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewSummary {
    pub mode: WizardMode,
    pub lines: Vec<PreviewLine>,
    pub media_count: usize,
}

impl PreviewSummary {
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|line| line.key == key)
            .map(|line| line.value.as_str())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.lines.iter().map(|line| line.key).collect()
    }

    pub fn render(&self) -> String {
        let title = match self.mode {
            WizardMode::Create => "🏠 <b>New listing preview</b>".to_string(),
            WizardMode::Edit { listing_id } => format!("🏠 <b>Listing #{} preview</b>", listing_id),
        };
        let body: Vec<String> = self
            .lines
            .iter()
            .map(|line| format!("<b>{}</b>: {}", line.label, html::escape(&line.value)))
            .collect();
        format!("{}\n\n{}", title, body.join("\n"))
    }
}

/// Result of feeding input to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardReply {
    /// Show the prompt for the (possibly new) current step.
    Prompt(StepPrompt),
    /// Media was appended; the media step is still current.
    MediaAdded { added: usize, prompt: StepPrompt },
    /// Input refused; nothing changed.
    Rejected { reason: Rejection, prompt: StepPrompt },
    /// Input does not apply to the current state; nothing changed.
    Ignored,
    Preview(PreviewSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Created { listing_id: i64 },
    Updated { listing_id: i64 },
}

impl CommitOutcome {
    pub fn listing_id(&self) -> i64 {
        match self {
            CommitOutcome::Created { listing_id } | CommitOutcome::Updated { listing_id } => {
                *listing_id
            }
        }
    }
}

/// Listing wizard state machine over a [`SessionStore`]
#[derive(Debug, Clone)]
pub struct WizardEngine {
    sessions: SessionStore,
    steps: &'static [StepDescriptor],
}

impl WizardEngine {
    pub fn new(sessions: SessionStore) -> Self {
        Self {
            sessions,
            steps: LISTING_STEPS,
        }
    }

    /// Engine over a custom step table.
    pub fn with_steps(sessions: SessionStore, steps: &'static [StepDescriptor]) -> Result<Self> {
        validate_steps(steps)?;
        Ok(Self { sessions, steps })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn steps(&self) -> &'static [StepDescriptor] {
        self.steps
    }

    pub fn is_active(&self, user_id: i64) -> bool {
        self.sessions.is_active(user_id)
    }

    /// Start an empty "add listing" run, replacing any session in flight.
    pub fn start_create(&self, user_id: i64) -> StepPrompt {
        let session = self.sessions.start(user_id, WizardMode::Create, HashMap::new());
        info!(user_id = user_id, "Listing wizard started");
        prompt_for(self.steps, &session, 0)
    }

    /// Start an edit run pre-filled from `listing`.
    pub fn start_edit(&self, user_id: i64, listing: &Listing) -> StepPrompt {
        let mode = WizardMode::Edit {
            listing_id: listing.id,
        };
        let session = self.sessions.start(user_id, mode, seed_from_listing(listing));
        info!(user_id = user_id, listing_id = listing.id, "Listing edit wizard started");
        prompt_for(self.steps, &session, 0)
    }

    /// What the user should currently be looking at.
    pub fn current(&self, user_id: i64) -> Option<WizardReply> {
        let session = self.sessions.get(user_id)?;
        Some(match session.phase {
            WizardPhase::Collecting { index } => {
                WizardReply::Prompt(prompt_for(self.steps, &session, index))
            }
            WizardPhase::AwaitingCustomValue { index, .. } => {
                let mut prompt = prompt_for(self.steps, &session, index);
                prompt.awaiting_custom = true;
                WizardReply::Prompt(prompt)
            }
            WizardPhase::Preview => WizardReply::Preview(summarize(self.steps, &session)),
        })
    }

    /// Feed one input to the user's session.
    pub fn submit(&self, user_id: i64, input: StepInput) -> Result<WizardReply> {
        let steps = self.steps;
        self.sessions
            .modify(user_id, |session| apply_input(steps, session, input))
            .ok_or(StayBuddyError::NoActiveSession { user_id })
    }

    /// Drop the session from any state. False when there was none.
    pub fn cancel(&self, user_id: i64) -> bool {
        let cancelled = self.sessions.clear(user_id).is_some();
        if cancelled {
            log_wizard_transition(user_id, "any", "cancelled");
        }
        cancelled
    }

    /// Go back to the first step. Edit runs are re-seeded from the stored
    /// listing, create runs start empty. An edit run whose listing is gone
    /// continues as a create run.
    pub async fn restart<S: ListingStore>(&self, user_id: i64, store: &S) -> Result<StepPrompt> {
        let session = self.preview_session(user_id, "restart")?;

        let (mode, seed) = match session.mode {
            WizardMode::Create => (WizardMode::Create, HashMap::new()),
            WizardMode::Edit { listing_id } => match store.find_listing(listing_id).await? {
                Some(listing) => (session.mode, seed_from_listing(&listing)),
                None => {
                    warn!(user_id = user_id, listing_id = listing_id, "Edited listing is gone, restarting as a new listing");
                    (WizardMode::Create, HashMap::new())
                }
            },
        };

        let fresh = self.sessions.start(user_id, mode, seed);
        log_wizard_transition(user_id, "preview", "step_0");
        Ok(prompt_for(self.steps, &fresh, 0))
    }

    /// Persist the previewed listing and end the session. On failure the
    /// session stays in preview so the operator can retry or cancel.
    pub async fn commit<S: ListingStore>(&self, user_id: i64, store: &S) -> Result<CommitOutcome> {
        let session = self.preview_session(user_id, "commit")?;
        let draft = build_draft(&session);
        draft.validate()?;

        let outcome = match session.mode {
            WizardMode::Create => CommitOutcome::Created {
                listing_id: store.insert_listing(&draft).await?,
            },
            WizardMode::Edit { listing_id } => {
                store.update_listing(listing_id, &draft).await?;
                CommitOutcome::Updated { listing_id }
            }
        };

        self.sessions.clear(user_id);
        info!(
            user_id = user_id,
            listing_id = outcome.listing_id(),
            "Listing wizard committed"
        );
        Ok(outcome)
    }

    fn preview_session(&self, user_id: i64, action: &str) -> Result<Session> {
        let session = self
            .sessions
            .get(user_id)
            .ok_or(StayBuddyError::NoActiveSession { user_id })?;
        if session.phase != WizardPhase::Preview {
            return Err(StayBuddyError::InvalidStateTransition {
                from: session.phase.name().to_string(),
                to: action.to_string(),
            });
        }
        Ok(session)
    }
}

fn apply_input(steps: &[StepDescriptor], session: &mut Session, input: StepInput) -> WizardReply {
    let index = match session.phase {
        WizardPhase::Preview => return WizardReply::Ignored,
        WizardPhase::AwaitingCustomValue { index, field_key } => {
            return match input {
                StepInput::Text(text) => match clean_text(&text) {
                    Some(value) => {
                        session
                            .fields
                            .insert(field_key.to_string(), FieldValue::Text(value));
                        advance(steps, session, index)
                    }
                    None => {
                        let mut prompt = prompt_for(steps, session, index);
                        prompt.awaiting_custom = true;
                        WizardReply::Rejected {
                            reason: Rejection::EmptyText,
                            prompt,
                        }
                    }
                },
                StepInput::Upload(_) => {
                    let mut prompt = prompt_for(steps, session, index);
                    prompt.awaiting_custom = true;
                    WizardReply::Rejected {
                        reason: Rejection::UnexpectedUpload,
                        prompt,
                    }
                }
                StepInput::Choice(_) | StepInput::MediaDone => WizardReply::Ignored,
            };
        }
        WizardPhase::Collecting { index } => index,
    };

    let Some(step) = steps.get(index) else {
        session.phase = WizardPhase::Preview;
        return WizardReply::Preview(summarize(steps, session));
    };

    let reject = |session: &Session, reason: Rejection| WizardReply::Rejected {
        reason,
        prompt: prompt_for(steps, session, index),
    };

    match (step.kind, input) {
        (StepKind::MediaCollection, StepInput::Upload(item)) => {
            append_media(session, step.key, vec![item]);
            WizardReply::MediaAdded {
                added: 1,
                prompt: prompt_for(steps, session, index),
            }
        }
        (StepKind::MediaCollection, StepInput::Text(text)) => {
            let links = extract_links(&text);
            if links.is_empty() {
                return reject(session, Rejection::NoMediaAccepted);
            }
            let added = links.len();
            append_media(session, step.key, links);
            WizardReply::MediaAdded {
                added,
                prompt: prompt_for(steps, session, index),
            }
        }
        (StepKind::MediaCollection, StepInput::MediaDone) => {
            append_media(session, step.key, Vec::new());
            advance(steps, session, index)
        }
        (StepKind::MediaCollection, StepInput::Choice(_)) | (_, StepInput::MediaDone) => {
            WizardReply::Ignored
        }
        (StepKind::SingleChoice { custom_field, .. }, StepInput::Choice(value)) => {
            if !step.accepts_choice(&value) {
                return WizardReply::Ignored;
            }
            if value == CUSTOM_CHOICE {
                let field_key = custom_field.unwrap_or(step.key);
                session.phase = WizardPhase::AwaitingCustomValue { index, field_key };
                log_wizard_transition(session.user_id, step.key, "custom_value");
                let mut prompt = prompt_for(steps, session, index);
                prompt.awaiting_custom = true;
                return WizardReply::Prompt(prompt);
            }
            session
                .fields
                .insert(step.key.to_string(), FieldValue::Text(value));
            advance(steps, session, index)
        }
        (StepKind::SingleChoice { .. }, StepInput::Text(_)) => {
            reject(session, Rejection::ExpectedButton)
        }
        (_, StepInput::Choice(_)) => WizardReply::Ignored,
        (_, StepInput::Upload(_)) => reject(session, Rejection::UnexpectedUpload),
        (StepKind::FreeText, StepInput::Text(text)) => match clean_text(&text) {
            Some(value) => {
                session
                    .fields
                    .insert(step.key.to_string(), FieldValue::Text(value));
                advance(steps, session, index)
            }
            None => reject(session, Rejection::EmptyText),
        },
        (StepKind::Integer, StepInput::Text(text)) => match parse_integer(&text) {
            Some(value) => {
                session
                    .fields
                    .insert(step.key.to_string(), FieldValue::Integer(value));
                advance(steps, session, index)
            }
            None => reject(session, Rejection::NotAnInteger),
        },
        (StepKind::Url, StepInput::Text(text)) => {
            let url = text.trim();
            if !is_http_url(url) {
                return reject(session, Rejection::NotAUrl);
            }
            session
                .fields
                .insert(step.key.to_string(), FieldValue::Text(url.to_string()));
            advance(steps, session, index)
        }
    }
}

fn advance(steps: &[StepDescriptor], session: &mut Session, index: usize) -> WizardReply {
    let next = index + 1;
    let from = steps.get(index).map(|step| step.key).unwrap_or("?");
    if next >= steps.len() {
        session.phase = WizardPhase::Preview;
        log_wizard_transition(session.user_id, from, "preview");
        return WizardReply::Preview(summarize(steps, session));
    }
    session.phase = WizardPhase::Collecting { index: next };
    log_wizard_transition(session.user_id, from, steps[next].key);
    WizardReply::Prompt(prompt_for(steps, session, next))
}

fn prompt_for(steps: &[StepDescriptor], session: &Session, index: usize) -> StepPrompt {
    let step = steps[index.min(steps.len().saturating_sub(1))];
    StepPrompt {
        index,
        total: steps.len(),
        step,
        media_count: session.media(step.key).len(),
        awaiting_custom: false,
    }
}

fn summarize(steps: &[StepDescriptor], session: &Session) -> PreviewSummary {
    let mut media_count = 0;
    let lines = steps
        .iter()
        .map(|step| {
            let value = match session.field(step.key) {
                None => String::new(),
                Some(FieldValue::Text(text)) => text.clone(),
                Some(FieldValue::Integer(value)) => value.to_string(),
                Some(FieldValue::Media(items)) => {
                    media_count += items.len();
                    items.len().to_string()
                }
            };
            PreviewLine {
                key: step.key,
                label: step.label,
                value,
            }
        })
        .collect();

    PreviewSummary {
        mode: session.mode,
        lines,
        media_count,
    }
}

fn append_media(session: &mut Session, key: &str, items: Vec<MediaItem>) {
    match session
        .fields
        .entry(key.to_string())
        .or_insert_with(|| FieldValue::Media(Vec::new()))
    {
        FieldValue::Media(existing) => existing.extend(items),
        other => *other = FieldValue::Media(items),
    }
}

fn clean_text(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_integer(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Every http(s) line of a text message as an external media item.
fn extract_links(text: &str) -> Vec<MediaItem> {
    text.lines()
        .map(str::trim)
        .filter(|line| is_http_url(line))
        .map(|line| MediaItem::new(MediaKind::ExternalUrl, line))
        .collect()
}

/// Wizard fields for editing an existing listing.
pub fn seed_from_listing(listing: &Listing) -> HashMap<String, FieldValue> {
    let details = listing.details();
    let mut seed = HashMap::new();
    seed.insert(fields::MEDIA_ITEMS.to_string(), FieldValue::Media(listing.media()));
    seed.insert(
        fields::GUESTS_MAX.to_string(),
        FieldValue::Integer(i64::from(listing.guests_max)),
    );

    let texts = [
        (fields::HEADER_TEXT, listing.header().to_string()),
        (fields::SHORT_DESC, details.short_desc.clone()),
        (fields::QUOTE_DESC, details.quote_desc.clone()),
        (fields::FEATURES_TEXT, details.features_text.clone()),
        (fields::TAGS, listing.tags.join(",")),
        (fields::MAP_URL, listing.map_url.clone()),
    ];
    for (key, value) in texts {
        if !value.trim().is_empty() {
            seed.insert(key.to_string(), FieldValue::Text(value));
        }
    }
    seed
}

/// Assemble the listing a session describes.
pub fn build_draft(session: &Session) -> ListingDraft {
    let text = |key: &str| session.text(key).unwrap_or_default().to_string();
    let details = ListingDetails {
        header_text: text(fields::HEADER_TEXT),
        short_desc: text(fields::SHORT_DESC),
        quote_desc: text(fields::QUOTE_DESC),
        features_text: text(fields::FEATURES_TEXT),
        media_items: session.media(fields::MEDIA_ITEMS).to_vec(),
    };
    let guests_max = session
        .field(fields::GUESTS_MAX)
        .and_then(FieldValue::as_integer);

    ListingDraft::from_details(
        details,
        guests_max,
        parse_tags(&text(fields::TAGS)),
        text(fields::MAP_URL),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::steps::Choice;
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        inserted: Mutex<Vec<ListingDraft>>,
        fail: bool,
    }

    impl ListingStore for RecordingStore {
        async fn insert_listing(&self, draft: &ListingDraft) -> Result<i64> {
            if self.fail {
                return Err(StayBuddyError::ServiceUnavailable("db down".to_string()));
            }
            let mut inserted = self.inserted.lock().unwrap();
            inserted.push(draft.clone());
            Ok(inserted.len() as i64)
        }

        async fn update_listing(&self, listing_id: i64, _draft: &ListingDraft) -> Result<()> {
            Err(StayBuddyError::ListingNotFound { listing_id })
        }

        async fn find_listing(&self, _listing_id: i64) -> Result<Option<Listing>> {
            Ok(None)
        }
    }

    fn text(value: &str) -> StepInput {
        StepInput::Text(value.to_string())
    }

    fn photo() -> StepInput {
        StepInput::Upload(MediaItem::new(MediaKind::Photo, "photo-file-id"))
    }

    fn fill_to_preview(engine: &WizardEngine, user_id: i64) -> WizardReply {
        engine.start_create(user_id);
        answer_all(engine, user_id)
    }

    fn answer_all(engine: &WizardEngine, user_id: i64) -> WizardReply {
        engine.submit(user_id, photo()).unwrap();
        engine.submit(user_id, StepInput::MediaDone).unwrap();
        for value in ["Test Apartment", "Nice place", "Quiet", "Bed, AC", "4", "parking,quiet"] {
            engine.submit(user_id, text(value)).unwrap();
        }
        engine.submit(user_id, text("https://maps.example/1")).unwrap()
    }

    #[test]
    fn test_valid_inputs_reach_preview_in_table_order() {
        let engine = WizardEngine::new(SessionStore::new());
        let reply = fill_to_preview(&engine, 1);

        let WizardReply::Preview(summary) = reply else {
            panic!("expected preview, got {:?}", reply);
        };
        let expected: Vec<&str> = LISTING_STEPS.iter().map(|s| s.key).collect();
        assert_eq!(summary.keys(), expected);
        assert_eq!(summary.value_of(fields::GUESTS_MAX), Some("4"));
        assert_eq!(summary.value_of(fields::TAGS), Some("parking,quiet"));
        assert_eq!(summary.media_count, 1);
    }

    #[test]
    fn test_invalid_input_keeps_step_and_fields() {
        let engine = WizardEngine::new(SessionStore::new());
        engine.start_create(7);
        engine.submit(7, StepInput::MediaDone).unwrap();
        engine.submit(7, text("Header")).unwrap();
        let before = engine.sessions().get(7).unwrap();

        assert_matches!(
            engine.submit(7, text("   ")).unwrap(),
            WizardReply::Rejected { reason: Rejection::EmptyText, .. }
        );
        assert_matches!(
            engine.submit(7, photo()).unwrap(),
            WizardReply::Rejected { reason: Rejection::UnexpectedUpload, .. }
        );
        let after = engine.sessions().get(7).unwrap();
        assert_eq!(before.phase, after.phase);
        assert_eq!(before.fields, after.fields);
    }

    #[test]
    fn test_integer_and_url_validation() {
        let engine = WizardEngine::new(SessionStore::new());
        engine.start_create(3);
        engine.submit(3, StepInput::MediaDone).unwrap();
        for value in ["h", "s", "q", "f"] {
            engine.submit(3, text(value)).unwrap();
        }
        for bad in ["four", "-4", "4.5", "", "99999999999999999999"] {
            assert_matches!(
                engine.submit(3, text(bad)).unwrap(),
                WizardReply::Rejected { reason: Rejection::NotAnInteger, .. }
            );
        }
        engine.submit(3, text(" 6 ")).unwrap();
        engine.submit(3, text("quiet")).unwrap();
        assert_matches!(
            engine.submit(3, text("maps.example/1")).unwrap(),
            WizardReply::Rejected { reason: Rejection::NotAUrl, .. }
        );
        assert_matches!(engine.submit(3, text("http://m.example")).unwrap(), WizardReply::Preview(_));
    }

    #[test]
    fn test_media_count_is_monotonic_and_needs_done() {
        let engine = WizardEngine::new(SessionStore::new());
        engine.start_create(5);

        let mut last = 0;
        let inputs = [
            photo(),
            text("https://a.example/1.jpg\nnot a link\nhttps://a.example/2.jpg"),
            StepInput::Upload(MediaItem::new(MediaKind::Video, "video-id")),
        ];
        for input in inputs {
            match engine.submit(5, input).unwrap() {
                WizardReply::MediaAdded { prompt, .. } => {
                    assert!(prompt.media_count > last);
                    assert_eq!(prompt.index, 0);
                    last = prompt.media_count;
                }
                other => panic!("unexpected reply {:?}", other),
            }
        }
        assert_eq!(last, 4);

        assert_matches!(
            engine.submit(5, text("no links here")).unwrap(),
            WizardReply::Rejected { reason: Rejection::NoMediaAccepted, prompt } if prompt.media_count == 4
        );

        engine.start_create(5);
        assert_matches!(engine.current(5), Some(WizardReply::Prompt(p)) if p.media_count == 0);
    }

    #[test]
    fn test_media_done_with_nothing_collected_advances() {
        let engine = WizardEngine::new(SessionStore::new());
        engine.start_create(8);
        assert_matches!(
            engine.submit(8, StepInput::MediaDone).unwrap(),
            WizardReply::Prompt(p) if p.index == 1
        );
        assert_eq!(engine.sessions().get(8).unwrap().media(fields::MEDIA_ITEMS).len(), 0);
    }

    static CHOICES: &[Choice] = &[
        Choice { value: "yes", label: "Yes" },
        Choice { value: "no", label: "No" },
    ];

    static CHOICE_STEPS: &[StepDescriptor] = &[
        StepDescriptor {
            key: "balcony",
            label: "Balcony",
            kind: StepKind::SingleChoice { choices: CHOICES, custom_field: Some("balcony_note") },
            prompt: "Balcony?",
            example: None,
        },
        StepDescriptor {
            key: "note",
            label: "Note",
            kind: StepKind::FreeText,
            prompt: "Anything else?",
            example: None,
        },
    ];

    #[test]
    fn test_choice_step_and_custom_redirect() {
        let engine = WizardEngine::with_steps(SessionStore::new(), CHOICE_STEPS).unwrap();
        engine.start_create(4);

        assert_eq!(engine.submit(4, StepInput::Choice("maybe".into())).unwrap(), WizardReply::Ignored);
        assert_matches!(
            engine.submit(4, text("yes")).unwrap(),
            WizardReply::Rejected { reason: Rejection::ExpectedButton, .. }
        );

        assert_matches!(
            engine.submit(4, StepInput::Choice(CUSTOM_CHOICE.into())).unwrap(),
            WizardReply::Prompt(p) if p.awaiting_custom && p.index == 0
        );
        assert_eq!(
            engine.sessions().get(4).unwrap().phase,
            WizardPhase::AwaitingCustomValue { index: 0, field_key: "balcony_note" }
        );
        assert_eq!(engine.submit(4, StepInput::Choice("yes".into())).unwrap(), WizardReply::Ignored);

        assert_matches!(engine.submit(4, text("French balcony")).unwrap(), WizardReply::Prompt(p) if p.index == 1);
        let reply = engine.submit(4, text("none")).unwrap();
        let WizardReply::Preview(summary) = reply else { panic!("expected preview") };
        assert_eq!(summary.value_of("balcony"), Some(""));
        assert_eq!(summary.value_of("note"), Some("none"));
        assert_eq!(
            engine.sessions().get(4).unwrap().text("balcony_note"),
            Some("French balcony")
        );
    }

    #[test]
    fn test_plain_choice_advances() {
        let engine = WizardEngine::with_steps(SessionStore::new(), CHOICE_STEPS).unwrap();
        engine.start_create(6);
        assert_matches!(engine.submit(6, StepInput::Choice("no".into())).unwrap(), WizardReply::Prompt(p) if p.index == 1);
        assert_eq!(engine.sessions().get(6).unwrap().text("balcony"), Some("no"));
    }

    #[test]
    fn test_submit_without_session() {
        let engine = WizardEngine::new(SessionStore::new());
        assert_matches!(
            engine.submit(99, text("x")),
            Err(StayBuddyError::NoActiveSession { user_id: 99 })
        );
        assert!(!engine.cancel(99));
    }

    #[test]
    fn test_preview_ignores_further_input() {
        let engine = WizardEngine::new(SessionStore::new());
        fill_to_preview(&engine, 2);
        assert_eq!(engine.submit(2, text("more")).unwrap(), WizardReply::Ignored);
        assert_matches!(engine.current(2), Some(WizardReply::Preview(_)));
    }

    #[tokio::test]
    async fn test_commit_creates_and_clears() {
        let engine = WizardEngine::new(SessionStore::new());
        let store = RecordingStore::default();
        fill_to_preview(&engine, 1);

        let outcome = engine.commit(1, &store).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Created { listing_id: 1 });
        assert!(!engine.is_active(1));

        let inserted = store.inserted.lock().unwrap();
        assert_eq!(inserted[0].guests_max, 4);
        assert_eq!(inserted[0].tags, vec!["parking", "quiet"]);
        assert_eq!(inserted[0].details.media_items.len(), 1);
        assert!(inserted[0].media_urls.is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_preview() {
        let engine = WizardEngine::new(SessionStore::new());
        let store = RecordingStore { fail: true, ..Default::default() };
        fill_to_preview(&engine, 1);

        assert!(engine.commit(1, &store).await.is_err());
        assert_eq!(engine.sessions().get(1).unwrap().phase, WizardPhase::Preview);
    }

    #[tokio::test]
    async fn test_commit_and_restart_require_preview() {
        let engine = WizardEngine::new(SessionStore::new());
        let store = RecordingStore::default();
        engine.start_create(1);

        assert_matches!(
            engine.commit(1, &store).await,
            Err(StayBuddyError::InvalidStateTransition { .. })
        );
        assert_matches!(
            engine.restart(1, &store).await,
            Err(StayBuddyError::InvalidStateTransition { .. })
        );
    }

    #[tokio::test]
    async fn test_restart_in_create_mode_empties_fields() {
        let engine = WizardEngine::new(SessionStore::new());
        let store = RecordingStore::default();
        fill_to_preview(&engine, 1);

        let prompt = engine.restart(1, &store).await.unwrap();
        assert_eq!(prompt.index, 0);
        assert_eq!(prompt.media_count, 0);
        let session = engine.sessions().get(1).unwrap();
        assert!(session.fields.is_empty());
        assert_eq!(session.mode, WizardMode::Create);
    }

    #[tokio::test]
    async fn test_restart_of_deleted_listing_becomes_create_run() {
        let engine = WizardEngine::new(SessionStore::new());
        let store = RecordingStore::default();
        let now = chrono::Utc::now();
        let listing = Listing {
            id: 42,
            title: "Loft".to_string(),
            address_short: "Main st. 1".to_string(),
            guests_max: 2,
            amenities: String::new(),
            tags: vec!["quiet".to_string()],
            price_from: 0,
            channel_post_url: String::new(),
            map_url: String::new(),
            is_active: true,
            sort_order: 0,
            details_json: sqlx::types::Json(ListingDetails::default()),
            media_urls: vec![],
            created_at: now,
            updated_at: now,
        };
        engine.start_edit(9, &listing);
        assert_matches!(answer_all(&engine, 9), WizardReply::Preview(_));

        let prompt = engine.restart(9, &store).await.unwrap();
        assert_eq!(prompt.index, 0);
        let session = engine.sessions().get(9).unwrap();
        assert_eq!(session.mode, WizardMode::Create);
        assert!(session.fields.is_empty());

        answer_all(&engine, 9);
        assert_eq!(
            engine.commit(9, &store).await.unwrap(),
            CommitOutcome::Created { listing_id: 1 }
        );
    }
}
