//! Listing wizard driven end to end against an in-memory store

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use StayBuddy::database::ListingStore;
use StayBuddy::models::{ListingDetails, ListingDraft, MediaItem, MediaKind};
use StayBuddy::state::steps::fields;
use StayBuddy::state::{CommitOutcome, FieldValue, SessionStore, StepInput, WizardEngine, WizardPhase, WizardReply};

const ADMIN_ID: i64 = 42;

fn text(value: &str) -> StepInput {
    StepInput::Text(value.to_string())
}

fn fill_form(engine: &WizardEngine) -> WizardReply {
    engine.start_create(ADMIN_ID);
    engine
        .submit(ADMIN_ID, StepInput::Upload(MediaItem::new(MediaKind::Photo, "AgACAgIAAxkBAAI")))
        .unwrap();
    engine.submit(ADMIN_ID, StepInput::MediaDone).unwrap();
    for value in ["Test Apartment", "Nice place", "Quiet", "Bed, AC", "4", "parking,quiet"] {
        engine.submit(ADMIN_ID, text(value)).unwrap();
    }
    engine.submit(ADMIN_ID, text("https://maps.example/1")).unwrap()
}

#[tokio::test]
async fn test_create_listing_through_wizard() {
    let engine = WizardEngine::new(SessionStore::new());
    let store = MemoryListings::default();

    let reply = fill_form(&engine);
    let WizardReply::Preview(summary) = reply else {
        panic!("expected preview, got {:?}", reply);
    };
    assert_eq!(summary.value_of(fields::GUESTS_MAX), Some("4"));
    assert_eq!(summary.value_of(fields::TAGS), Some("parking,quiet"));
    assert_eq!(summary.media_count, 1);

    let outcome = engine.commit(ADMIN_ID, &store).await.unwrap();
    assert_matches!(outcome, CommitOutcome::Created { listing_id: 1 });
    assert!(!engine.is_active(ADMIN_ID));

    let listing = store.get(1).expect("listing stored");
    assert_eq!(listing.guests_max, 4);
    assert_eq!(listing.title, "Test Apartment");
    assert_eq!(listing.tags, vec!["parking".to_string(), "quiet".to_string()]);
    assert_eq!(listing.map_url, "https://maps.example/1");
    assert!(listing.media_urls.is_empty());

    let media = listing.media();
    assert_eq!(media.len(), 1);
    assert_eq!(media[0].kind, MediaKind::Photo);
}

#[tokio::test]
async fn test_restart_from_preview_starts_over() {
    let engine = WizardEngine::new(SessionStore::new());
    let store = MemoryListings::default();
    fill_form(&engine);

    let prompt = engine.restart(ADMIN_ID, &store).await.unwrap();
    assert_eq!(prompt.index, 0);
    assert_eq!(prompt.media_count, 0);

    let session = engine.sessions().get(ADMIN_ID).unwrap();
    assert_matches!(session.phase, WizardPhase::Collecting { index: 0 });
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_commit_needs_preview() {
    let engine = WizardEngine::new(SessionStore::new());
    let store = MemoryListings::default();
    engine.start_create(ADMIN_ID);

    assert!(engine.commit(ADMIN_ID, &store).await.is_err());
    assert!(engine.is_active(ADMIN_ID));
    assert!(store.rows.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_drops_session() {
    let engine = WizardEngine::new(SessionStore::new());
    fill_form(&engine);

    assert!(engine.cancel(ADMIN_ID));
    assert!(!engine.is_active(ADMIN_ID));
    assert!(engine.current(ADMIN_ID).is_none());
    assert!(!engine.cancel(ADMIN_ID));
}

#[tokio::test]
async fn test_edit_run_restarts_from_stored_listing() {
    let engine = WizardEngine::new(SessionStore::new());
    let store = MemoryListings::default();
    let details = ListingDetails {
        header_text: "Old header".to_string(),
        ..Default::default()
    };
    let draft = ListingDraft::from_details(details, Some(3), vec!["sea".to_string()], String::new());
    let listing_id = store.insert_listing(&draft).await.unwrap();

    engine.start_edit(ADMIN_ID, &store.get(listing_id).unwrap());
    engine.submit(ADMIN_ID, StepInput::MediaDone).unwrap();
    for value in ["New header", "Short", "Quote", "Wifi", "6", "pets", "https://maps.example/9"] {
        engine.submit(ADMIN_ID, text(value)).unwrap();
    }
    assert_matches!(engine.current(ADMIN_ID), Some(WizardReply::Preview(_)));

    engine.restart(ADMIN_ID, &store).await.unwrap();
    let session = engine.sessions().get(ADMIN_ID).unwrap();
    assert_eq!(session.text(fields::HEADER_TEXT), Some("Old header"));
    assert_eq!(session.field(fields::GUESTS_MAX).and_then(FieldValue::as_integer), Some(3));
    assert_eq!(session.text(fields::TAGS), Some("sea"));

    engine.submit(ADMIN_ID, StepInput::MediaDone).unwrap();
    for value in ["New header", "Short", "Quote", "Wifi", "6", "pets", "https://maps.example/9"] {
        engine.submit(ADMIN_ID, text(value)).unwrap();
    }
    let outcome = engine.commit(ADMIN_ID, &store).await.unwrap();
    assert_eq!(outcome, CommitOutcome::Updated { listing_id });

    let updated = store.get(listing_id).unwrap();
    assert_eq!(updated.header(), "New header");
    assert_eq!(updated.guests_max, 6);
    assert_eq!(updated.tags, vec!["pets".to_string()]);
    assert_eq!(store.rows.lock().unwrap().len(), 1);
}
