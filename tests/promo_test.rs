//! Promo issuing rules over an in-memory pool

mod helpers;

use helpers::*;
use StayBuddy::models::PromoKind;
use StayBuddy::services::{PromoService, WelcomeClaim};

#[tokio::test]
async fn test_welcome_code_is_issued_once() {
    let service = PromoService::new(MemoryPromos::with_codes(PromoKind::Welcome, &["WELCOME1", "WELCOME2"]));

    assert_eq!(
        service.claim_welcome(7).await.unwrap(),
        WelcomeClaim::Issued("WELCOME1".to_string())
    );
    assert_eq!(service.claim_welcome(7).await.unwrap(), WelcomeClaim::AlreadyReceived);
    assert_eq!(service.store().free_count(PromoKind::Welcome), 1);
}

#[tokio::test]
async fn test_welcome_pool_runs_dry() {
    let service = PromoService::new(MemoryPromos::with_codes(PromoKind::Welcome, &["ONLY"]));

    assert_eq!(
        service.claim_welcome(1).await.unwrap(),
        WelcomeClaim::Issued("ONLY".to_string())
    );
    assert_eq!(service.claim_welcome(2).await.unwrap(), WelcomeClaim::PoolEmpty);
}

#[tokio::test]
async fn test_issue_takes_codes_of_requested_kind() {
    let promos = MemoryPromos::with_codes(PromoKind::Welcome, &["W1"]);
    promos.codes.lock().unwrap().push(MemoryCode {
        code: "G1".to_string(),
        kind: PromoKind::Giveaway,
        assigned_to: None,
    });
    let service = PromoService::new(promos);

    assert_eq!(service.issue(PromoKind::Giveaway, 5).await.unwrap(), Some("G1".to_string()));
    assert_eq!(service.issue(PromoKind::Giveaway, 6).await.unwrap(), None);
    assert_eq!(service.store().free_count(PromoKind::Welcome), 1);
}
