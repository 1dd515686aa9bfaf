//! Notification relay against a mock Bot API

mod helpers;

use helpers::*;
use serial_test::serial;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use StayBuddy::services::NotificationRelay;

#[tokio::test]
#[serial]
async fn test_broadcast_reports_unreachable_recipients() {
    let mock = TelegramMockServer::new().await;
    mock.mock_blocked_chat(2).await;
    mock.mock_send_message().await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![], None, 30);

    let report = relay.broadcast(&[1, 2, 3], "Hello").await;

    assert_eq!(report.sent, 2);
    assert_eq!(report.unreachable, vec![2]);
    assert_eq!(mock.calls_to("sendMessage").await, 3);
}

#[tokio::test]
#[serial]
async fn test_notify_admins_counts_deliveries() {
    let mock = TelegramMockServer::new().await;
    mock.mock_blocked_chat(20).await;
    mock.mock_send_message().await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![10, 20, 30], None, 30);

    assert_eq!(relay.notify_admins("New request", None).await, 2);
    assert!(relay.send_to_user(10, "Your code").await);
    assert!(!relay.send_to_user(20, "Your code").await);
}

#[tokio::test]
#[serial]
async fn test_publish_without_channel_is_skipped() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message().await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![], None, 30);

    assert!(!relay.publish("New listing", None).await.unwrap());
    assert_eq!(mock.calls_to("sendMessage").await, 0);

    let relay = NotificationRelay::with_targets(mock.bot(), vec![], Some(-100123), 30);
    assert!(relay.publish("New listing", None).await.unwrap());
    assert_eq!(mock.calls_to("sendMessage").await, 1);
}

#[tokio::test]
#[serial]
async fn test_publish_pinned_reports_pin_outcome() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message().await;
    mock.mock_pin(true).await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![], Some(-100123), 30);

    let (message_id, pinned) = relay
        .publish_pinned("Quick booking", quick_booking())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message_id, MessageId(123));
    assert!(pinned);

    let pins = mock.bodies_of("pinChatMessage").await;
    assert_eq!(pins.len(), 1);
    assert_eq!(pins[0]["message_id"], 123);
    assert_eq!(pins[0]["disable_notification"], true);
}

#[tokio::test]
#[serial]
async fn test_publish_pinned_keeps_post_when_pin_fails() {
    let mock = TelegramMockServer::new().await;
    mock.mock_send_message().await;
    mock.mock_pin(false).await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![], Some(-100123), 30);

    let outcome = relay.publish_pinned("Quick booking", quick_booking()).await.unwrap();
    assert_eq!(outcome, Some((MessageId(123), false)));
    assert_eq!(mock.calls_to("sendMessage").await, 1);

    let relay = NotificationRelay::with_targets(mock.bot(), vec![], None, 30);
    assert_eq!(relay.publish_pinned("Quick booking", quick_booking()).await.unwrap(), None);
}

#[tokio::test]
#[serial]
async fn test_edit_buttons_targets_the_stored_post() {
    let mock = TelegramMockServer::new().await;
    mock.mock_edit_reply_markup().await;
    let relay = NotificationRelay::with_targets(mock.bot(), vec![], Some(-100123), 30);

    relay
        .edit_buttons(-100123, MessageId(77), quick_booking())
        .await
        .unwrap();

    let edits = mock.bodies_of("editMessageReplyMarkup").await;
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0]["chat_id"], -100123);
    assert_eq!(edits[0]["message_id"], 77);
    assert_eq!(
        edits[0]["reply_markup"]["inline_keyboard"][0][0]["url"],
        "https://example.com/book"
    );
}

fn quick_booking() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        "Book",
        "https://example.com/book".parse().unwrap(),
    )]])
}
