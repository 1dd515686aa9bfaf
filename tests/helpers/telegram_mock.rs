//! Mock Telegram API server for testing
//!
//! A wiremock server answering Bot API calls, plus a [`Bot`] pointed at it.

use serde_json::{json, Value};
use teloxide::Bot;
use url::Url;
use wiremock::{
    matchers::{body_partial_json, method, path_regex},
    Mock, MockServer, ResponseTemplate,
};

use super::TEST_BOT_TOKEN;

/// Mock Telegram API server for testing
pub struct TelegramMockServer {
    pub server: MockServer,
}

impl TelegramMockServer {
    pub async fn new() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// A bot that talks to this server instead of api.telegram.org.
    pub fn bot(&self) -> Bot {
        let url = Url::parse(&self.server.uri()).expect("mock server uri");
        Bot::new(TEST_BOT_TOKEN).set_api_url(url)
    }

    /// Bot API method names are case-insensitive; teloxide posts `SendMessage`.
    fn method_path(name: &str) -> String {
        format!(r"(?i)^/bot[^/]+/{}$", name)
    }

    /// Every sendMessage succeeds.
    pub async fn mock_send_message(&self) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendMessage")))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(1)))
            .mount(&self.server)
            .await;
    }

    /// sendMessage to `chat_id` fails as if the user blocked the bot.
    pub async fn mock_blocked_chat(&self, chat_id: i64) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("sendMessage")))
            .and(body_partial_json(json!({ "chat_id": chat_id })))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// pinChatMessage succeeds, or fails as if the bot lacks the right.
    pub async fn mock_pin(&self, success: bool) {
        let response = if success {
            ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": true }))
        } else {
            ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: not enough rights to manage pinned messages in the chat"
            }))
        };
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("pinChatMessage")))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// editMessageReplyMarkup returns the edited message.
    pub async fn mock_edit_reply_markup(&self) {
        Mock::given(method("POST"))
            .and(path_regex(Self::method_path("editMessageReplyMarkup")))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent_message(1)))
            .mount(&self.server)
            .await;
    }

    /// How many requests reached `name`, ignoring case.
    pub async fn calls_to(&self, name: &str) -> usize {
        self.requests_to(name).await.len()
    }

    /// JSON bodies of the requests that reached `name`.
    pub async fn bodies_of(&self, name: &str) -> Vec<Value> {
        self.requests_to(name)
            .await
            .iter()
            .filter_map(|request| serde_json::from_slice(&request.body).ok())
            .collect()
    }

    async fn requests_to(&self, name: &str) -> Vec<wiremock::Request> {
        let suffix = format!("/{}", name.to_lowercase());
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path().to_lowercase().ends_with(&suffix))
            .collect()
    }
}

fn sent_message(chat_id: i64) -> Value {
    json!({
        "ok": true,
        "result": {
            "message_id": 123,
            "from": {
                "id": 12345,
                "is_bot": true,
                "first_name": "StayBuddy",
                "username": "staybuddy_test_bot"
            },
            "chat": {
                "id": chat_id,
                "first_name": "Guest",
                "type": "private"
            },
            "date": 1640995200,
            "text": "Test message"
        }
    })
}
