//! Channel posts
//!
//! The operator-built post (media first, then text, then preview) and the
//! stored location of the channel's catalog-button message.

use serde::{Deserialize, Serialize};

use crate::models::{MediaItem, MediaKind};
use crate::utils::errors::{Result, StayBuddyError};

/// Telegram caption limit for media messages.
pub const CAPTION_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostStage {
    Media,
    Text,
    Preview,
}

/// A custom channel post in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPostDraft {
    media: Vec<MediaItem>,
    text: Option<String>,
    stage: PostStage,
}

impl Default for ChannelPostDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelPostDraft {
    pub fn new() -> Self {
        Self {
            media: Vec::new(),
            text: None,
            stage: PostStage::Media,
        }
    }

    pub fn stage(&self) -> PostStage {
        self.stage
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// Append a photo or video. Returns the new media count.
    pub fn add_media(&mut self, item: MediaItem) -> Result<usize> {
        if self.stage != PostStage::Media {
            return Err(StayBuddyError::InvalidInput(
                "Media is already collected, use the buttons to continue.".to_string(),
            ));
        }
        if !matches!(item.kind, MediaKind::Photo | MediaKind::Video) {
            return Err(StayBuddyError::InvalidInput(
                "Only photos and videos can be attached.".to_string(),
            ));
        }
        self.media.push(item);
        Ok(self.media.len())
    }

    /// Close the media stage; at least one item is required.
    pub fn finish_media(&mut self) -> Result<()> {
        if self.stage != PostStage::Media {
            return Ok(());
        }
        if self.media.is_empty() {
            return Err(StayBuddyError::InvalidInput(
                "Add at least one photo or video first.".to_string(),
            ));
        }
        self.stage = PostStage::Text;
        Ok(())
    }

    pub fn set_text(&mut self, text: &str) -> Result<()> {
        if self.stage != PostStage::Text {
            return Err(StayBuddyError::InvalidInput(
                "Finish adding media first.".to_string(),
            ));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(StayBuddyError::InvalidInput("The post text is empty.".to_string()));
        }
        if text.chars().count() > CAPTION_LIMIT {
            return Err(StayBuddyError::InvalidInput(format!(
                "The post text must fit in {} characters.",
                CAPTION_LIMIT
            )));
        }
        self.text = Some(text.to_string());
        self.stage = PostStage::Preview;
        Ok(())
    }

    /// Cover media and text once the draft is previewed.
    pub fn ready(&self) -> Option<(&MediaItem, &str)> {
        if self.stage != PostStage::Preview {
            return None;
        }
        Some((self.media.first()?, self.text.as_deref()?))
    }
}

/// Where the catalog-button message lives, stored as an event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogButtonPost {
    pub channel_id: i64,
    pub message_id: i32,
    pub catalog_url: String,
}

impl CatalogButtonPost {
    /// `None` when the payload is malformed or points nowhere.
    pub fn from_payload(payload: serde_json::Value) -> Option<Self> {
        let post: Self = serde_json::from_value(payload).ok()?;
        (post.channel_id != 0 && post.message_id != 0).then_some(post)
    }

    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "channel_id": self.channel_id,
            "message_id": self.message_id,
            "catalog_url": self.catalog_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn photo(id: &str) -> MediaItem {
        MediaItem::new(MediaKind::Photo, id)
    }

    #[test]
    fn test_draft_walks_media_text_preview() {
        let mut draft = ChannelPostDraft::new();
        assert_eq!(draft.add_media(photo("p1")).unwrap(), 1);
        assert_eq!(draft.add_media(MediaItem::new(MediaKind::Video, "v1")).unwrap(), 2);
        assert!(draft.ready().is_none());

        draft.finish_media().unwrap();
        assert_eq!(draft.stage(), PostStage::Text);
        draft.set_text("  New flat near the sea  ").unwrap();

        let (media, text) = draft.ready().unwrap();
        assert_eq!(media, &photo("p1"));
        assert_eq!(text, "New flat near the sea");
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        let mut draft = ChannelPostDraft::new();
        assert_matches!(
            draft.add_media(MediaItem::new(MediaKind::Document, "d1")),
            Err(StayBuddyError::InvalidInput(_))
        );
        assert_matches!(draft.finish_media(), Err(StayBuddyError::InvalidInput(_)));
        assert_matches!(draft.set_text("too early"), Err(StayBuddyError::InvalidInput(_)));

        draft.add_media(photo("p1")).unwrap();
        draft.finish_media().unwrap();
        assert_matches!(draft.add_media(photo("p2")), Err(StayBuddyError::InvalidInput(_)));
        assert_matches!(draft.set_text("   "), Err(StayBuddyError::InvalidInput(_)));
        assert_matches!(
            draft.set_text(&"x".repeat(CAPTION_LIMIT + 1)),
            Err(StayBuddyError::InvalidInput(_))
        );
        assert_eq!(draft.stage(), PostStage::Text);
        assert_eq!(draft.media_count(), 1);
    }

    #[test]
    fn test_catalog_post_payload() {
        let post = CatalogButtonPost {
            channel_id: -100123,
            message_id: 77,
            catalog_url: "https://t.me/stays/5".to_string(),
        };
        assert_eq!(CatalogButtonPost::from_payload(post.to_payload()), Some(post));
        assert_eq!(CatalogButtonPost::from_payload(serde_json::json!({})), None);
        assert_eq!(
            CatalogButtonPost::from_payload(serde_json::json!({
                "channel_id": -100123, "message_id": 0, "catalog_url": ""
            })),
            None
        );
    }
}
