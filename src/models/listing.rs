//! Listing (catalog item) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use crate::utils::errors::{Result, StayBuddyError};
use crate::utils::helpers::{first_line, is_http_url, parse_tags, truncate_text};

/// Kind of a media attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    Document,
    #[serde(rename = "url")]
    ExternalUrl,
}

impl MediaKind {
    /// Classify an uploaded document by its mime type.
    pub fn from_mime(mime: Option<&str>) -> Self {
        match mime {
            Some(m) if m.starts_with("image/") => MediaKind::Photo,
            Some(m) if m.starts_with("video/") => MediaKind::Video,
            _ => MediaKind::Document,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub value: String,
}

impl MediaItem {
    pub fn new(kind: MediaKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Structured card content stored as JSONB.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingDetails {
    pub header_text: String,
    pub short_desc: String,
    pub quote_desc: String,
    pub features_text: String,
    pub media_items: Vec<MediaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Listing {
    pub id: i64,
    pub title: String,
    pub address_short: String,
    pub guests_max: i32,
    pub amenities: String,
    pub tags: Vec<String>,
    pub price_from: i32,
    pub channel_post_url: String,
    pub map_url: String,
    pub is_active: bool,
    pub sort_order: i32,
    pub details_json: Json<ListingDetails>,
    pub media_urls: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn details(&self) -> &ListingDetails {
        &self.details_json.0
    }

    /// Header line for cards: the stored header, else the title.
    pub fn header(&self) -> &str {
        let header = self.details().header_text.trim();
        if header.is_empty() {
            &self.title
        } else {
            header
        }
    }

    /// Media in display order. Rows written before structured details existed
    /// only carry the flat URL list.
    pub fn media(&self) -> Vec<MediaItem> {
        let items = &self.details().media_items;
        if !items.is_empty() {
            return items.clone();
        }
        self.media_urls
            .iter()
            .map(|url| MediaItem::new(MediaKind::ExternalUrl, url.clone()))
            .collect()
    }
}

/// Fully assembled listing content ready to be inserted or to replace an
/// existing row. Sort order, active flag and channel post link are managed
/// separately and never touched by a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    pub address_short: String,
    pub guests_max: i32,
    pub amenities: String,
    pub tags: Vec<String>,
    pub map_url: String,
    pub details: ListingDetails,
    pub media_urls: Vec<String>,
}

pub const TITLE_MAX_CHARS: usize = 80;
pub const ADDRESS_MAX_CHARS: usize = 120;
pub const AMENITIES_MAX_CHARS: usize = 180;
pub const DEFAULT_GUESTS_MAX: i32 = 2;

impl ListingDraft {
    /// Derive the flat columns from the structured content.
    pub fn from_details(
        details: ListingDetails,
        guests_max: Option<i64>,
        tags: Vec<String>,
        map_url: String,
    ) -> Self {
        let header = first_line(&details.header_text).unwrap_or_default();
        let title = if header.is_empty() {
            "Listing".to_string()
        } else {
            truncate_text(header, TITLE_MAX_CHARS)
        };
        let address_short = if header.is_empty() {
            "Address not set".to_string()
        } else {
            truncate_text(header, ADDRESS_MAX_CHARS)
        };
        let amenities: String = details.short_desc.chars().take(AMENITIES_MAX_CHARS).collect();
        let guests_max = guests_max
            .map(|n| n.clamp(1, i64::from(i32::MAX)) as i32)
            .unwrap_or(DEFAULT_GUESTS_MAX);
        let media_urls = external_urls(&details.media_items);

        Self {
            title,
            address_short,
            guests_max,
            amenities,
            tags,
            map_url,
            details,
            media_urls,
        }
    }

    /// The flat URL list must equal the external-url subset of the media list.
    pub fn validate(&self) -> Result<()> {
        if self.media_urls != external_urls(&self.details.media_items) {
            return Err(StayBuddyError::InvalidInput(
                "media URL list is out of sync with media items".to_string(),
            ));
        }
        if self.guests_max < 1 {
            return Err(StayBuddyError::InvalidInput(
                "guest count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn external_urls(items: &[MediaItem]) -> Vec<String> {
    items
        .iter()
        .filter(|item| item.kind == MediaKind::ExternalUrl)
        .map(|item| item.value.clone())
        .collect()
}

/// Listing columns an operator may edit one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingField {
    SortOrder,
    Tags,
    ChannelPostUrl,
    MapUrl,
}

impl ListingField {
    pub const ALL: [ListingField; 4] = [
        ListingField::SortOrder,
        ListingField::Tags,
        ListingField::ChannelPostUrl,
        ListingField::MapUrl,
    ];

    pub fn code(self) -> &'static str {
        match self {
            ListingField::SortOrder => "sort_order",
            ListingField::Tags => "tags",
            ListingField::ChannelPostUrl => "channel_post_url",
            ListingField::MapUrl => "map_url",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.code() == code)
    }

    pub fn label(self) -> &'static str {
        match self {
            ListingField::SortOrder => "Sort order",
            ListingField::Tags => "Tags",
            ListingField::ChannelPostUrl => "Channel post link",
            ListingField::MapUrl => "Map link",
        }
    }
}

/// A parsed operator edit for one [`ListingField`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingFieldValue {
    SortOrder(i32),
    Tags(Vec<String>),
    ChannelPostUrl(String),
    MapUrl(String),
}

impl ListingFieldValue {
    /// Parse operator text for `field`. A lone `-` clears a link.
    pub fn parse(field: ListingField, raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match field {
            ListingField::SortOrder => raw
                .parse::<i32>()
                .map(ListingFieldValue::SortOrder)
                .map_err(|_| StayBuddyError::InvalidInput("sort order must be an integer".to_string())),
            ListingField::Tags => Ok(ListingFieldValue::Tags(parse_tags(raw))),
            ListingField::ChannelPostUrl => link_value(raw).map(ListingFieldValue::ChannelPostUrl),
            ListingField::MapUrl => link_value(raw).map(ListingFieldValue::MapUrl),
        }
    }

    pub fn field(&self) -> ListingField {
        match self {
            ListingFieldValue::SortOrder(_) => ListingField::SortOrder,
            ListingFieldValue::Tags(_) => ListingField::Tags,
            ListingFieldValue::ChannelPostUrl(_) => ListingField::ChannelPostUrl,
            ListingFieldValue::MapUrl(_) => ListingField::MapUrl,
        }
    }
}

fn link_value(raw: &str) -> Result<String> {
    if raw == "-" {
        return Ok(String::new());
    }
    if is_http_url(raw) {
        Ok(raw.to_string())
    } else {
        Err(StayBuddyError::InvalidInput(
            "link must start with http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_classification() {
        assert_eq!(MediaKind::from_mime(Some("image/png")), MediaKind::Photo);
        assert_eq!(MediaKind::from_mime(Some("video/mp4")), MediaKind::Video);
        assert_eq!(MediaKind::from_mime(Some("application/pdf")), MediaKind::Document);
        assert_eq!(MediaKind::from_mime(None), MediaKind::Document);
    }

    #[test]
    fn test_media_item_json_shape() {
        let item = MediaItem::new(MediaKind::ExternalUrl, "https://img.example/1.jpg");
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "url", "value": "https://img.example/1.jpg"}));
    }

    #[test]
    fn test_draft_derives_flat_columns() {
        let details = ListingDetails {
            header_text: format!("{}\nsecond line", "A".repeat(100)),
            short_desc: "d".repeat(200),
            media_items: vec![
                MediaItem::new(MediaKind::Photo, "file-1"),
                MediaItem::new(MediaKind::ExternalUrl, "https://img.example/2.jpg"),
            ],
            ..Default::default()
        };
        let draft = ListingDraft::from_details(details, Some(0), vec!["quiet".into()], String::new());

        assert_eq!(draft.title.chars().count(), 80);
        assert!(draft.title.ends_with("..."));
        assert_eq!(draft.address_short, "A".repeat(100));
        assert_eq!(draft.amenities.chars().count(), 180);
        assert_eq!(draft.guests_max, 1);
        assert_eq!(draft.media_urls, vec!["https://img.example/2.jpg".to_string()]);
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_draft_defaults() {
        let draft = ListingDraft::from_details(ListingDetails::default(), None, vec![], String::new());
        assert_eq!(draft.title, "Listing");
        assert_eq!(draft.address_short, "Address not set");
        assert_eq!(draft.guests_max, DEFAULT_GUESTS_MAX);
    }

    #[test]
    fn test_out_of_sync_media_rejected() {
        let mut draft = ListingDraft::from_details(ListingDetails::default(), None, vec![], String::new());
        draft.media_urls.push("https://stray.example".to_string());
        assert!(draft.validate().is_err());
    }

    #[test]
    fn test_listing_field_codes() {
        for field in ListingField::ALL {
            assert_eq!(ListingField::parse(field.code()), Some(field));
        }
        assert_eq!(ListingField::parse("title"), None);
    }

    #[test]
    fn test_field_value_parsing() {
        assert_eq!(
            ListingFieldValue::parse(ListingField::SortOrder, " 12 ").ok(),
            Some(ListingFieldValue::SortOrder(12))
        );
        assert!(ListingFieldValue::parse(ListingField::SortOrder, "first").is_err());
        assert_eq!(
            ListingFieldValue::parse(ListingField::MapUrl, "-").ok(),
            Some(ListingFieldValue::MapUrl(String::new()))
        );
        assert!(ListingFieldValue::parse(ListingField::ChannelPostUrl, "t.me/x").is_err());
        let tags = ListingFieldValue::parse(ListingField::Tags, "Parking, Quiet").expect("tags");
        assert_eq!(tags.field(), ListingField::Tags);
    }
}
