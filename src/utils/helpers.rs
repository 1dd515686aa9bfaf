//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use uuid::Uuid;

/// Generate a referral code: `u` followed by eight hex characters.
pub fn generate_ref_code() -> String {
    let simple = Uuid::new_v4().simple().to_string();
    format!("u{}", &simple[..8])
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// First non-empty line of a text block, trimmed.
pub fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

/// Create a pagination info string
pub fn create_pagination_info(current_page: u32, total_pages: u32, total_items: i64) -> String {
    if total_pages <= 1 {
        format!("Total: {}", total_items)
    } else {
        format!("Page {} of {} (Total: {})", current_page, total_pages, total_items)
    }
}

/// Calculate pagination offset for a 1-based page number
pub fn calculate_offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

/// Number of pages needed for `total` items, never less than one.
pub fn total_pages(total: i64, page_size: u32) -> u32 {
    if page_size == 0 || total <= 0 {
        return 1;
    }
    let size = i64::from(page_size);
    u32::try_from((total + size - 1) / size).unwrap_or(u32::MAX)
}

static PHONE_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\d+]").expect("valid regex"));
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\D").expect("valid regex"));

/// Normalize a phone number into `+<digits>` form. A leading trunk `8` becomes `+7`.
pub fn normalize_phone(phone: &str) -> String {
    let mut cleaned = PHONE_NOISE.replace_all(phone.trim(), "").into_owned();
    if let Some(rest) = cleaned.strip_prefix('8') {
        cleaned = format!("+7{}", rest);
    }
    if !cleaned.is_empty() && !cleaned.starts_with('+') {
        cleaned.insert(0, '+');
    }
    cleaned
}

/// `tel:` link for a configured phone number.
pub fn tel_link(phone: &str) -> Option<String> {
    let normalized = normalize_phone(phone);
    if normalized.is_empty() || normalized == "+" {
        None
    } else {
        Some(format!("tel:{}", normalized))
    }
}

/// Telegram link for a username given with or without `@`.
pub fn telegram_link(username: &str) -> Option<String> {
    let username = username.trim().trim_start_matches('@');
    if username.is_empty() {
        None
    } else {
        Some(format!("https://t.me/{}", username))
    }
}

/// WhatsApp chat link. Full URLs pass through; bare numbers become `wa.me` links.
pub fn whatsapp_link(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if is_http_url(value) {
        return Some(value.to_string());
    }
    let mut digits = NON_DIGITS.replace_all(value, "").into_owned();
    if digits.is_empty() {
        return None;
    }
    if let Some(rest) = digits.strip_prefix('8') {
        digits = format!("7{}", rest);
    }
    Some(format!("https://wa.me/{}", digits))
}

/// True when the text starts with an `http://` or `https://` scheme prefix.
pub fn is_http_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Split a comma separated tag list into trimmed, lowercased, non-empty tags.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
        assert_eq!(truncate_text("квартира у моря", 8), "квартира".chars().take(5).collect::<String>() + "...");
    }

    #[test]
    fn test_ref_code_shape() {
        let code = generate_ref_code();
        assert_eq!(code.len(), 9);
        assert!(code.starts_with('u'));
        assert!(code[1..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(code, generate_ref_code());
    }

    #[test]
    fn test_pagination_math() {
        assert_eq!(calculate_offset(1, 5), 0);
        assert_eq!(calculate_offset(3, 5), 10);
        assert_eq!(calculate_offset(0, 5), 0);
        assert_eq!(total_pages(0, 5), 1);
        assert_eq!(total_pages(5, 5), 1);
        assert_eq!(total_pages(6, 5), 2);
        assert_eq!(create_pagination_info(2, 3, 12), "Page 2 of 3 (Total: 12)");
        assert_eq!(create_pagination_info(1, 1, 4), "Total: 4");
    }

    #[test]
    fn test_contact_links() {
        assert_eq!(normalize_phone("8 (900) 123-45-67"), "+79001234567");
        assert_eq!(tel_link("+1 555 0100").as_deref(), Some("tel:+15550100"));
        assert_eq!(tel_link("  "), None);
        assert_eq!(telegram_link("@host").as_deref(), Some("https://t.me/host"));
        assert_eq!(whatsapp_link("8 900 123 45 67").as_deref(), Some("https://wa.me/79001234567"));
        assert_eq!(whatsapp_link("https://wa.me/1").as_deref(), Some("https://wa.me/1"));
        assert_eq!(whatsapp_link("none"), None);
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("Parking, quiet,,  KIDS "), vec!["parking", "quiet", "kids"]);
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_first_line() {
        assert_eq!(first_line("\n  Sea view flat \nsecond"), Some("Sea view flat"));
        assert_eq!(first_line("   "), None);
    }
}
