//! Promo code model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::errors::StayBuddyError;

/// Pool a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    Welcome,
    Giveaway,
    Manual,
    ReferralReward,
}

impl PromoKind {
    pub const ALL: [PromoKind; 4] = [
        PromoKind::Welcome,
        PromoKind::Giveaway,
        PromoKind::Manual,
        PromoKind::ReferralReward,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromoKind::Welcome => "welcome",
            PromoKind::Giveaway => "giveaway",
            PromoKind::Manual => "manual",
            PromoKind::ReferralReward => "referral_reward",
        }
    }
}

impl fmt::Display for PromoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromoKind {
    type Err = StayBuddyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| {
                StayBuddyError::InvalidInput(format!(
                    "unknown promo kind '{}', expected one of: welcome, giveaway, manual, referral_reward",
                    s.trim()
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoCode {
    pub id: i64,
    pub code: String,
    pub kind: String,
    pub is_assigned: bool,
    pub assigned_to: Option<i64>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Per-kind pool counters for the admin screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PromoPoolSummary {
    pub kind: String,
    pub total: i64,
    pub free: i64,
}

/// Parse `CODE|KIND` as typed by an operator.
pub fn parse_code_line(line: &str) -> Result<(String, PromoKind), StayBuddyError> {
    let (code, kind) = line.split_once('|').ok_or_else(|| {
        StayBuddyError::InvalidInput("expected CODE|KIND".to_string())
    })?;
    let code = code.trim();
    if code.is_empty() {
        return Err(StayBuddyError::InvalidInput("code must not be empty".to_string()));
    }
    Ok((code.to_string(), kind.parse()?))
}

/// Parse a bulk upload: first line is the kind, every further non-empty line a code.
pub fn parse_bulk_upload(text: &str) -> Result<(PromoKind, Vec<String>), StayBuddyError> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let kind: PromoKind = lines
        .next()
        .ok_or_else(|| StayBuddyError::InvalidInput("empty upload".to_string()))?
        .parse()?;
    let codes: Vec<String> = lines.map(str::to_string).collect();
    if codes.is_empty() {
        return Err(StayBuddyError::InvalidInput("no codes after the kind line".to_string()));
    }
    Ok((kind, codes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_kind_round_trip_and_case() {
        assert_eq!("Referral_Reward".parse::<PromoKind>().ok(), Some(PromoKind::ReferralReward));
        assert_matches!("gold".parse::<PromoKind>(), Err(StayBuddyError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_code_line() {
        let (code, kind) = parse_code_line(" SUMMER10 | welcome").expect("valid line");
        assert_eq!(code, "SUMMER10");
        assert_eq!(kind, PromoKind::Welcome);
        assert!(parse_code_line("SUMMER10").is_err());
        assert!(parse_code_line(" |manual").is_err());
    }

    #[test]
    fn test_parse_bulk_upload() {
        let (kind, codes) = parse_bulk_upload("giveaway\nA1\n\n B2 \n").expect("valid upload");
        assert_eq!(kind, PromoKind::Giveaway);
        assert_eq!(codes, vec!["A1", "B2"]);
        assert!(parse_bulk_upload("manual\n").is_err());
        assert!(parse_bulk_upload("").is_err());
    }
}
