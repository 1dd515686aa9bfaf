//! Listing wizard step table
//!
//! The wizard walks an ordered, static list of [`StepDescriptor`]s. Each step
//! names the field it fills and how input for it is validated.

use std::collections::HashSet;

use crate::utils::errors::{Result, StayBuddyError};

/// Field keys written by the listing wizard.
pub mod fields {
    pub const MEDIA_ITEMS: &str = "media_items";
    pub const HEADER_TEXT: &str = "header_text";
    pub const SHORT_DESC: &str = "short_desc";
    pub const QUOTE_DESC: &str = "quote_desc";
    pub const FEATURES_TEXT: &str = "features_text";
    pub const GUESTS_MAX: &str = "guests_max";
    pub const TAGS: &str = "tags";
    pub const MAP_URL: &str = "map_url";
}

/// Reserved choice value that switches a choice step into free-text entry.
pub const CUSTOM_CHOICE: &str = "custom";

/// One button of a single-choice step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub label: &'static str,
}

/// How a step reads its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    FreeText,
    /// Decimal digits only.
    Integer,
    /// Must start with `http://` or `https://`.
    Url,
    /// One of `choices`, or [`CUSTOM_CHOICE`] to type a value instead. The
    /// typed value goes to `custom_field` when set, else to the step's key.
    SingleChoice {
        choices: &'static [Choice],
        custom_field: Option<&'static str>,
    },
    /// Uploads and links accumulate until an explicit "done".
    MediaCollection,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            StepKind::FreeText => "free_text",
            StepKind::Integer => "integer",
            StepKind::Url => "url",
            StepKind::SingleChoice { .. } => "single_choice",
            StepKind::MediaCollection => "media_collection",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDescriptor {
    pub key: &'static str,
    /// Short name used in the preview.
    pub label: &'static str,
    pub kind: StepKind,
    pub prompt: &'static str,
    pub example: Option<&'static str>,
}

impl StepDescriptor {
    /// Whether `value` is a selectable option of this step.
    pub fn accepts_choice(&self, value: &str) -> bool {
        match self.kind {
            StepKind::SingleChoice { choices, .. } => {
                value == CUSTOM_CHOICE || choices.iter().any(|choice| choice.value == value)
            }
            _ => false,
        }
    }
}

pub static LISTING_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        key: fields::MEDIA_ITEMS,
        label: "Photos and videos",
        kind: StepKind::MediaCollection,
        prompt: "Upload every photo and video for the carousel",
        example: Some("Send one or more files, or links one per line. Then press \"Done with media\"."),
    },
    StepDescriptor {
        key: fields::HEADER_TEXT,
        label: "Header",
        kind: StepKind::FreeText,
        prompt: "Listing header (shown bold and underlined on the card)",
        example: Some("Panorama residence, 5 Harbour St\nOne-bedroom flat for 2-4 guests"),
    },
    StepDescriptor {
        key: fields::SHORT_DESC,
        label: "Description",
        kind: StepKind::FreeText,
        prompt: "Short description",
        example: Some("Cosy flat next to the park with a quick drive to the centre."),
    },
    StepDescriptor {
        key: fields::QUOTE_DESC,
        label: "Quote",
        kind: StepKind::FreeText,
        prompt: "Text for the quote block under the description",
        example: Some("Quiet courtyard, fast Wi-Fi, contactless check-in."),
    },
    StepDescriptor {
        key: fields::FEATURES_TEXT,
        label: "In the flat",
        kind: StepKind::FreeText,
        prompt: "What the flat has (also shown as a quote)",
        example: Some("Double bed, air conditioning, washing machine, kitchen."),
    },
    StepDescriptor {
        key: fields::GUESTS_MAX,
        label: "Max guests",
        kind: StepKind::Integer,
        prompt: "Maximum number of guests (digits)",
        example: Some("4"),
    },
    StepDescriptor {
        key: fields::TAGS,
        label: "Tags",
        kind: StepKind::FreeText,
        prompt: "Filter tags, comma separated",
        example: Some("parking,quiet,center,kids"),
    },
    StepDescriptor {
        key: fields::MAP_URL,
        label: "Map link",
        kind: StepKind::Url,
        prompt: "Map link",
        example: Some("https://maps.google.com/?q=55.75,37.61"),
    },
];

/// Check that a step table is usable: non-empty with unique keys.
pub fn validate_steps(steps: &[StepDescriptor]) -> Result<()> {
    if steps.is_empty() {
        return Err(StayBuddyError::Config("wizard step table is empty".to_string()));
    }
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step.key) {
            return Err(StayBuddyError::Config(format!(
                "duplicate wizard step key '{}'",
                step.key
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_table_is_valid() {
        assert!(validate_steps(LISTING_STEPS).is_ok());
        assert_eq!(LISTING_STEPS.len(), 8);
        assert_eq!(LISTING_STEPS[0].kind, StepKind::MediaCollection);
        assert_eq!(LISTING_STEPS[5].kind, StepKind::Integer);
        assert_eq!(LISTING_STEPS[7].kind, StepKind::Url);
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let steps = [LISTING_STEPS[1], LISTING_STEPS[1]];
        assert!(validate_steps(&steps).is_err());
        assert!(validate_steps(&[]).is_err());
    }

    #[test]
    fn test_accepts_choice() {
        const CHOICES: &[Choice] = &[Choice { value: "yes", label: "Yes" }];
        let step = StepDescriptor {
            key: "balcony",
            label: "Balcony",
            kind: StepKind::SingleChoice { choices: CHOICES, custom_field: None },
            prompt: "Balcony?",
            example: None,
        };
        assert!(step.accepts_choice("yes"));
        assert!(step.accepts_choice(CUSTOM_CHOICE));
        assert!(!step.accepts_choice("no"));
        assert!(!LISTING_STEPS[1].accepts_choice("yes"));
    }
}
