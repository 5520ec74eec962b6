//! Conversation state for the guided flows.

use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Draft of a community place submission, filled in step by step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceDraft {
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub price_level: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum BotDialogueState {
    #[default]
    Idle,

    // Guided search: category, then price, then minimum rating.
    SearchSelectingCategory,
    SearchSelectingPrice {
        category: Option<String>,
    },
    SearchSelectingRating {
        category: Option<String>,
        price: Option<String>,
    },
    // Free-text search.
    AwaitingSearchQuery,
    // Paging through a result list with the "next" button.
    Browsing {
        place_ids: Vec<String>,
        index: usize,
    },

    // Rating input for one place card.
    AwaitingRating {
        place_id: String,
    },

    // Place submission flow.
    AddAwaitingName,
    AddSelectingCategory {
        name: String,
    },
    AddAwaitingAddress {
        name: String,
        category: Option<String>,
    },
    AddAwaitingDescription {
        name: String,
        category: Option<String>,
        address: Option<String>,
    },
    AddSelectingPrice {
        name: String,
        category: Option<String>,
        address: Option<String>,
        description: Option<String>,
    },
    AddAwaitingConfirm {
        draft: PlaceDraft,
    },
}

pub type BotDialogue = Dialogue<BotDialogueState, InMemStorage<BotDialogueState>>;

pub const MAX_PLACE_NAME_LENGTH: usize = 255;

/// Validate a user-typed place name; returns the trimmed name.
pub fn validate_place_name(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_PLACE_NAME_LENGTH {
        return None;
    }
    Some(trimmed.to_string())
}

/// A free-text field: trimmed, `None` when the user sent "-" to skip.
pub fn optional_field(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed == "-" {
        None
    } else {
        Some(trimmed.to_string())
    }
}
