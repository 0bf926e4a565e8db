// Category filtering and search state for the visible message list

use std::fmt;
use std::str::FromStr;

use crate::error::ClientError;
use crate::models::{Message, MessageType};
use crate::store::MessageStore;

/// Which messages the list shows when no search is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Favorites,
    Type(MessageType),
}

impl CategoryFilter {
    pub fn matches(&self, message: &Message) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Favorites => message.is_favorite,
            CategoryFilter::Type(kind) => message.kind == *kind,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str("all"),
            CategoryFilter::Favorites => f.write_str("favorites"),
            CategoryFilter::Type(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(CategoryFilter::All),
            "favorites" => Ok(CategoryFilter::Favorites),
            other => other
                .parse::<MessageType>()
                .map(CategoryFilter::Type)
                .map_err(ClientError::Validation),
        }
    }
}

/// What currently drives the visible list. A search suspends the category
/// filter: results are shown as the server returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Category(CategoryFilter),
    Search(String),
}

impl Default for ViewMode {
    fn default() -> Self {
        ViewMode::Category(CategoryFilter::All)
    }
}

impl ViewMode {
    pub fn shows(&self, message: &Message) -> bool {
        match self {
            ViewMode::Category(filter) => filter.matches(message),
            ViewMode::Search(_) => true,
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(self, ViewMode::Search(_))
    }
}

/// The ordered subsequence of `store` accepted by `filter`.
pub fn filter<'a>(store: &'a MessageStore, filter: &CategoryFilter) -> Vec<&'a Message> {
    store.iter().filter(|m| filter.matches(m)).collect()
}

/// The ordered subsequence of `store` visible under `view`.
pub fn visible<'a>(store: &'a MessageStore, view: &ViewMode) -> Vec<&'a Message> {
    store.iter().filter(|m| view.shows(m)).collect()
}

/// Normalize raw search input. `None` means "leave search mode".
pub fn normalize_query(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
