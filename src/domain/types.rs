//! Identifier newtypes and enumerations shared across layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity boundary (a site or tenant) that render-cache keys are derived for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeId(String);

impl ScopeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a single configured widget, e.g. `category-posts-3`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetInstanceId(String);

impl WidgetInstanceId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Field a category listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Date,
    Title,
    CommentCount,
    #[serde(alias = "rand")]
    Random,
}

impl SortField {
    pub const ALL: [SortField; 4] = [
        SortField::Date,
        SortField::Title,
        SortField::CommentCount,
        SortField::Random,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Title => "title",
            SortField::CommentCount => "comment_count",
            SortField::Random => "rand",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortField::Date => "Date",
            SortField::Title => "Title",
            SortField::CommentCount => "Number of comments",
            SortField::Random => "Random",
        }
    }

    /// Parse a submitted sort value; `random` and the legacy `rand` are both accepted.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "date" => Some(SortField::Date),
            "title" => Some(SortField::Title),
            "comment_count" => Some(SortField::CommentCount),
            "rand" | "random" => Some(SortField::Random),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Resolved ordering handed to the content query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, ascending: bool) -> Self {
        let direction = if ascending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        Self { field, direction }
    }

    pub fn is_ascending(&self) -> bool {
        self.direction == SortDirection::Ascending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_field_accepts_legacy_rand() {
        assert_eq!(SortField::parse("rand"), Some(SortField::Random));
        assert_eq!(SortField::parse("random"), Some(SortField::Random));
        assert_eq!(SortField::parse(" title "), Some(SortField::Title));
        assert_eq!(SortField::parse("menu_order"), None);
    }

    #[test]
    fn sort_field_deserializes_alias() {
        let field: SortField = serde_json::from_str("\"rand\"").expect("rand alias");
        assert_eq!(field, SortField::Random);
        let field: SortField = serde_json::from_str("\"comment_count\"").expect("snake case");
        assert_eq!(field, SortField::CommentCount);
    }

    #[test]
    fn sort_order_direction() {
        assert!(SortOrder::new(SortField::Title, true).is_ascending());
        assert!(!SortOrder::new(SortField::Title, false).is_ascending());
        assert_eq!(SortOrder::default().field, SortField::Date);
        assert!(!SortOrder::default().is_ascending());
    }
}
