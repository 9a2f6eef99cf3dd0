//! Per-instance settings of the category posts widget.

use std::collections::BTreeMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;
use super::posts::DEFAULT_EXCERPT_LENGTH;
use super::types::{SortField, SortOrder};

const DEFAULT_POST_COUNT: u32 = 5;
const DEFAULT_THUMBNAIL_EDGE: u32 = 150;

/// Submitted form values keyed by field name.
pub type RawSettings = BTreeMap<String, String>;

/// Form field names as submitted by the settings form.
pub mod fields {
    pub const TITLE: &str = "title";
    pub const CATEGORY: &str = "cat";
    pub const COUNT: &str = "num";
    pub const SORT_BY: &str = "sort_by";
    pub const ASCENDING: &str = "asc_sort_order";
    pub const TITLE_LINK: &str = "title_link";
    pub const SHOW_EXCERPT: &str = "excerpt";
    pub const EXCERPT_LENGTH: &str = "excerpt_length";
    pub const SHOW_COMMENT_COUNT: &str = "comment_num";
    pub const SHOW_DATE: &str = "date";
    pub const SHOW_THUMBNAIL: &str = "thumb";
    pub const THUMBNAIL_WIDTH: &str = "thumb_w";
    pub const THUMBNAIL_HEIGHT: &str = "thumb_h";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: NonZeroU32,
    pub height: NonZeroU32,
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        let edge = NonZeroU32::new(DEFAULT_THUMBNAIL_EDGE).unwrap_or(NonZeroU32::MIN);
        Self {
            width: edge,
            height: edge,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetInstanceSettings {
    /// Heading text; the category name is used when empty.
    pub title: String,
    /// Category to list; `None` lists every category.
    pub category_id: Option<Uuid>,
    pub count: NonZeroU32,
    pub sort_by: SortField,
    pub ascending: bool,
    pub title_link: bool,
    pub show_excerpt: bool,
    /// Excerpt length in words; zero selects the host default.
    pub excerpt_length: u32,
    pub show_comment_count: bool,
    pub show_date: bool,
    pub show_thumbnail: bool,
    pub thumbnail: ThumbnailSize,
}

impl Default for WidgetInstanceSettings {
    fn default() -> Self {
        Self {
            title: String::new(),
            category_id: None,
            count: NonZeroU32::new(DEFAULT_POST_COUNT).unwrap_or(NonZeroU32::MIN),
            sort_by: SortField::Date,
            ascending: false,
            title_link: false,
            show_excerpt: false,
            excerpt_length: 0,
            show_comment_count: false,
            show_date: false,
            show_thumbnail: false,
            thumbnail: ThumbnailSize::default(),
        }
    }
}

impl WidgetInstanceSettings {
    /// Build settings from a submitted form.
    ///
    /// Unknown sort fields fall back to newest-first ordering. Blank numeric
    /// fields take their defaults; zero counts and dimensions are rejected.
    pub fn from_form(raw: &RawSettings) -> Result<Self, DomainError> {
        let defaults = Self::default();

        let title = text(raw, fields::TITLE).unwrap_or_default().to_string();

        let category_id = match text(raw, fields::CATEGORY) {
            None | Some("0") => None,
            Some(value) => Some(Uuid::parse_str(value).map_err(|err| {
                DomainError::validation(fields::CATEGORY, format!("`{value}` is not a category id: {err}"))
            })?),
        };

        let count = match text(raw, fields::COUNT) {
            None => defaults.count,
            Some(value) => non_zero(fields::COUNT, value)?,
        };

        let (sort_by, ascending) = match text(raw, fields::SORT_BY).and_then(SortField::parse) {
            Some(field) => (field, checkbox(raw, fields::ASCENDING)),
            None => (SortField::Date, false),
        };

        let excerpt_length = match text(raw, fields::EXCERPT_LENGTH) {
            None => 0,
            Some(value) => value.parse::<u32>().map_err(|err| {
                DomainError::validation(fields::EXCERPT_LENGTH, format!("`{value}`: {err}"))
            })?,
        };

        let width = match text(raw, fields::THUMBNAIL_WIDTH) {
            None => defaults.thumbnail.width,
            Some(value) => non_zero(fields::THUMBNAIL_WIDTH, value)?,
        };
        let height = match text(raw, fields::THUMBNAIL_HEIGHT) {
            None => defaults.thumbnail.height,
            Some(value) => non_zero(fields::THUMBNAIL_HEIGHT, value)?,
        };

        Ok(Self {
            title,
            category_id,
            count,
            sort_by,
            ascending,
            title_link: checkbox(raw, fields::TITLE_LINK),
            show_excerpt: checkbox(raw, fields::SHOW_EXCERPT),
            excerpt_length,
            show_comment_count: checkbox(raw, fields::SHOW_COMMENT_COUNT),
            show_date: checkbox(raw, fields::SHOW_DATE),
            show_thumbnail: checkbox(raw, fields::SHOW_THUMBNAIL),
            thumbnail: ThumbnailSize { width, height },
        })
    }

    pub fn sort_order(&self) -> SortOrder {
        SortOrder::new(self.sort_by, self.ascending)
    }

    pub fn effective_excerpt_length(&self) -> usize {
        match self.excerpt_length {
            0 => DEFAULT_EXCERPT_LENGTH,
            words => usize::try_from(words).unwrap_or(usize::MAX),
        }
    }
}

fn text<'a>(raw: &'a RawSettings, field: &str) -> Option<&'a str> {
    raw.get(field)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn checkbox(raw: &RawSettings, field: &str) -> bool {
    match raw.get(field).map(|value| value.trim()) {
        None | Some("") | Some("0") => false,
        Some(value) => !value.eq_ignore_ascii_case("off") && !value.eq_ignore_ascii_case("false"),
    }
}

fn non_zero(field: &'static str, value: &str) -> Result<NonZeroU32, DomainError> {
    let parsed = value
        .parse::<u32>()
        .map_err(|err| DomainError::validation(field, format!("`{value}`: {err}")))?;
    NonZeroU32::new(parsed).ok_or_else(|| DomainError::validation(field, "must be greater than zero"))
}
