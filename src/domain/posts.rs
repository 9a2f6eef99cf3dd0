//! Presentation rules for listed posts: dates, comment labels, excerpts.

use std::collections::HashSet;

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

/// Number of words kept when an excerpt is derived from post content.
pub const DEFAULT_EXCERPT_LENGTH: usize = 55;
/// Marker appended to a derived excerpt that was cut short.
pub const EXCERPT_MORE: &str = " [&hellip;]";

pub const POST_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year]");

/// Format a publication date as `5 Mar 2024`.
pub fn format_post_date(value: OffsetDateTime) -> String {
    value
        .format(POST_DATE_FORMAT)
        .unwrap_or_else(|_| value.date().to_string())
}

/// Human label for a comment count: `No Comments`, `1 Comment`, `1,204 Comments`.
pub fn comment_count_label(count: u64) -> String {
    match count {
        0 => "No Comments".to_string(),
        1 => "1 Comment".to_string(),
        n => format!("{} Comments", group_thousands(n)),
    }
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Strip all markup from an HTML fragment, leaving escaped text that is safe to embed.
///
/// The contents of `script` and `style` elements are dropped entirely.
pub fn plain_text(html: &str) -> String {
    let mut builder = ammonia::Builder::empty();
    builder.clean_content_tags(HashSet::from(["script", "style"]));
    builder.clean(html).to_string()
}

/// Keep at most `limit` whitespace-separated words, appending `more` when text was dropped.
pub fn trim_words(text: &str, limit: usize, more: &str) -> String {
    let mut words = text.split_whitespace();
    let kept: Vec<&str> = words.by_ref().take(limit).collect();
    let mut trimmed = kept.join(" ");
    if words.next().is_some() {
        trimmed.push_str(more);
    }
    trimmed
}

/// Excerpt shown under a listed post.
///
/// A hand-written excerpt is used as-is (minus markup); otherwise the post
/// content is stripped and trimmed to `length` words.
pub fn excerpt_for(manual: &str, content_html: &str, length: usize) -> String {
    if !manual.trim().is_empty() {
        return plain_text(manual).trim().to_string();
    }
    trim_words(&plain_text(content_html), length, EXCERPT_MORE)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn formats_dates_without_padding() {
        assert_eq!(format_post_date(datetime!(2024-03-05 10:00 UTC)), "5 Mar 2024");
        assert_eq!(format_post_date(datetime!(2023-12-25 0:00 UTC)), "25 Dec 2023");
    }

    #[test]
    fn comment_labels_follow_plural_rules() {
        assert_eq!(comment_count_label(0), "No Comments");
        assert_eq!(comment_count_label(1), "1 Comment");
        assert_eq!(comment_count_label(2), "2 Comments");
        assert_eq!(comment_count_label(1204), "1,204 Comments");
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn trims_to_word_limit() {
        assert_eq!(trim_words("one two three four", 2, "…"), "one two…");
        assert_eq!(trim_words("one  two\nthree", 5, "…"), "one two three");
        assert_eq!(trim_words("", 3, "…"), "");
    }

    #[test]
    fn plain_text_strips_markup_and_scripts() {
        let text = plain_text("<p>Hello <strong>world</strong></p><script>alert(1)</script>");
        assert_eq!(text, "Hello world");
        assert_eq!(plain_text("fish &amp; chips"), "fish &amp; chips");
        assert_eq!(plain_text("1 < 2"), "1 &lt; 2");
    }

    #[test]
    fn manual_excerpt_wins_over_content() {
        let excerpt = excerpt_for("  Short <em>teaser</em> ", "<p>Long body text</p>", 1);
        assert_eq!(excerpt, "Short teaser");
    }

    #[test]
    fn derived_excerpt_is_trimmed() {
        let excerpt = excerpt_for("", "<p>alpha beta gamma delta</p>", 3);
        assert_eq!(excerpt, "alpha beta gamma [&hellip;]");

        let excerpt = excerpt_for("", "<p>alpha beta</p>", 3);
        assert_eq!(excerpt, "alpha beta");
    }
}
