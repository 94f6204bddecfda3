use chrono::NaiveDate;
use scraper::Html;

use crate::domain::{CanonicalItem, IdCursor, RawEntry};
use crate::errors::{FeederError, FeederResult};

/// Turns raw feed entries into canonical items for one category
pub struct ItemNormalizer {
    category: String,
}

impl ItemNormalizer {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
        }
    }

    /// Normalize one entry at the position given by `cursor`.
    ///
    /// Returns the item together with the cursor for the next entry of the
    /// same feed. A failed entry leaves the caller's cursor untouched.
    pub fn normalize(
        &self,
        entry: &RawEntry,
        cursor: IdCursor,
        run_date: NaiveDate,
    ) -> FeederResult<(CanonicalItem, IdCursor)> {
        let published = entry.published.ok_or_else(|| {
            FeederError::MalformedTimestamp(format!("no publish time on '{}'", entry.label()))
        })?;

        let link = non_empty(entry.link.as_deref())
            .ok_or_else(|| FeederError::MissingLink(entry.label().to_string()))?;

        let title = non_empty(entry.title.as_deref());
        let summary = entry
            .summary
            .as_deref()
            .map(html_to_text)
            .filter(|s| !s.is_empty());

        let item = CanonicalItem::new(
            cursor.format_id(run_date),
            link,
            self.category.as_str(),
            published.timestamp(),
        )
        .with_title(title)
        .with_summary(summary);

        Ok((item, cursor.advance()))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extract visible text from HTML, collapsing whitespace
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_fragment(html);
    let mut text = String::new();

    for node in document.root_element().descendants() {
        if let Some(text_node) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|parent| parent.value().as_element().map(|e| e.name()))
                .is_some_and(|name| matches!(name, "script" | "style"));
            if !hidden {
                text.push_str(text_node);
            }
        }
        // Add space before block elements to preserve word boundaries
        if let Some(element) = node.value().as_element() {
            match element.name() {
                "p" | "br" | "div" | "li" | "ul" | "ol" | "tr" | "td" | "th" | "blockquote"
                | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "article" | "section" => {
                    text.push(' ')
                }
                _ => {}
            }
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
