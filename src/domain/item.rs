use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::attributes::{AttributeMap, AttributeValue};
use crate::errors::{FeederError, FeederResult};

/// Items become eligible for expiry 14 days after publication
pub const TTL_WINDOW_SECS: i64 = 14 * 24 * 60 * 60;

/// Slot counter wraps after this value and bumps the group
const LAST_SLOT: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalItem {
    pub id: String,
    pub link: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub published_datetime: i64,
    pub ttl: i64,
}

impl CanonicalItem {
    pub fn new(
        id: impl Into<String>,
        link: impl Into<String>,
        category: impl Into<String>,
        published_datetime: i64,
    ) -> Self {
        Self {
            id: id.into(),
            link: link.into(),
            category: category.into(),
            title: None,
            summary: None,
            published_datetime,
            ttl: published_datetime + TTL_WINDOW_SECS,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_summary(mut self, summary: Option<String>) -> Self {
        self.summary = summary;
        self
    }

    /// Persisted form. Absent optional fields are left out entirely.
    pub fn to_attributes(&self) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        attributes.insert("id".to_string(), self.id.as_str().into());
        attributes.insert("link".to_string(), self.link.as_str().into());
        attributes.insert("category".to_string(), self.category.as_str().into());
        if let Some(title) = &self.title {
            attributes.insert("title".to_string(), title.as_str().into());
        }
        if let Some(summary) = &self.summary {
            attributes.insert("summary".to_string(), summary.as_str().into());
        }
        attributes.insert(
            "published_datetime".to_string(),
            self.published_datetime.into(),
        );
        attributes.insert("ttl".to_string(), self.ttl.into());
        attributes
    }

    pub fn from_attributes(attributes: &AttributeMap) -> FeederResult<Self> {
        let text = |name: &str| -> FeederResult<String> {
            attributes
                .get(name)
                .and_then(AttributeValue::as_text)
                .map(str::to_string)
                .ok_or_else(|| FeederError::Query(format!("stored item has no text attribute '{}'", name)))
        };
        let number = |name: &str| -> FeederResult<i64> {
            attributes
                .get(name)
                .and_then(AttributeValue::as_i64)
                .ok_or_else(|| FeederError::Query(format!("stored item has no numeric attribute '{}'", name)))
        };
        let optional_text = |name: &str| {
            attributes
                .get(name)
                .and_then(AttributeValue::as_text)
                .map(str::to_string)
        };

        Ok(Self {
            id: text("id")?,
            link: text("link")?,
            category: text("category")?,
            title: optional_text("title"),
            summary: optional_text("summary"),
            published_datetime: number("published_datetime")?,
            ttl: number("ttl")?,
        })
    }
}

/// Running position of an entry within one ingestion run.
///
/// Ids are `{run date}{feed index}{group}{slot}`. The slot cycles 0-9 and the
/// group increments on every wrap, so ids are only distinct within one run
/// and only for a bounded number of entries per feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCursor {
    pub feed_index: u32,
    pub group: u32,
    pub slot: u32,
}

impl IdCursor {
    /// Counters as they stand before the first entry of a feed
    pub fn for_feed(feed_index: u32) -> Self {
        Self {
            feed_index,
            group: 0,
            slot: 1,
        }
    }

    pub fn format_id(&self, run_date: NaiveDate) -> String {
        format!(
            "{}{}{}{}",
            run_date.format("%Y%m%d"),
            self.feed_index,
            self.group,
            self.slot
        )
    }

    pub fn advance(self) -> Self {
        if self.slot == LAST_SLOT {
            Self {
                group: self.group + 1,
                slot: 0,
                ..self
            }
        } else {
            Self {
                slot: self.slot + 1,
                ..self
            }
        }
    }
}
