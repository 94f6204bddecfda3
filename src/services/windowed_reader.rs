use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::{AttributeValue, CanonicalItem, Clock, SystemClock};
use crate::errors::FeederResult;
use crate::storage::traits::{IndexQuery, ItemStore};

pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Reads the items published in the last few days from the secondary index
pub struct WindowedReader<S: ItemStore> {
    store: S,
    clock: Arc<dyn Clock>,
    page_size: usize,
}

impl<S: ItemStore> WindowedReader<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Items of `category` published within `[now - days, now]`
    pub fn recent(&self, days: u32, category: &str, table: &str) -> FeederResult<Vec<CanonicalItem>> {
        self.recent_at(self.clock.now(), days, category, table)
    }

    pub fn recent_at(
        &self,
        now: i64,
        days: u32,
        category: &str,
        table: &str,
    ) -> FeederResult<Vec<CanonicalItem>> {
        let query = IndexQuery {
            category: category.to_string(),
            start: now - i64::from(days) * SECONDS_PER_DAY,
            end: now,
            limit: self.page_size,
        };

        let mut items = Vec::new();
        let mut cursor = None;
        let mut pages = 0;

        // Keep following the cursor; a single page may not hold the window
        loop {
            let page = self.store.query_index(table, &query, cursor)?;
            pages += 1;
            debug!(table, page = pages, items = page.items.len(), "Read index page");

            // A stored record that is not a full item must not hide the rest
            for attributes in &page.items {
                match CanonicalItem::from_attributes(attributes) {
                    Ok(item) => items.push(item),
                    Err(e) => {
                        let link = attributes
                            .get("link")
                            .and_then(AttributeValue::as_text)
                            .unwrap_or("-");
                        warn!(table, link, error = %e, "Skipping undecodable item");
                    }
                }
            }

            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        info!(
            table,
            category,
            days,
            start = query.start,
            end = query.end,
            items = items.len(),
            "Window read"
        );

        Ok(items)
    }
}
