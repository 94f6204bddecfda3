use chrono::NaiveDate;
use tracing::{error, info, warn};

use crate::domain::{CanonicalItem, IdCursor};
use crate::errors::{FeederError, FeederResult};
use crate::services::normalizer::ItemNormalizer;
use crate::sources::FeedSource;

/// What to do when a whole feed cannot be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the run; no batch is produced
    #[default]
    Abort,
    /// Record the failure and carry on with the remaining feeds
    Isolate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Only the first N entries of each feed are taken
    pub entries_per_feed: usize,
    pub failure_policy: FailurePolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            entries_per_feed: 1,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

#[derive(Debug)]
pub struct SkippedEntry {
    pub location: String,
    pub entry: String,
    pub error: FeederError,
}

#[derive(Debug)]
pub struct FeedFailure {
    pub location: String,
    pub error: FeederError,
}

/// Result of one ingestion run. `items` is in feed-then-slot order.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub items: Vec<CanonicalItem>,
    pub skipped: Vec<SkippedEntry>,
    pub failures: Vec<FeedFailure>,
}

pub struct IngestionService<S: FeedSource> {
    source: S,
    normalizer: ItemNormalizer,
    options: IngestOptions,
}

impl<S: FeedSource> IngestionService<S> {
    pub fn new(source: S, normalizer: ItemNormalizer, options: IngestOptions) -> Self {
        Self {
            source,
            normalizer,
            options,
        }
    }

    /// Run one ingestion pass over `locations`, strictly in the given order
    pub fn run(&self, locations: &[String], run_date: NaiveDate) -> FeederResult<IngestOutcome> {
        let mut outcome = IngestOutcome::default();

        for (position, location) in locations.iter().enumerate() {
            // Feed indexes are 1-based and count every feed, including empty ones
            let feed_index = position as u32 + 1;

            let entries = match self.source.fetch(location) {
                Ok(entries) => entries,
                Err(e) if self.options.failure_policy == FailurePolicy::Isolate => {
                    warn!(feed = %location, error = %e, "Skipping feed");
                    outcome.failures.push(FeedFailure {
                        location: location.clone(),
                        error: e,
                    });
                    continue;
                }
                Err(e) => {
                    error!(feed = %location, error = %e, "Aborting ingestion run");
                    return Err(e);
                }
            };

            let mut cursor = IdCursor::for_feed(feed_index);
            let before = outcome.items.len();

            for entry in entries.iter().take(self.options.entries_per_feed) {
                match self.normalizer.normalize(entry, cursor, run_date) {
                    Ok((item, next)) => {
                        outcome.items.push(item);
                        cursor = next;
                    }
                    Err(e) => {
                        warn!(feed = %location, entry = entry.label(), error = %e, "Skipping entry");
                        outcome.skipped.push(SkippedEntry {
                            location: location.clone(),
                            entry: entry.label().to_string(),
                            error: e,
                        });
                    }
                }
            }

            info!(
                feed = %location,
                feed_index,
                entries = entries.len(),
                items = outcome.items.len() - before,
                "Ingested feed"
            );
        }

        info!(
            feeds = locations.len(),
            items = outcome.items.len(),
            skipped = outcome.skipped.len(),
            failed_feeds = outcome.failures.len(),
            "Ingestion run complete"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawEntry;
    use crate::sources::traits::MockFeedSource;
    use chrono::{TimeZone, Utc};

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 5).unwrap()
    }

    fn dated(link: &str, title: &str) -> RawEntry {
        RawEntry::new(link)
            .with_title(title)
            .with_summary("<p>summary</p>")
            .with_published(Some(Utc.with_ymd_and_hms(2026, 2, 4, 15, 0, 0).unwrap()))
    }

    fn locations(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }

    fn service(source: MockFeedSource, options: IngestOptions) -> IngestionService<MockFeedSource> {
        IngestionService::new(source, ItemNormalizer::new("AI_news"), options)
    }

    #[test]
    fn test_takes_newest_entry_per_feed_by_default() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().times(2).returning(|location| match location {
            "https://feed1.com/rss" => Ok(vec![
                dated("https://feed1.com/a", "A"),
                dated("https://feed1.com/b", "B"),
            ]),
            _ => Ok(vec![dated("https://feed2.com/c", "C")]),
        });

        let outcome = service(source, IngestOptions::default())
            .run(&locations(&["https://feed1.com/rss", "https://feed2.com/rss"]), run_date())
            .unwrap();

        let ids: Vec<_> = outcome.items.iter().map(|i| i.id.as_str()).collect();
        let links: Vec<_> = outcome.items.iter().map(|i| i.link.as_str()).collect();
        assert_eq!(ids, vec!["20260205101", "20260205201"]);
        assert_eq!(links, vec!["https://feed1.com/a", "https://feed2.com/c"]);
    }

    #[test]
    fn test_configurable_limit_and_slot_counters_reset_per_feed() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().returning(|location| {
            Ok((0..12)
                .map(|i| dated(&format!("{}/{}", location, i), "entry"))
                .collect())
        });

        let options = IngestOptions {
            entries_per_feed: 11,
            ..IngestOptions::default()
        };
        let outcome = service(source, options)
            .run(&locations(&["https://a.com", "https://b.com"]), run_date())
            .unwrap();

        assert_eq!(outcome.items.len(), 22);
        assert_eq!(outcome.items[0].id, "20260205101");
        assert_eq!(outcome.items[9].id, "20260205110");
        assert_eq!(outcome.items[10].id, "20260205111");
        assert_eq!(outcome.items[11].id, "20260205201");
    }

    #[test]
    fn test_fetch_failure_aborts_run_by_default() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().returning(|location| match location {
            "https://broken.com/rss" => Err(FeederError::FeedFetch {
                location: location.to_string(),
                reason: "connection refused".to_string(),
            }),
            _ => Ok(vec![dated("https://ok.com/a", "A")]),
        });

        let result = service(source, IngestOptions::default()).run(
            &locations(&["https://ok.com/rss", "https://broken.com/rss", "https://ok2.com/rss"]),
            run_date(),
        );

        assert!(matches!(result, Err(FeederError::FeedFetch { .. })));
    }

    #[test]
    fn test_isolate_policy_keeps_other_feeds() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().times(3).returning(|location| match location {
            "https://broken.com/rss" => Err(FeederError::FeedFetch {
                location: location.to_string(),
                reason: "connection refused".to_string(),
            }),
            "https://ok.com/rss" => Ok(vec![dated("https://ok.com/a", "A")]),
            _ => Ok(vec![dated("https://ok2.com/b", "B")]),
        });

        let options = IngestOptions {
            failure_policy: FailurePolicy::Isolate,
            ..IngestOptions::default()
        };
        let outcome = service(source, options)
            .run(
                &locations(&["https://ok.com/rss", "https://broken.com/rss", "https://ok2.com/rss"]),
                run_date(),
            )
            .unwrap();

        assert_eq!(outcome.items.len(), 2);
        // The failed feed still consumes its index
        assert_eq!(outcome.items[1].id, "20260205301");
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].location, "https://broken.com/rss");
    }

    #[test]
    fn test_undated_entry_is_skipped_without_consuming_a_slot() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().returning(|_| {
            Ok(vec![
                dated("https://a.com/1", "first"),
                RawEntry::new("https://a.com/undated").with_title("undated"),
                dated("https://a.com/2", "second"),
            ])
        });

        let options = IngestOptions {
            entries_per_feed: 3,
            ..IngestOptions::default()
        };
        let outcome = service(source, options)
            .run(&locations(&["https://a.com/rss"]), run_date())
            .unwrap();

        assert_eq!(outcome.items.len(), 2);
        assert_eq!(outcome.items[1].id, "20260205102");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].entry, "undated");
        assert!(matches!(
            outcome.skipped[0].error,
            FeederError::MalformedTimestamp(_)
        ));
    }

    #[test]
    fn test_empty_feed_yields_no_items() {
        let mut source = MockFeedSource::new();
        source.expect_fetch().returning(|_| Ok(Vec::new()));

        let outcome = service(source, IngestOptions::default())
            .run(&locations(&["https://empty.com/rss"]), run_date())
            .unwrap();

        assert!(outcome.items.is_empty());
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn test_no_feeds_means_no_fetches() {
        let source = MockFeedSource::new();
        let outcome = service(source, IngestOptions::default())
            .run(&[], run_date())
            .unwrap();
        assert!(outcome.items.is_empty());
    }
}
