use crate::domain::RawEntry;
use crate::errors::FeederResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `location`, entries in feed order.
    /// Unreachable or unparseable feeds fail with `FeederError::FeedFetch`.
    fn fetch(&self, location: &str) -> FeederResult<Vec<RawEntry>>;
}
