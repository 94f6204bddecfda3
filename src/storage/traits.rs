use crate::domain::AttributeMap;
use crate::errors::FeederResult;

/// Range read over the `(category, published_datetime)` index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub category: String,
    /// Inclusive lower bound on `published_datetime`
    pub start: i64,
    /// Inclusive upper bound on `published_datetime`
    pub end: i64,
    /// Maximum items per page
    pub limit: usize,
}

/// Position after the last item of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    pub published_datetime: i64,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<AttributeMap>,
    /// Set when more items may follow
    pub next: Option<PageCursor>,
}

/// Key-value store keyed by `link`, with one secondary index on
/// `(category, published_datetime)` and store-managed expiry on `ttl`.
#[cfg_attr(test, mockall::automock)]
pub trait ItemStore: Send + Sync {
    /// Put every item, replacing existing items with the same `link`
    fn put_chunk(&self, table: &str, items: &[AttributeMap]) -> FeederResult<()>;

    /// One page of the index, ascending by `published_datetime` then `link`
    fn query_index(
        &self,
        table: &str,
        query: &IndexQuery,
        cursor: Option<PageCursor>,
    ) -> FeederResult<QueryPage>;

    fn get(&self, table: &str, link: &str) -> FeederResult<Option<AttributeMap>>;

    /// Drop items whose `ttl` has passed; returns how many were removed
    fn purge_expired(&self, table: &str) -> FeederResult<usize>;
}
