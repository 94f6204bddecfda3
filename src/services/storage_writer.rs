use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::attributes::without_non_finite;
use crate::domain::{AttributeMap, CanonicalItem};
use crate::errors::{FeederError, FeederResult};
use crate::storage::traits::ItemStore;

/// Most items the store accepts in a single put request
pub const MAX_CHUNK_ITEMS: usize = 25;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub table: String,
    pub written: usize,
    pub chunks: usize,
}

impl WriteSummary {
    pub fn message(&self) -> String {
        format!("Successfully wrote {} items to {}", self.written, self.table)
    }
}

/// Writes batches of items to an `ItemStore` in store-sized chunks.
///
/// Chunks are independent: a failure part-way leaves earlier chunks
/// written, and rewriting the whole batch is safe because puts are keyed
/// by `link`.
pub struct StorageWriter<S: ItemStore> {
    store: S,
    max_retries: u32,
    retry_delay: Duration,
}

impl<S: ItemStore> StorageWriter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub fn write_batch(&self, items: &[CanonicalItem], table: &str) -> FeederResult<WriteSummary> {
        let records = items.iter().map(CanonicalItem::to_attributes).collect();
        self.write_records(records, table)
    }

    /// Write loosely shaped records. NaN and infinite attributes are dropped
    /// before the store ever sees them.
    pub fn write_records(
        &self,
        records: Vec<AttributeMap>,
        table: &str,
    ) -> FeederResult<WriteSummary> {
        let mut summary = WriteSummary {
            table: table.to_string(),
            written: 0,
            chunks: 0,
        };

        if records.is_empty() {
            info!(table, "Nothing to write");
            return Ok(summary);
        }

        let total = records.len();
        let records: Vec<AttributeMap> = records.into_iter().map(without_non_finite).collect();

        for chunk in records.chunks(MAX_CHUNK_ITEMS) {
            self.put_with_retry(table, chunk, total - summary.written)?;
            summary.written += chunk.len();
            summary.chunks += 1;
        }

        info!(table, written = summary.written, chunks = summary.chunks, "Batch written");
        Ok(summary)
    }

    fn put_with_retry(
        &self,
        table: &str,
        chunk: &[AttributeMap],
        unwritten: usize,
    ) -> FeederResult<()> {
        let mut attempt = 0;

        loop {
            match self.store.put_chunk(table, chunk) {
                Ok(()) => return Ok(()),
                Err(e @ (FeederError::StoreUnavailable(_) | FeederError::Query(_))) => {
                    return Err(e)
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(table, attempt, error = %e, "Chunk write failed, retrying");
                    thread::sleep(self.retry_delay * attempt);
                }
                Err(e) => {
                    return Err(FeederError::BatchWrite {
                        table: table.to_string(),
                        failed_items: unwritten,
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}
