use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::domain::{AttributeMap, AttributeValue, Clock, SystemClock};
use crate::errors::{FeederError, FeederResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::{IndexQuery, ItemStore, PageCursor, QueryPage};

/// Item table on SQLite. Each logical table maps to one SQLite table holding
/// the attribute map as JSON next to the key and index columns.
#[derive(Clone)]
pub struct SqliteItemStore {
    storage: SqliteStorage,
    clock: Arc<dyn Clock>,
}

impl SqliteItemStore {
    pub fn new(storage: SqliteStorage) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    /// Expiry is judged against `clock` instead of the wall clock
    pub fn with_clock(storage: SqliteStorage, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    fn sweep_expired(&self, conn: &Connection, table: &str) -> FeederResult<usize> {
        let removed = conn.execute(
            &format!(r#"DELETE FROM "{}" WHERE ttl IS NOT NULL AND ttl < ?1"#, table),
            [self.clock.now()],
        )?;
        if removed > 0 {
            debug!(table, removed, "Expired items removed");
        }
        Ok(removed)
    }
}

fn query_error(err: rusqlite::Error) -> FeederError {
    FeederError::Query(err.to_string())
}

/// Reads report SQLite failures as `Query`; other variants pass through
fn into_query_error(err: FeederError) -> FeederError {
    match err {
        FeederError::Database(err) => query_error(err),
        other => other,
    }
}

fn index_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, i64, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode(json: &str) -> FeederResult<AttributeMap> {
    serde_json::from_str(json)
        .map_err(|e| FeederError::Query(format!("Undecodable stored item: {}", e)))
}

impl ItemStore for SqliteItemStore {
    fn put_chunk(&self, table: &str, items: &[AttributeMap]) -> FeederResult<()> {
        let mut conn = self.storage.connection()?;
        SqliteStorage::ensure_table(&conn, table)?;
        self.sweep_expired(&conn, table)?;

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                r#"INSERT OR REPLACE INTO "{}" (link, category, published_datetime, ttl, attributes)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
                table
            ))?;

            for item in items {
                let link = item
                    .get("link")
                    .and_then(AttributeValue::as_text)
                    .ok_or_else(|| FeederError::Query("Item has no link attribute".to_string()))?;
                let category = item.get("category").and_then(AttributeValue::as_text);
                let published = item
                    .get("published_datetime")
                    .and_then(AttributeValue::as_i64);
                let ttl = item.get("ttl").and_then(AttributeValue::as_i64);
                if let Some((name, _)) = item.iter().find(|(_, v)| v.is_non_finite()) {
                    return Err(FeederError::Query(format!(
                        "Attribute '{}' of {} is not a finite number",
                        name, link
                    )));
                }
                let attributes = serde_json::to_string(item)?;

                stmt.execute(params![link, category, published, ttl, attributes])?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn query_index(
        &self,
        table: &str,
        query: &IndexQuery,
        cursor: Option<PageCursor>,
    ) -> FeederResult<QueryPage> {
        let conn = self.storage.connection()?;
        SqliteStorage::ensure_table(&conn, table).map_err(into_query_error)?;
        self.sweep_expired(&conn, table).map_err(into_query_error)?;

        let limit = query.limit.max(1);
        // One extra row tells us whether another page follows
        let fetch = i64::try_from(limit.saturating_add(1)).unwrap_or(i64::MAX);

        let rows: Vec<(String, i64, String)> = match &cursor {
            None => {
                let mut stmt = conn
                    .prepare(&format!(
                        r#"SELECT attributes, published_datetime, link FROM "{}"
                           WHERE category = ?1 AND published_datetime BETWEEN ?2 AND ?3
                           ORDER BY published_datetime, link
                           LIMIT ?4"#,
                        table
                    ))
                    .map_err(query_error)?;
                let rows = stmt
                    .query_map(
                        params![query.category, query.start, query.end, fetch],
                        index_row,
                    )
                    .map_err(query_error)?;
                rows.collect::<Result<_, _>>().map_err(query_error)?
            }
            Some(after) => {
                let mut stmt = conn
                    .prepare(&format!(
                        r#"SELECT attributes, published_datetime, link FROM "{}"
                           WHERE category = ?1 AND published_datetime BETWEEN ?2 AND ?3
                             AND (published_datetime > ?4 OR (published_datetime = ?4 AND link > ?5))
                           ORDER BY published_datetime, link
                           LIMIT ?6"#,
                        table
                    ))
                    .map_err(query_error)?;
                let rows = stmt
                    .query_map(
                        params![
                            query.category,
                            query.start,
                            query.end,
                            after.published_datetime,
                            after.link,
                            fetch
                        ],
                        index_row,
                    )
                    .map_err(query_error)?;
                rows.collect::<Result<_, _>>().map_err(query_error)?
            }
        };

        let has_more = rows.len() > limit;
        let mut items = Vec::with_capacity(limit.min(rows.len()));
        let mut next = None;

        for (attributes, published_datetime, link) in rows.into_iter().take(limit) {
            items.push(decode(&attributes)?);
            next = Some(PageCursor {
                published_datetime,
                link,
            });
        }

        Ok(QueryPage {
            items,
            next: if has_more { next } else { None },
        })
    }

    fn get(&self, table: &str, link: &str) -> FeederResult<Option<AttributeMap>> {
        let conn = self.storage.connection()?;
        SqliteStorage::ensure_table(&conn, table)?;
        self.sweep_expired(&conn, table)?;

        let attributes: Option<String> = conn
            .query_row(
                &format!(r#"SELECT attributes FROM "{}" WHERE link = ?1"#, table),
                [link],
                |row| row.get(0),
            )
            .optional()
            .map_err(query_error)?;

        attributes.as_deref().map(decode).transpose()
    }

    fn purge_expired(&self, table: &str) -> FeederResult<usize> {
        let conn = self.storage.connection()?;
        SqliteStorage::ensure_table(&conn, table)?;
        self.sweep_expired(&conn, table)
    }
}
