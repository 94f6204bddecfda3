use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeederError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Entry errors
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("Entry has no link: {0}")]
    MissingLink(String),

    // Feed errors
    #[error("Feed fetch failed for {location}: {reason}")]
    FeedFetch { location: String, reason: String },

    // Storage errors
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Batch write to {table} failed with {failed_items} items unwritten: {reason}")]
    BatchWrite {
        table: String,
        failed_items: usize,
        reason: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // Summarizer errors
    #[error("Summarizer failed: {0}")]
    Summarizer(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FeederError {
    /// Busy or locked database errors clear up on their own
    pub fn is_retryable(&self) -> bool {
        match self {
            FeederError::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

impl From<summarizer::SummarizerError> for FeederError {
    fn from(err: summarizer::SummarizerError) -> Self {
        FeederError::Summarizer(err.to_string())
    }
}

pub type FeederResult<T> = Result<T, FeederError>;
