use std::str::FromStr;

use crate::errors::{FeederError, FeederResult};

pub const DEFAULT_TABLE: &str = "ai_news";
pub const DEFAULT_CATEGORY: &str = "AI_news";
pub const DEFAULT_FEEDS_PATH: &str = "RSS.json";
pub const DEFAULT_ENTRIES_PER_FEED: usize = 1;
pub const DEFAULT_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub table_name: String,
    pub category: String,
    pub feeds_path: String,
    pub entries_per_feed: usize,
    pub days: u32,
    pub summarizer_url: Option<String>,
    pub summarizer_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./newsfeed.db".to_string(),
            table_name: DEFAULT_TABLE.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            feeds_path: DEFAULT_FEEDS_PATH.to_string(),
            entries_per_feed: DEFAULT_ENTRIES_PER_FEED,
            days: DEFAULT_DAYS,
            summarizer_url: None,
            summarizer_token: None,
        }
    }
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeederResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let mut config = Self::from_vars(|name| std::env::var(name).ok())?;

        // Default db_path is relative to executable directory
        if std::env::var("NEWSFEED_DB_PATH").is_err() {
            if let Some(dir) = exe_dir {
                config.db_path = dir.join("newsfeed.db").to_string_lossy().into_owned();
            }
        }

        Ok(config)
    }

    /// Build a config from any variable lookup, falling back to defaults
    pub fn from_vars<F>(lookup: F) -> FeederResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            db_path: non_empty("NEWSFEED_DB_PATH").unwrap_or(defaults.db_path),
            table_name: non_empty("NEWSFEED_TABLE").unwrap_or(defaults.table_name),
            category: non_empty("NEWSFEED_CATEGORY").unwrap_or(defaults.category),
            feeds_path: non_empty("NEWSFEED_FEEDS").unwrap_or(defaults.feeds_path),
            entries_per_feed: parse_var("NEWSFEED_PER_FEED", non_empty("NEWSFEED_PER_FEED"))?
                .unwrap_or(defaults.entries_per_feed),
            days: parse_var("NEWSFEED_DAYS", non_empty("NEWSFEED_DAYS"))?
                .unwrap_or(defaults.days),
            summarizer_url: non_empty("SUMMARIZER_URL"),
            summarizer_token: non_empty("SUMMARIZER_TOKEN"),
        })
    }
}

fn parse_var<T: FromStr>(name: &str, value: Option<String>) -> FeederResult<Option<T>> {
    value
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| FeederError::Config(format!("{} is not a valid number: {}", name, v)))
        })
        .transpose()
}
