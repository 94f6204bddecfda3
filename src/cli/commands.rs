use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsfeed")]
#[command(about = "RSS news ingester with a time-windowed item store")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the configured feeds and store the newest entries
    Ingest {
        /// Dry run - fetch and normalize, but don't write anything
        #[arg(long)]
        dry_run: bool,

        /// Record unreachable feeds and continue with the rest
        #[arg(long)]
        keep_going: bool,

        /// Entries to take from the top of each feed
        #[arg(long, env = "NEWSFEED_PER_FEED")]
        per_feed: Option<usize>,

        /// Table to write to
        #[arg(short, long, env = "NEWSFEED_TABLE")]
        table: Option<String>,
    },

    /// Show items published in the last few days
    Recent {
        /// Window length in days
        #[arg(short, long, env = "NEWSFEED_DAYS")]
        days: Option<u32>,

        /// Table to read from
        #[arg(short, long, env = "NEWSFEED_TABLE")]
        table: Option<String>,

        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send the recent window to the summarizer
    Summarize {
        /// Window length in days
        #[arg(short, long, env = "NEWSFEED_DAYS")]
        days: Option<u32>,

        /// Table to read from
        #[arg(short, long, env = "NEWSFEED_TABLE")]
        table: Option<String>,
    },

    /// List the configured feed locations
    Feeds,

    /// Remove expired items
    Purge {
        /// Table to purge
        #[arg(short, long, env = "NEWSFEED_TABLE")]
        table: Option<String>,
    },
}
