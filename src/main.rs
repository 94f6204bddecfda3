use clap::Parser;
use tracing_subscriber::EnvFilter;

use newsfeed::cli::{Cli, Commands};
use newsfeed::config::Config;
use newsfeed::domain::CanonicalItem;
use newsfeed::errors::FeederResult;
use newsfeed::services::{
    load_feed_list, FailurePolicy, IngestOptions, IngestionService, ItemNormalizer,
    StorageWriter, SummaryService, WindowedReader,
};
use newsfeed::sources::RssAtomSource;
use newsfeed::storage::{ItemStore, SqliteItemStore, SqliteStorage};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> FeederResult<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env()?;

    match cli.command {
        Commands::Ingest {
            dry_run,
            keep_going,
            per_feed,
            table,
        } => {
            let table = table.unwrap_or_else(|| config.table_name.clone());
            let per_feed = per_feed.unwrap_or(config.entries_per_feed);
            cmd_ingest(&config, &table, per_feed, dry_run, keep_going)
        }
        Commands::Recent { days, table, json } => {
            let table = table.unwrap_or_else(|| config.table_name.clone());
            cmd_recent(&config, &table, days.unwrap_or(config.days), json)
        }
        Commands::Summarize { days, table } => {
            let table = table.unwrap_or_else(|| config.table_name.clone());
            if let Err(e) = cmd_summarize(&config, &table, days.unwrap_or(config.days)) {
                eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Feeds => cmd_feeds(&config),
        Commands::Purge { table } => {
            let table = table.unwrap_or_else(|| config.table_name.clone());
            cmd_purge(&config, &table)
        }
    }
}

fn open_store(config: &Config) -> FeederResult<SqliteItemStore> {
    let storage = SqliteStorage::new(&config.db_path)?;
    Ok(SqliteItemStore::new(storage))
}

fn cmd_ingest(
    config: &Config,
    table: &str,
    per_feed: usize,
    dry_run: bool,
    keep_going: bool,
) -> FeederResult<()> {
    let locations = load_feed_list(&config.feeds_path)?;

    if locations.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    let options = IngestOptions {
        entries_per_feed: per_feed,
        failure_policy: if keep_going {
            FailurePolicy::Isolate
        } else {
            FailurePolicy::Abort
        },
    };
    let service = IngestionService::new(
        RssAtomSource::new(),
        ItemNormalizer::new(config.category.clone()),
        options,
    );

    println!("Fetching {} feeds...\n", locations.len());

    let run_date = chrono::Local::now().date_naive();
    let outcome = service.run(&locations, run_date)?;

    for item in &outcome.items {
        let prefix = if dry_run { "[DRY RUN] " } else { "" };
        println!("  {}{} {}", prefix, item.id, display_title(item));
        println!("    {}", item.link);
    }

    if !outcome.skipped.is_empty() {
        println!("\nSkipped {} entries:", outcome.skipped.len());
        for skipped in &outcome.skipped {
            println!("  - {} ({}): {}", skipped.entry, skipped.location, skipped.error);
        }
    }

    if !outcome.failures.is_empty() {
        println!("\nFailed {} feeds:", outcome.failures.len());
        for failure in &outcome.failures {
            println!("  ! {}: {}", failure.location, failure.error);
        }
    }

    println!();

    if dry_run {
        println!(
            "Dry run complete. Would write {} items to {}.",
            outcome.items.len(),
            table
        );
        return Ok(());
    }

    let writer = StorageWriter::new(open_store(config)?);
    let summary = writer.write_batch(&outcome.items, table)?;
    println!("{}", summary.message());

    Ok(())
}

fn cmd_recent(config: &Config, table: &str, days: u32, json: bool) -> FeederResult<()> {
    let reader = WindowedReader::new(open_store(config)?);
    let items = reader.recent(days, &config.category, table)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No items published in the last {} days.", days);
        return Ok(());
    }

    println!("Items published in the last {} days:\n", days);
    for item in &items {
        let published = chrono::DateTime::from_timestamp(item.published_datetime, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| item.published_datetime.to_string());
        println!("  {} [{}]", display_title(item), published);
        println!("    {}", item.link);
    }

    Ok(())
}

fn cmd_summarize(config: &Config, table: &str, days: u32) -> FeederResult<()> {
    let service = SummaryService::new(config)?;
    let reader = WindowedReader::new(open_store(config)?);
    let items = reader.recent(days, &config.category, table)?;

    if items.is_empty() {
        println!("No items published in the last {} days.", days);
        return Ok(());
    }

    let response = service.summarize(&items)?;
    println!("{}", response.text);

    Ok(())
}

fn cmd_feeds(config: &Config) -> FeederResult<()> {
    let locations = load_feed_list(&config.feeds_path)?;

    if locations.is_empty() {
        println!("No feeds configured.");
        return Ok(());
    }

    println!("Configured feeds ({}):\n", config.feeds_path);
    for (i, location) in locations.iter().enumerate() {
        println!("  {}. {}", i + 1, location);
    }

    Ok(())
}

fn cmd_purge(config: &Config, table: &str) -> FeederResult<()> {
    let store = open_store(config)?;
    let removed = store.purge_expired(table)?;
    println!("Removed {} expired items from {}", removed, table);
    Ok(())
}

fn display_title(item: &CanonicalItem) -> &str {
    item.title.as_deref().unwrap_or("(untitled)")
}
