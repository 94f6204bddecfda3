use std::fs;

use feed_rs::parser;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::domain::RawEntry;
use crate::errors::{FeederError, FeederResult};
use crate::sources::traits::FeedSource;

const USER_AGENT: &str = concat!("newsfeed/", env!("CARGO_PKG_VERSION"));

/// RSS, Atom and JSON Feed source backed by feed-rs.
///
/// Locations are `http(s)://` URLs, `file://` URLs or plain filesystem paths.
pub struct RssAtomSource {
    client: Client,
}

impl RssAtomSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .user_agent(USER_AGENT)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn read_location(&self, location: &str) -> FeederResult<Vec<u8>> {
        let fetch_error = |reason: String| FeederError::FeedFetch {
            location: location.to_string(),
            reason,
        };

        match Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                let response = self
                    .client
                    .get(url)
                    .send()
                    .and_then(|r| r.error_for_status())
                    .map_err(|e| fetch_error(e.to_string()))?;
                let bytes = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
                Ok(bytes.to_vec())
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| fetch_error("Invalid file URL".to_string()))?;
                fs::read(path).map_err(|e| fetch_error(e.to_string()))
            }
            Ok(url) => Err(fetch_error(format!("Unsupported scheme: {}", url.scheme()))),
            // Not a URL at all, treat it as a path
            Err(_) => fs::read(location).map_err(|e| fetch_error(e.to_string())),
        }
    }

    /// Parse raw feed bytes into entries, keeping feed order
    pub fn parse_entries(bytes: &[u8]) -> Result<Vec<RawEntry>, String> {
        let parsed = parser::parse(bytes).map_err(|e| e.to_string())?;

        let entries = parsed
            .entries
            .into_iter()
            .map(|entry| {
                let title = entry.title.map(|t| t.content);
                let link = entry.links.into_iter().next().map(|l| l.href);

                // Prefer the short description; fall back to the full body
                let summary = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body));

                RawEntry {
                    title,
                    link,
                    summary,
                    published: entry.published.or(entry.updated),
                }
            })
            .collect();

        Ok(entries)
    }
}

impl Default for RssAtomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for RssAtomSource {
    fn fetch(&self, location: &str) -> FeederResult<Vec<RawEntry>> {
        let bytes = self.read_location(location)?;
        debug!(location, bytes = bytes.len(), "Fetched feed");

        Self::parse_entries(&bytes).map_err(|reason| FeederError::FeedFetch {
            location: location.to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;
    use tempfile::NamedTempFile;

    // Sample RSS feed (based on Rust Blog format)
    const SAMPLE_RSS: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Rust Blog</title>
    <link>https://blog.rust-lang.org/</link>
    <description>Empowering everyone to build reliable and efficient software.</description>
    <item>
      <title>Announcing Rust 1.75.0</title>
      <link>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</link>
      <description><![CDATA[<p>The Rust team is happy to announce a new version of Rust, 1.75.0.</p>]]></description>
      <pubDate>Thu, 28 Dec 2023 00:00:00 +0000</pubDate>
      <guid>https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html</guid>
    </item>
    <item>
      <title>Undated post</title>
      <link>https://blog.rust-lang.org/undated.html</link>
      <description>No date here</description>
    </item>
  </channel>
</rss>"#;

    // Sample Atom feed with only an updated timestamp
    const SAMPLE_ATOM: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Tech Blog</title>
  <link href="https://example.com/"/>
  <id>https://example.com/feed.atom</id>
  <updated>2024-01-15T12:00:00Z</updated>
  <entry>
    <title>Understanding WebAssembly</title>
    <link href="https://example.com/posts/wasm-intro"/>
    <id>https://example.com/posts/wasm-intro</id>
    <updated>2024-01-15T12:00:00Z</updated>
    <content type="html"><![CDATA[<article><p>WebAssembly is a binary instruction format.</p></article>]]></content>
  </entry>
</feed>"#;

    #[test]
    fn test_rss_entries_parsed_in_feed_order() {
        let entries = RssAtomSource::parse_entries(SAMPLE_RSS).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title.as_deref(), Some("Announcing Rust 1.75.0"));
        assert_eq!(
            entries[0].link.as_deref(),
            Some("https://blog.rust-lang.org/2023/12/28/Rust-1.75.0.html")
        );
        assert!(entries[0].summary.as_deref().unwrap().contains("<p>"));
        assert_eq!(
            entries[0].published,
            Some(Utc.with_ymd_and_hms(2023, 12, 28, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_rss_entry_without_date_has_no_published() {
        let entries = RssAtomSource::parse_entries(SAMPLE_RSS).unwrap();
        assert!(entries[1].published.is_none());
    }

    #[test]
    fn test_atom_falls_back_to_updated_and_content() {
        let entries = RssAtomSource::parse_entries(SAMPLE_ATOM).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].published,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap())
        );
        assert!(entries[0]
            .summary
            .as_deref()
            .unwrap()
            .contains("binary instruction format"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(RssAtomSource::parse_entries(b"this is not a feed").is_err());
    }

    #[test]
    fn test_fetch_from_file_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_RSS).unwrap();

        let source = RssAtomSource::new();
        let entries = source.fetch(file.path().to_str().unwrap()).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_fetch_from_file_url() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_ATOM).unwrap();
        let url = Url::from_file_path(file.path()).unwrap();

        let source = RssAtomSource::new();
        let entries = source.fetch(url.as_str()).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let source = RssAtomSource::new();
        let result = source.fetch("/nonexistent/dir/feed.xml");
        assert!(matches!(result, Err(FeederError::FeedFetch { .. })));
    }

    #[test]
    fn test_unparseable_file_is_fetch_error() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"<html><body>nope</body></html>").unwrap();

        let source = RssAtomSource::new();
        let result = source.fetch(file.path().to_str().unwrap());
        assert!(matches!(result, Err(FeederError::FeedFetch { .. })));
    }

    #[test]
    fn test_unsupported_scheme_is_fetch_error() {
        let source = RssAtomSource::new();
        let result = source.fetch("ftp://example.com/feed.xml");
        match result {
            Err(FeederError::FeedFetch { location, reason }) => {
                assert_eq!(location, "ftp://example.com/feed.xml");
                assert!(reason.contains("ftp"));
            }
            other => panic!("expected FeedFetch, got {:?}", other),
        }
    }
}
