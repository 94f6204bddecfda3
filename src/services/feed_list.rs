use std::fs;
use std::path::Path;

use opml::{Outline, OPML};

use crate::errors::{FeederError, FeederResult};

/// Load the ordered feed list from an OPML file or a JSON array of locations
pub fn load_feed_list<P: AsRef<Path>>(path: P) -> FeederResult<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        FeederError::Config(format!("Cannot read feed list {}: {}", path.display(), e))
    })?;

    let is_opml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("opml") || ext.eq_ignore_ascii_case("xml"));

    let locations = if is_opml {
        parse_opml(&content)?
    } else {
        parse_json(&content)?
    };

    Ok(dedupe(locations))
}

pub fn parse_json(content: &str) -> FeederResult<Vec<String>> {
    serde_json::from_str::<Vec<String>>(content)
        .map_err(|e| FeederError::Config(format!("Feed list is not a JSON array of strings: {}", e)))
}

pub fn parse_opml(content: &str) -> FeederResult<Vec<String>> {
    let opml = OPML::from_str(content).map_err(|e| FeederError::Config(e.to_string()))?;
    Ok(extract_feed_urls(&opml.body.outlines))
}

/// Recursively extract feed URLs from OPML outlines, in document order
fn extract_feed_urls(outlines: &[Outline]) -> Vec<String> {
    let mut urls = Vec::new();

    for outline in outlines {
        if let Some(url) = &outline.xml_url {
            urls.push(url.clone());
        }
        urls.extend(extract_feed_urls(&outline.outlines));
    }

    urls
}

/// Trim, drop blanks, keep the first occurrence of each location
fn dedupe(locations: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    locations
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && seen.insert(l.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_json_list_keeps_order() {
        let urls = parse_json(r#"["https://feed1.com/rss", "https://feed2.com/rss"]"#).unwrap();
        assert_eq!(urls, vec!["https://feed1.com/rss", "https://feed2.com/rss"]);
    }

    #[test]
    fn test_json_list_must_be_strings() {
        let result = parse_json(r#"{"feeds": 1}"#);
        assert!(matches!(result, Err(FeederError::Config(_))));
    }

    #[test]
    fn test_extract_feed_urls_recurses() {
        let outlines = vec![
            Outline {
                text: "Feed 1".to_string(),
                xml_url: Some("https://example1.com/feed".to_string()),
                ..Default::default()
            },
            Outline {
                text: "Category".to_string(),
                outlines: vec![Outline {
                    text: "Feed 2".to_string(),
                    xml_url: Some("https://example2.com/feed".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            },
        ];

        let urls = extract_feed_urls(&outlines);
        assert_eq!(urls, vec!["https://example1.com/feed", "https://example2.com/feed"]);
    }

    #[test]
    fn test_load_json_file_dedupes() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"["https://a.com/rss", " ", "https://b.com/rss", "https://a.com/rss"]"#
        )
        .unwrap();

        let urls = load_feed_list(file.path()).unwrap();
        assert_eq!(urls, vec!["https://a.com/rss", "https://b.com/rss"]);
    }

    #[test]
    fn test_load_opml_file() {
        let mut file = Builder::new().suffix(".opml").tempfile().unwrap();
        write!(
            file,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<opml version="2.0">
  <head><title>AI feeds</title></head>
  <body>
    <outline text="AI">
      <outline text="One" type="rss" xmlUrl="https://one.com/rss"/>
      <outline text="Two" type="rss" xmlUrl="https://two.com/rss"/>
    </outline>
  </body>
</opml>"#
        )
        .unwrap();

        let urls = load_feed_list(file.path()).unwrap();
        assert_eq!(urls, vec!["https://one.com/rss", "https://two.com/rss"]);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_feed_list("/nonexistent/RSS.json");
        assert!(matches!(result, Err(FeederError::Config(_))));
    }
}
