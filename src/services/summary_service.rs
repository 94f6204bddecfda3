use summarizer::{SummarizerClient, SummaryItem, SummaryRequest, SummaryResponse};
use tracing::info;

use crate::config::Config;
use crate::domain::CanonicalItem;
use crate::errors::{FeederError, FeederResult};

pub struct SummaryService {
    client: SummarizerClient,
}

impl SummaryService {
    pub fn new(config: &Config) -> FeederResult<Self> {
        let url = config
            .summarizer_url
            .as_deref()
            .ok_or_else(|| FeederError::MissingEnvVar("SUMMARIZER_URL".to_string()))?;
        let client = SummarizerClient::new(url, config.summarizer_token.as_deref())?;

        Ok(Self { client })
    }

    /// Send the retrieved window to the summarizer
    pub fn summarize(&self, items: &[CanonicalItem]) -> FeederResult<SummaryResponse> {
        info!(items = items.len(), endpoint = %self.client.endpoint(), "Requesting summary");
        let response = self.client.summarize(&to_request(items))?;
        Ok(response)
    }
}

pub fn to_request(items: &[CanonicalItem]) -> SummaryRequest {
    SummaryRequest {
        items: items
            .iter()
            .map(|item| SummaryItem {
                id: item.id.clone(),
                link: item.link.clone(),
                title: item.title.clone(),
                summary: item.summary.clone(),
                published_datetime: item.published_datetime,
            })
            .collect(),
    }
}
