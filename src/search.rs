//! Medicine information retrieval
//!
//! One web search per identified name, compiled into a plain-text digest for
//! the summarization prompt. Missing credentials and provider failures are
//! recoverable degradations: this module always returns a digest string and
//! never propagates an error.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

/// Fixed query suffix appended to the medicine name
const QUERY_SUFFIX: &str = "medicine usage information dosage";
/// Maximum number of results compiled into the digest
const RESULT_LIMIT: u8 = 3;
/// Digest returned when search credentials are not configured
const CONFIG_MISSING_DIGEST: &str = "Search provider configuration is missing.";

const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// One ranked search result as the provider returns it
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    pub title: Option<String>,
    #[serde(rename = "displayLink")]
    pub display_link: Option<String>,
    pub snippet: Option<String>,
}

/// Trait for web search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<SearchHit>, ProviderError>;
}

/// Google Custom Search client
pub struct GoogleSearch {
    http: reqwest::Client,
    api_key: String,
    engine_id: String,
}

impl GoogleSearch {
    pub fn new(http: reqwest::Client, api_key: String, engine_id: String) -> Self {
        Self {
            http,
            api_key,
            engine_id,
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, limit: u8) -> Result<Vec<SearchHit>, ProviderError> {
        #[derive(Deserialize)]
        struct SearchResponse {
            items: Option<Vec<SearchHit>>,
        }

        let num = limit.to_string();
        let response: SearchResponse = self
            .http
            .get(ENDPOINT)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(response.items.unwrap_or_default())
    }
}

/// Compiles search results into the digest handed to the summarizer
pub struct InfoRetriever {
    provider: Option<Arc<dyn SearchProvider>>,
}

impl InfoRetriever {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider: Some(provider),
        }
    }

    /// Retriever without a configured provider; every lookup degrades to the
    /// configuration-missing message
    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Search for the medicine and compile the results.
    ///
    /// Always returns a digest string: missing configuration, empty results
    /// and transport failures all map to fixed, user-visible text.
    pub async fn digest(&self, name: &str) -> String {
        let Some(provider) = &self.provider else {
            return CONFIG_MISSING_DIGEST.to_string();
        };

        let query = format!("{} {}", name, QUERY_SUFFIX);
        tracing::debug!("Searching for medicine information: {}", query);

        match provider.search(&query, RESULT_LIMIT).await {
            Ok(hits) if hits.is_empty() => format!("No information found for {}.", name),
            Ok(hits) => compile_digest(name, &hits),
            Err(e) => {
                tracing::warn!("Medicine search failed: {}", e);
                format!("Error searching for medicine information: {}", e)
            }
        }
    }
}

fn compile_digest(name: &str, hits: &[SearchHit]) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "N/A".to_string());

    let mut digest = format!("Search Results for {}:\n\n", name);
    for hit in hits.iter().take(RESULT_LIMIT as usize) {
        digest.push_str(&format!("Title: {}\n", field(&hit.title)));
        digest.push_str(&format!("Source: {}\n", field(&hit.display_link)));
        digest.push_str(&format!("Snippet: {}\n\n", field(&hit.snippet)));
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeProvider {
        hits: Result<Vec<SearchHit>, ProviderError>,
        calls: AtomicUsize,
        last_query: std::sync::Mutex<Option<String>>,
    }

    impl FakeProvider {
        fn returning(hits: Vec<SearchHit>) -> Self {
            Self {
                hits: Ok(hits),
                calls: AtomicUsize::new(0),
                last_query: std::sync::Mutex::new(None),
            }
        }

        fn failing(error: ProviderError) -> Self {
            Self {
                hits: Err(error),
                calls: AtomicUsize::new(0),
                last_query: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        async fn search(&self, query: &str, _limit: u8) -> Result<Vec<SearchHit>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_query.lock().unwrap() = Some(query.to_string());
            match &self.hits {
                Ok(hits) => Ok(hits.clone()),
                Err(ProviderError::Timeout) => Err(ProviderError::Timeout),
                Err(e) => Err(ProviderError::Transport(e.to_string())),
            }
        }
    }

    fn hit(title: Option<&str>, link: Option<&str>, snippet: Option<&str>) -> SearchHit {
        SearchHit {
            title: title.map(String::from),
            display_link: link.map(String::from),
            snippet: snippet.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_disabled_retriever_returns_config_message_without_calling_provider() {
        let retriever = InfoRetriever::disabled();
        let digest = retriever.digest("PARACETAMOL").await;
        assert_eq!(digest, CONFIG_MISSING_DIGEST);
    }

    #[tokio::test]
    async fn test_query_appends_fixed_suffix() {
        let provider = Arc::new(FakeProvider::returning(vec![]));
        let retriever = InfoRetriever::new(provider.clone());

        retriever.digest("PARACETAMOL").await;

        assert_eq!(
            provider.last_query.lock().unwrap().as_deref(),
            Some("PARACETAMOL medicine usage information dosage")
        );
    }

    #[tokio::test]
    async fn test_empty_results_yield_not_found_message() {
        let provider = Arc::new(FakeProvider::returning(vec![]));
        let retriever = InfoRetriever::new(provider.clone());

        let digest = retriever.digest("PARACETAMOL").await;

        assert_eq!(digest, "No information found for PARACETAMOL.");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_digest_compiles_title_source_snippet_blocks() {
        let provider = Arc::new(FakeProvider::returning(vec![
            hit(
                Some("Paracetamol - uses"),
                Some("nhs.uk"),
                Some("Used to treat pain and fever."),
            ),
            hit(None, Some("drugs.com"), None),
        ]));
        let retriever = InfoRetriever::new(provider);

        let digest = retriever.digest("PARACETAMOL").await;

        assert!(digest.starts_with("Search Results for PARACETAMOL:\n\n"));
        assert!(digest.contains("Title: Paracetamol - uses\n"));
        assert!(digest.contains("Source: nhs.uk\n"));
        assert!(digest.contains("Snippet: Used to treat pain and fever.\n"));
        // Missing fields default to N/A
        assert!(digest.contains("Title: N/A\n"));
        assert!(digest.contains("Snippet: N/A\n"));
    }

    #[tokio::test]
    async fn test_digest_caps_at_three_results() {
        let hits: Vec<SearchHit> = (0..5)
            .map(|i| SearchHit {
                title: Some(format!("result {}", i)),
                display_link: None,
                snippet: None,
            })
            .collect();
        let retriever = InfoRetriever::new(Arc::new(FakeProvider::returning(hits)));

        let digest = retriever.digest("ASPIRIN").await;

        assert!(digest.contains("result 2"));
        assert!(!digest.contains("result 3"));
    }

    #[tokio::test]
    async fn test_provider_failure_becomes_digest_text() {
        let retriever = InfoRetriever::new(Arc::new(FakeProvider::failing(
            ProviderError::Transport("connection refused".to_string()),
        )));

        let digest = retriever.digest("ASPIRIN").await;

        assert!(digest.starts_with("Error searching for medicine information:"));
        assert!(digest.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_timeout_failure_becomes_digest_text() {
        let retriever =
            InfoRetriever::new(Arc::new(FakeProvider::failing(ProviderError::Timeout)));

        let digest = retriever.digest("ASPIRIN").await;

        assert!(digest.contains("request timed out"));
    }
}
