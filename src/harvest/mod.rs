//! Metadata harvesting over paginated search results.
//!
//! Drives the browser through pages `1..=N` of a search, lets each page
//! settle, then extracts a candidate per result element. A malformed item
//! or an unreachable page is logged and skipped; the harvest never aborts
//! on a single bad record.

mod extract;

pub use extract::FieldExtractor;

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::browser::BrowserSession;
use crate::config::SearchConfig;
use crate::models::RawCandidate;

/// Drives pagination and per-item extraction for one search query.
pub struct MetadataHarvester<'a, B: BrowserSession> {
    session: &'a B,
    config: &'a SearchConfig,
}

impl<'a, B: BrowserSession> MetadataHarvester<'a, B> {
    pub fn new(session: &'a B, config: &'a SearchConfig) -> Self {
        Self { session, config }
    }

    /// Build the search URL for one page: query-encoded term plus the fixed
    /// language/filetype/page-range filter clause.
    pub fn search_url(&self, query: &str, page: u32) -> String {
        let filters = serde_json::json!({
            "language": self.config.languages,
            "filetype": self.config.file_types,
            "num_pages": self.config.page_length,
        });
        format!(
            "{}?query={}&ct_lang=1&filters={}&page={}",
            self.config.base_url,
            urlencoding::encode(query),
            urlencoding::encode(&filters.to_string()),
            page
        )
    }

    /// Harvest candidates from pages `1..=pages`.
    ///
    /// The settle delay is a fixed-delay heuristic: the site renders results
    /// client-side with no explicit "ready" signal to wait on.
    pub async fn harvest(&self, query: &str, pages: u32) -> Vec<RawCandidate> {
        let extractor = FieldExtractor::new(&self.config.rules);
        let mut candidates = Vec::new();

        for page in 1..=pages {
            let url = self.search_url(query, page);
            info!("Harvesting search page {}/{}", page, pages);

            if let Err(e) = self.session.navigate(&url).await {
                warn!("Skipping search page {}: {}", page, e);
                continue;
            }

            tokio::time::sleep(Duration::from_secs(self.config.settle_delay_secs)).await;

            let elements = match self.session.query(&self.config.rules.result).await {
                Ok(elements) => elements,
                Err(e) => {
                    warn!("Skipping search page {}: {}", page, e);
                    continue;
                }
            };
            debug!("Page {} rendered {} result elements", page, elements.len());

            for element in &elements {
                match extractor.extract(self.session, element).await {
                    Ok(mut candidate) => {
                        candidate.url = resolve_url(&self.config.base_url, &candidate.url);
                        candidates.push(candidate);
                    }
                    Err(e) => warn!("Skipped a result item on page {}: {}", page, e),
                }
            }
        }

        candidates
    }
}

/// Resolve a possibly relative href against the search site.
fn resolve_url(base_url: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    url::Url::parse(base_url)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}
