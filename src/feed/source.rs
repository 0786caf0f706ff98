//! Feed source abstraction and multi-source collection.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::feed::types::FeedEntry;
use crate::Result;

/// Something that turns a feed URL into an ordered list of entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse the feed at `url`.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>>;
}

/// Fetch every URL in order and return one entry list per URL.
///
/// A source that fails contributes an empty list for this cycle; the
/// other sources are unaffected. `max_items` caps each list (0 = no cap).
pub async fn collect_entries(
    source: &dyn FeedSource,
    urls: &[String],
    max_items: usize,
) -> Vec<Vec<FeedEntry>> {
    let mut sections = Vec::with_capacity(urls.len());

    for url in urls {
        let entries = match source.fetch(url).await {
            Ok(mut entries) => {
                if max_items > 0 {
                    entries.truncate(max_items);
                }
                debug!("Fetched {} entries from {}", entries.len(), url);
                entries
            }
            Err(e) => {
                warn!("Feed {} unavailable, skipping this cycle: {}", url, e);
                Vec::new()
            }
        };
        sections.push(entries);
    }

    sections
}
