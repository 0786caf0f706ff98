//! Feed retrieval for SendNews.

pub mod fetcher;
pub mod source;
pub mod types;

pub use fetcher::{parse_feed, RssFetcher};
pub use source::{collect_entries, FeedSource};
pub use types::FeedEntry;
