//! Feed entry type.

/// One entry of a feed, as much of it as a digest needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    /// Entry title. May contain markup from the upstream feed.
    pub title: String,
    /// Entry link. Empty when the feed gave none.
    pub link: String,
}

impl FeedEntry {
    /// Create a new entry.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}
