//! Subscriber registry for SendNews.
//!
//! Keeps the set of chats that opted in to broadcasts, persisted to a
//! line-oriented file.

pub mod registry;
pub mod store;
pub mod types;

pub use registry::SubscriberRegistry;
pub use store::SubscriberStore;
pub use types::ChatId;
