//! Message delivery for SendNews.
//!
//! [`FanoutDelivery`] sends one text to many recipients over a
//! [`MessageTransport`], turning every failure into a [`DeliveryOutcome`]
//! so one unreachable chat never aborts a broadcast.

pub mod fanout;
pub mod outcome;
pub mod transport;

pub use fanout::{FanoutDelivery, DEFAULT_MAX_CONCURRENT_SENDS, DEFAULT_SEND_TIMEOUT};
pub use outcome::{DeliveryOutcome, DeliveryReport, DeliveryStatus, FailureKind};
pub use transport::{MessageTransport, ParseMode, TransportError};
