//! The accumulating RSS feed: model, merge, codec and persistence.

pub mod accumulator;
pub mod model;
pub mod rss;
pub mod store;

pub use accumulator::accumulate;
pub use model::{Channel, FeedDocument, FeedEntry};
pub use rss::{from_rss, to_rss};
