//! Scrape a careers site, keep the professional-grade postings, and
//! publish them as an RSS feed that grows across runs.

pub mod acquisition;
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod feed;
pub mod pipeline;
pub mod posting;
pub mod renderer;

pub use config::Config;
pub use error::{FeedError, FetchError, Result};
pub use pipeline::{run_cycle, CycleOutcome, CycleReport, Persist};
