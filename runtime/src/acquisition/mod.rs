//! Page acquisition: browser discovery and listing fetches.

pub mod browser;
pub mod fetcher;
