//! Listing-page extraction.
//!
//! Parses rendered listing HTML into [`JobPosting`](crate::posting::JobPosting)
//! rows and finds the pager link to the next page.

pub mod fields;
pub mod listing;
pub mod pager;

pub use listing::extract_postings;
pub use pager::find_next_page;
