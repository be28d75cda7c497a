//! # Rates Feed
//!
//! Outbound adapters for the upstream daily rate feed:
//! - `client` - `FeedSource` implementations (HTTP, local file)
//! - `parser` - turns the feed's XML document into raw currency records
//!
//! Parsing is a plain function rather than a port: every writer must use
//! the same parser and normalizer so that all of them store identical values.

pub mod client;
pub mod parser;

pub use client::{DEFAULT_FEED_URL, FileFeed, HttpFeedClient};
pub use parser::parse;
