//! Feed model, origin fetching, recency filtering and output rendering.

pub mod builder;
pub mod fetcher;
pub mod filter;
pub mod types;

pub use builder::{build, render_atom, OutputAuthor, OutputFeed, OutputItem, ATOM_CONTENT_TYPE};
pub use fetcher::{parse_feed, validate_url, FeedSource, HttpFeedSource};
pub use filter::{select, MAX_ITEMS};
pub use types::{Author, Feed, Item};
