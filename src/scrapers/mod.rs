//! Producers that turn the G1 Fato ou Fake section into raw records.
//!
//! Each producer is one extraction method and runs independently of the
//! other; neither shares state, so `main` may run them concurrently.
//!
//! # Producers
//!
//! | Method | Module | Source | Notes |
//! |--------|--------|--------|-------|
//! | `scraping` | [`g1`] | Listing pages | Paginated with `?page=N`; article pages add content, tags, author |
//! | `feed` | [`feed`] | JSON API, then RSS | RSS parsed with `quick-xml`; article pages add content |
//!
//! # Common Patterns
//!
//! Each producer exports `collect(...)`, which returns every raw record it
//! found or a [`ProducerError`] when the method as a whole failed. A failed
//! article page never fails the method: the record is kept without details.

pub mod article;
pub mod feed;
pub mod g1;

use crate::fetch::FetchError;
use thiserror::Error;

/// A method-level failure: the method contributes no records.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid source url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("malformed RSS feed: {0}")]
    Rss(#[from] quick_xml::DeError),
}
