//! G1 article pages: body text, topic tags and author.
//!
//! Both producers only see a headline and a blurb in their listing; the full
//! story comes from the article page itself.

use crate::fetch::{Accept, FetchAsync, polite_pause};
use crate::models::{Method, RawRecord};
use crate::utils::{clean_text, collapse_whitespace};
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::ops::RangeInclusive;
use tracing::{debug, info, instrument, warn};

static CONTENT_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".content-text__container p").expect("content selector"));
static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("article selector"));
static TAGS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".entities__list-item").expect("tags selector"));
static AUTHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".content-publication-data__from").expect("author selector"));

/// Details read from one article page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleDetails {
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

/// Text of an element with whitespace collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Parse an article page.
///
/// Content is the page's body paragraphs joined with spaces; pages without
/// the usual G1 container fall back to any `<article>` paragraphs.
pub fn parse_article(html: &str) -> ArticleDetails {
    let document = Html::parse_document(html);

    let join = |selector: &Selector| {
        document
            .select(selector)
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };
    let mut content = join(&CONTENT_PARAGRAPHS);
    if content.is_empty() {
        content = join(&ARTICLE_PARAGRAPHS);
    }

    let tags = document
        .select(&TAGS)
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    let author = document
        .select(&AUTHOR)
        .next()
        .and_then(|el| clean_text(Some(element_text(el).as_str())));

    ArticleDetails {
        content: clean_text(Some(content.as_str())),
        tags,
        author,
    }
}

/// Fill missing content, tags and author from each record's article page.
///
/// Pages are fetched one after another with a random pause in between.
/// A page that cannot be fetched leaves its record untouched.
#[instrument(level = "info", skip_all, fields(%method, count = records.len()))]
pub async fn enrich<F: FetchAsync>(
    fetcher: &F,
    method: Method,
    records: Vec<RawRecord>,
    pause_ms: &RangeInclusive<u64>,
) -> Vec<RawRecord> {
    let enriched: Vec<RawRecord> = stream::iter(records)
        .then(|mut record| async move {
            let Some(link) = record.link.clone() else {
                return record;
            };
            polite_pause(pause_ms).await;
            match fetcher.fetch(&link, Accept::Html).await {
                Ok(html) => {
                    let details = parse_article(&html);
                    debug!(
                        url = %link,
                        content_bytes = details.content.as_ref().map_or(0, |c| c.len()),
                        tags = details.tags.len(),
                        "Parsed article page"
                    );
                    if record.content.is_none() {
                        record.content = details.content;
                    }
                    if record.tags.is_empty() {
                        record.tags = details.tags;
                    }
                    if record.author.is_none() {
                        record.author = details.author;
                    }
                }
                Err(e) => {
                    warn!(url = %link, error = %e, "Article page failed; keeping record without details");
                }
            }
            record
        })
        .collect()
        .await;

    info!(count = enriched.len(), "Enriched records from article pages");
    enriched
}
