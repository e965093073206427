//! G1 Fato ou Fake listing-page scraper (method `scraping`).
//!
//! This module scrapes the section's listing at
//! [g1.globo.com/fato-ou-fake](https://g1.globo.com/fato-ou-fake/). Every card
//! yields a headline, link, printed date, blurb and thumbnail; the article
//! page then adds the body text, tags and author.
//!
//! # URL Pattern
//!
//! Page 1 is the section URL itself; further pages append `?page=N`.
//! Pagination stops at the first page that cannot be fetched.

use super::ProducerError;
use super::article::{element_text, enrich};
use crate::classifier::is_fact_check;
use crate::config::Config;
use crate::fetch::{Accept, FetchAsync};
use crate::models::{Method, RawRecord};
use crate::utils::clean_text;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

static POST_BODY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".feed-post-body").expect("post body selector"));
static POST_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".feed-post-link").expect("post link selector"));
static POST_DATETIME: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".feed-post-datetime").expect("post datetime selector"));
static POST_SUMMARY: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".feed-post-body-resumo").expect("post summary selector"));
static POST_IMAGE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".feed-post-figure img").expect("post image selector"));

/// URL of listing page `page` (1-based).
pub fn page_url(base: &Url, page: u32) -> Url {
    let mut url = base.clone();
    if page > 1 {
        url.query_pairs_mut().append_pair("page", &page.to_string());
    }
    url
}

/// Extract fact-check cards from one listing page.
///
/// Relative links and image URLs are resolved against `base`. Cards without
/// a link, or that do not look like a fact-check, are skipped.
pub fn parse_listing(html: &str, base: &Url) -> Vec<RawRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for card in document.select(&POST_BODY) {
        let Some(anchor) = card.select(&POST_LINK).next() else {
            continue;
        };
        let title = element_text(anchor);
        let Some(link) = anchor
            .value()
            .attr("href")
            .and_then(|href| base.join(href).ok())
            .map(|u| u.to_string())
        else {
            debug!(%title, "Card without usable link");
            continue;
        };
        if !is_fact_check(&title, &link) {
            debug!(%title, %link, "Skipping card that is not a fact-check");
            continue;
        }

        let text_of = |selector: &Selector| {
            card.select(selector)
                .next()
                .and_then(|el| clean_text(Some(element_text(el).as_str())))
        };
        let image_url = card
            .select(&POST_IMAGE)
            .next()
            .and_then(|img| img.value().attr("src"))
            .and_then(|src| base.join(src).ok())
            .map(|u| u.to_string());

        records.push(RawRecord {
            title: Some(title),
            link: Some(link),
            publication_date: text_of(&POST_DATETIME),
            summary: text_of(&POST_SUMMARY),
            image_url,
            ..RawRecord::default()
        });
    }

    records
}

/// Scrape `pages` listing pages and enrich every card from its article page.
///
/// # Errors
///
/// Fails the method when the listing URL is invalid or the first page
/// cannot be fetched. Later page failures end pagination early.
#[instrument(level = "info", skip_all, fields(pages = pages))]
pub async fn collect<F: FetchAsync>(
    fetcher: &F,
    config: &Config,
    pages: u32,
) -> Result<Vec<RawRecord>, ProducerError> {
    let base = Url::parse(&config.listing_url).map_err(|source| ProducerError::Url {
        url: config.listing_url.clone(),
        source,
    })?;

    let mut seen = HashSet::new();
    let mut cards = Vec::new();

    for page in 1..=pages {
        let url = page_url(&base, page);
        let html = match fetcher.fetch(url.as_str(), Accept::Html).await {
            Ok(html) => html,
            Err(e) if page == 1 => return Err(e.into()),
            Err(e) => {
                warn!(page, %url, error = %e, "Listing page failed; stopping pagination");
                break;
            }
        };

        let found = parse_listing(&html, &base);
        let total = found.len();
        cards.extend(
            found
                .into_iter()
                .filter(|r| r.link.as_ref().is_some_and(|l| seen.insert(l.clone()))),
        );
        info!(page, found = total, kept = cards.len(), "Scraped listing page");
    }

    let records = enrich(fetcher, Method::Scraping, cards, &config.pause_ms.range()).await;
    info!(count = records.len(), "Scraping finished");
    Ok(records)
}
