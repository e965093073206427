//! Feed producer (method `feed`): JSON API first, RSS feed as fallback.
//!
//! The JSON API is tried first because it carries full content. When it is
//! unreachable or returns no items, the section's RSS feed is read instead
//! and each entry's article page supplies the body text.
//!
//! # RSS fields
//!
//! | Record field | RSS source |
//! |--------------|------------|
//! | title | `<title>` |
//! | link | `<link>` |
//! | publication_date | `<pubDate>` |
//! | summary | `<description>`, HTML stripped |
//! | image_url | `<media:content url>`, image `<enclosure>`, or first `<img>` in the description |
//! | tags | `<category>` |
//! | author | `<author>` or `<dc:creator>` |

use super::ProducerError;
use super::article::enrich;
use crate::classifier::is_fact_check;
use crate::config::Config;
use crate::fetch::{Accept, FetchAsync};
use crate::models::{Method, RawRecord};
use crate::utils::{clean_text, collapse_whitespace};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{info, instrument, warn};

static IMG: Lazy<Selector> = Lazy::new(|| Selector::parse("img[src]").expect("img selector"));

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    items: Vec<ApiItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiItem {
    title: Option<String>,
    url: Option<String>,
    published: Option<String>,
    summary: Option<String>,
    image: Option<ApiImage>,
    content: Option<String>,
    tags: Vec<String>,
    author: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "category")]
    categories: Vec<Category>,
    author: Option<String>,
    #[serde(rename = "creator", alias = "dc:creator")]
    creator: Option<String>,
    #[serde(rename = "content", alias = "media:content")]
    media: Vec<MediaContent>,
    #[serde(rename = "enclosure")]
    enclosures: Vec<Enclosure>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Category {
    #[serde(rename = "$text")]
    term: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaContent {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    kind: Option<String>,
}

/// Parse the JSON API body (`{"items": [...]}`).
pub fn parse_api(json: &str) -> Result<Vec<RawRecord>, serde_json::Error> {
    let response: ApiResponse = serde_json::from_str(json)?;
    Ok(response
        .items
        .into_iter()
        .map(|item| RawRecord {
            title: item.title,
            link: item.url,
            publication_date: item.published,
            summary: item.summary,
            image_url: item.image.and_then(|i| i.url),
            content: item.content,
            tags: item.tags,
            author: item.author,
        })
        .collect())
}

/// Parse an RSS 2.0 document, keeping only fact-check entries.
pub fn parse_rss(xml: &str) -> Result<Vec<RawRecord>, quick_xml::DeError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    Ok(rss
        .channel
        .items
        .into_iter()
        .filter(|item| {
            is_fact_check(
                item.title.as_deref().unwrap_or_default(),
                item.link.as_deref().unwrap_or_default(),
            )
        })
        .map(rss_item_to_raw)
        .collect())
}

fn rss_item_to_raw(item: RssItem) -> RawRecord {
    let description = item.description.as_deref().map(Html::parse_fragment);

    let image_url = item
        .media
        .iter()
        .find_map(|m| m.url.clone())
        .or_else(|| {
            item.enclosures
                .iter()
                .filter(|e| e.kind.as_deref().is_some_and(|k| k.starts_with("image/")))
                .find_map(|e| e.url.clone())
        })
        .or_else(|| {
            description.as_ref().and_then(|doc| {
                doc.select(&IMG)
                    .next()
                    .and_then(|img| img.value().attr("src"))
                    .map(str::to_string)
            })
        });

    let summary = description.as_ref().and_then(|doc| {
        let text = doc.root_element().text().collect::<Vec<_>>().join(" ");
        clean_text(Some(text.as_str()))
    });

    RawRecord {
        title: item.title,
        link: item.link.map(|l| l.trim().to_string()),
        publication_date: item.pub_date,
        summary,
        image_url,
        content: None,
        tags: item
            .categories
            .into_iter()
            .map(|c| collapse_whitespace(&c.term))
            .filter(|t| !t.is_empty())
            .collect(),
        author: item.author.or(item.creator),
    }
}

#[instrument(level = "info", skip_all, fields(url = %url))]
async fn from_api<F: FetchAsync>(fetcher: &F, url: &str) -> Result<Vec<RawRecord>, ProducerError> {
    let body = fetcher.fetch(url, Accept::Json).await?;
    match parse_api(&body) {
        Ok(records) => Ok(records),
        Err(e) => {
            warn!(error = %e, "API answered with unexpected JSON");
            Ok(Vec::new())
        }
    }
}

#[instrument(level = "info", skip_all, fields(url = %url))]
async fn from_rss<F: FetchAsync>(fetcher: &F, url: &str) -> Result<Vec<RawRecord>, ProducerError> {
    let body = fetcher.fetch(url, Accept::Feed).await?;
    let records = parse_rss(&body)?;
    info!(count = records.len(), "Parsed RSS feed");
    Ok(records)
}

/// Collect records from the JSON API, or from the RSS feed when the API
/// yields nothing.
///
/// # Errors
///
/// Fails the method only when the RSS fallback itself cannot be fetched or
/// parsed.
#[instrument(level = "info", skip_all)]
pub async fn collect<F: FetchAsync>(
    fetcher: &F,
    config: &Config,
) -> Result<Vec<RawRecord>, ProducerError> {
    match from_api(fetcher, &config.api_url).await {
        Ok(records) if !records.is_empty() => {
            info!(count = records.len(), "Collected records from JSON API");
            return Ok(records);
        }
        Ok(_) => info!("JSON API returned no items; trying RSS"),
        Err(e) => warn!(error = %e, "JSON API unavailable; trying RSS"),
    }

    let records = from_rss(fetcher, &config.rss_url).await?;
    let records = enrich(fetcher, Method::Feed, records, &config.pause_ms.range()).await;
    info!(count = records.len(), "Collected records from RSS");
    Ok(records)
}
