//! Turn producer output into canonical, classified records.
//!
//! Every [`RawRecord`] is mapped onto the fixed [`Record`] field set: text is
//! whitespace-collapsed, empty values become absent, the link is reduced to
//! its canonical form, and the label is derived from the title and summary.

use crate::classifier::{classification_text, classify};
use crate::models::{Method, RawRecord, Record};
use crate::pipeline::RunContext;
use crate::utils::{clean_text, collapse_whitespace, title_key, truncate_for_log};
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Prefix of the identity given to records that carry a title but no link.
pub const FALLBACK_LINK_PREFIX: &str = "title:";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// Neither title nor link survived cleanup; the record cannot be identified.
    #[error("record has neither title nor link")]
    Unidentifiable,
}

/// Reduce a URL to scheme, host, explicit port and path.
///
/// Query strings and fragments are dropped (G1 appends tracking parameters
/// that differ between the listing page and the feed), and trailing slashes
/// are removed. Input that does not parse as an absolute URL is kept as-is,
/// trimmed and without trailing slashes, so it still compares stably.
/// Fallback `title:` identities are already canonical and only trimmed.
pub fn canonicalize_link(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with(FALLBACK_LINK_PREFIX) {
        return trimmed.to_string();
    }
    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
            let path = url.path().trim_end_matches('/');
            format!("{}://{}{}{}", url.scheme(), host, port, path)
        }
        _ => trimmed.trim_end_matches('/').to_string(),
    }
}

/// Map one raw record onto the canonical schema.
///
/// `extracted_at` is the run's single timestamp and `methods` holds exactly
/// `method`. Missing optional fields never fail; only a record with neither a
/// title nor a link is rejected.
pub fn normalize(
    raw: RawRecord,
    method: Method,
    now: DateTime<Utc>,
) -> Result<Record, NormalizeError> {
    let title = raw
        .title
        .as_deref()
        .map(collapse_whitespace)
        .unwrap_or_default();
    let link = raw
        .link
        .as_deref()
        .map(canonicalize_link)
        .filter(|l| !l.is_empty());

    let link = match (link, title.is_empty()) {
        (Some(link), _) => link,
        (None, false) => format!("{FALLBACK_LINK_PREFIX}{}", title_key(&title)),
        (None, true) => return Err(NormalizeError::Unidentifiable),
    };

    let summary = clean_text(raw.summary.as_deref());
    let classification = classify(&classification_text(&title, summary.as_deref()));

    let tags = raw
        .tags
        .iter()
        .map(|t| collapse_whitespace(t))
        .filter(|t| !t.is_empty())
        .unique()
        .collect();

    Ok(Record {
        title,
        link,
        publication_date: clean_text(raw.publication_date.as_deref()),
        summary,
        classification,
        image_url: raw
            .image_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty()),
        content: clean_text(raw.content.as_deref()),
        tags,
        author: clean_text(raw.author.as_deref()),
        extracted_at: now,
        methods: BTreeSet::from([method]),
    })
}

/// Normalize a producer's whole batch, dropping unidentifiable records.
///
/// Drops are logged and counted in `ctx`; they never abort the batch.
pub fn normalize_batch(ctx: &mut RunContext, method: Method, raws: Vec<RawRecord>) -> Vec<Record> {
    let total = raws.len();
    let mut records = Vec::with_capacity(total);

    for (index, raw) in raws.into_iter().enumerate() {
        match normalize(raw, method, ctx.extracted_at) {
            Ok(record) => {
                debug!(
                    %method,
                    link = %record.link,
                    title = %truncate_for_log(&record.title, 80),
                    classification = %record.classification,
                    "Normalized record"
                );
                records.push(record);
            }
            Err(e) => {
                warn!(%method, index, error = %e, "Dropping unidentifiable record");
                ctx.dropped += 1;
            }
        }
    }

    debug!(%method, total, kept = records.len(), "Normalized batch");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap()
    }

    fn raw(title: Option<&str>, link: Option<&str>) -> RawRecord {
        RawRecord {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_canonicalize_link_strips_query_and_slash() {
        assert_eq!(
            canonicalize_link("https://g1.globo.com/x?utm=1"),
            "https://g1.globo.com/x"
        );
        assert_eq!(
            canonicalize_link("https://G1.globo.com/fato-ou-fake/noticia/a.ghtml/#topo"),
            "https://g1.globo.com/fato-ou-fake/noticia/a.ghtml"
        );
        assert_eq!(canonicalize_link("  https://g1.globo.com/  "), "https://g1.globo.com");
    }

    #[test]
    fn test_canonicalize_link_keeps_explicit_port() {
        assert_eq!(
            canonicalize_link("http://127.0.0.1:8080/a/?page=2"),
            "http://127.0.0.1:8080/a"
        );
        assert_eq!(canonicalize_link("https://g1.globo.com:443/a"), "https://g1.globo.com/a");
    }

    #[test]
    fn test_canonicalize_link_fallback_for_relative() {
        assert_eq!(canonicalize_link("/fato-ou-fake/x/"), "/fato-ou-fake/x");
    }

    #[test]
    fn test_normalize_sets_method_and_timestamp() {
        let r = normalize(
            raw(Some("É #FAKE que..."), Some("https://g1.globo.com/x")),
            Method::Feed,
            now(),
        )
        .unwrap();

        assert_eq!(r.methods, BTreeSet::from([Method::Feed]));
        assert_eq!(r.extracted_at, now());
        assert_eq!(r.classification, Classification::Fake);
    }

    #[test]
    fn test_normalize_missing_optionals_become_absent() {
        let mut input = raw(Some("  Título \n"), Some("https://g1.globo.com/x"));
        input.summary = Some("   ".to_string());
        input.author = Some("".to_string());
        input.tags = vec![" política ".to_string(), "".to_string(), "política".to_string()];

        let r = normalize(input, Method::Scraping, now()).unwrap();
        assert_eq!(r.title, "Título");
        assert_eq!(r.summary, None);
        assert_eq!(r.author, None);
        assert_eq!(r.content, None);
        assert_eq!(r.tags, vec!["política".to_string()]);
    }

    #[test]
    fn test_normalize_uses_summary_for_classification() {
        let mut input = raw(Some("Mensagem sobre urnas"), Some("https://g1.globo.com/x"));
        input.summary = Some("boato desmentido".to_string());
        let r = normalize(input, Method::Feed, now()).unwrap();
        assert_eq!(r.classification, Classification::Fake);
    }

    #[test]
    fn test_normalize_ignores_content_for_classification() {
        let mut input = raw(Some("Mensagem sobre urnas"), Some("https://g1.globo.com/x"));
        input.content = Some("isto é fake".to_string());
        let r = normalize(input, Method::Feed, now()).unwrap();
        assert_eq!(r.classification, Classification::Indeterminado);
    }

    #[test]
    fn test_normalize_title_only_gets_fallback_link() {
        let r = normalize(raw(Some("É FATO que chove"), None), Method::Scraping, now()).unwrap();
        assert_eq!(r.link, "title:é fato que chove");
    }

    #[test]
    fn test_fallback_link_is_stable_under_canonicalization() {
        let r = normalize(raw(Some("Boato: 1/2/"), None), Method::Scraping, now()).unwrap();
        assert_eq!(r.link, "title:boato: 1/2/");
        assert_eq!(canonicalize_link(&r.link), r.link);
    }

    #[test]
    fn test_punctuation_keeps_title_only_records_apart() {
        let mut ctx = RunContext::new(now());
        let records = normalize_batch(
            &mut ctx,
            Method::Scraping,
            vec![raw(Some("É fake?"), None), raw(Some("É fake!"), None)],
        );
        assert_eq!(records.len(), 2);
        assert_ne!(records[0].link, records[1].link);
    }

    #[test]
    fn test_normalize_link_only_has_empty_title() {
        let r = normalize(raw(None, Some("https://g1.globo.com/x")), Method::Feed, now()).unwrap();
        assert_eq!(r.title, "");
        assert_eq!(r.link, "https://g1.globo.com/x");
    }

    #[test]
    fn test_normalize_rejects_unidentifiable() {
        assert_eq!(
            normalize(raw(None, None), Method::Feed, now()),
            Err(NormalizeError::Unidentifiable)
        );
        assert_eq!(
            normalize(raw(Some("  "), Some(" ")), Method::Feed, now()),
            Err(NormalizeError::Unidentifiable)
        );
    }

    #[test]
    fn test_normalize_batch_drops_one_of_five() {
        let mut ctx = RunContext::new(now());
        let batch = vec![
            raw(Some("a"), Some("https://g1.globo.com/a")),
            raw(Some("b"), Some("https://g1.globo.com/b")),
            raw(None, None),
            raw(None, Some("https://g1.globo.com/d")),
            raw(Some("e"), None),
        ];

        let records = normalize_batch(&mut ctx, Method::Scraping, batch);
        assert_eq!(records.len(), 4);
        assert_eq!(ctx.dropped, 1);
    }
}
