//! The merge-classify-deduplicate pipeline of one extraction run.
//!
//! Producers hand over one [`MethodBatch`] each; [`run`] then applies, in
//! order:
//! 1. **Normalize + classify** every raw record of every batch
//! 2. **Deduplicate** the whole collection by canonical link
//! 3. **Assemble** the ordered [`Dataset`]
//!
//! The pipeline is synchronous and owns its data. All run-scoped state lives
//! in [`RunContext`], which is created once per run and passed to each stage.

use crate::assembler::assemble;
use crate::dedup::deduplicate;
use crate::models::{AmbiguousClassification, Dataset, Method, RawRecord};
use crate::normalizer::normalize_batch;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Raw output of one producer.
#[derive(Debug, Clone)]
pub struct MethodBatch {
    pub method: Method,
    pub records: Vec<RawRecord>,
}

impl MethodBatch {
    pub fn new(method: Method, records: Vec<RawRecord>) -> Self {
        Self { method, records }
    }
}

/// State scoped to one extraction run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Single timestamp stamped on every record of the run.
    pub extracted_at: DateTime<Utc>,
    /// Raw records received per method, before normalization.
    pub raw_counts: BTreeMap<Method, usize>,
    /// Raw records dropped as unidentifiable.
    pub dropped: usize,
    /// Groups that disagreed on FATO vs FAKE.
    pub ambiguities: Vec<AmbiguousClassification>,
}

impl RunContext {
    pub fn new(extracted_at: DateTime<Utc>) -> Self {
        Self {
            extracted_at,
            raw_counts: BTreeMap::new(),
            dropped: 0,
            ambiguities: Vec::new(),
        }
    }
}

/// Run the core pipeline over every producer's batch.
///
/// Never fails: unidentifiable records are skipped and conflicting labels
/// are resolved, both recorded in `ctx`. No batches, or only empty ones,
/// yield an empty dataset.
#[instrument(level = "info", skip_all, fields(batches = batches.len()))]
pub fn run(ctx: &mut RunContext, batches: Vec<MethodBatch>) -> Dataset {
    let mut records = Vec::new();
    for batch in batches {
        *ctx.raw_counts.entry(batch.method).or_insert(0) += batch.records.len();
        records.extend(normalize_batch(ctx, batch.method, batch.records));
    }
    let normalized = records.len();

    let merged = deduplicate(ctx, records);
    let duplicates = normalized - merged.len();
    let dataset = assemble(merged);

    info!(
        raw = ctx.raw_counts.values().sum::<usize>(),
        dropped = ctx.dropped,
        normalized,
        duplicates,
        ambiguous = ctx.ambiguities.len(),
        rows = dataset.len(),
        "Pipeline completed"
    );
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Classification;
    use chrono::TimeZone;
    use std::collections::BTreeSet;

    fn ctx() -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap())
    }

    fn raw(title: Option<&str>, link: Option<&str>, summary: Option<&str>) -> RawRecord {
        RawRecord {
            title: title.map(str::to_string),
            link: link.map(str::to_string),
            summary: summary.map(str::to_string),
            ..RawRecord::default()
        }
    }

    #[test]
    fn test_scraping_and_feed_merge_into_one_fake() {
        let scraping = MethodBatch::new(
            Method::Scraping,
            vec![raw(
                Some("Vídeo mostra fraude é #FAKE"),
                Some("https://g1.globo.com/x?utm=1"),
                None,
            )],
        );
        let feed = MethodBatch::new(
            Method::Feed,
            vec![raw(None, Some("https://g1.globo.com/x"), Some("boato desmentido"))],
        );

        let mut ctx = ctx();
        let dataset = run(&mut ctx, vec![scraping, feed]);

        assert_eq!(dataset.len(), 1);
        let row = &dataset.rows()[0];
        assert_eq!(row.link, "https://g1.globo.com/x");
        assert_eq!(row.methods, BTreeSet::from([Method::Feed, Method::Scraping]));
        assert_eq!(row.classification, Classification::Fake);
        assert_eq!(row.title, "Vídeo mostra fraude é #FAKE");
        assert_eq!(row.summary.as_deref(), Some("boato desmentido"));
        assert!(ctx.ambiguities.is_empty());
        assert_eq!(ctx.raw_counts[&Method::Scraping], 1);
        assert_eq!(ctx.raw_counts[&Method::Feed], 1);
    }

    #[test]
    fn test_empty_input_is_not_an_error() {
        let mut ctx = ctx();
        assert!(run(&mut ctx, vec![]).is_empty());
        assert!(run(&mut ctx, vec![MethodBatch::new(Method::Feed, vec![])]).is_empty());
    }

    #[test]
    fn test_every_row_stamped_with_run_time() {
        let mut ctx = ctx();
        let batch = MethodBatch::new(
            Method::Scraping,
            vec![
                raw(Some("a"), Some("https://g1.globo.com/b"), None),
                raw(Some("b"), Some("https://g1.globo.com/a"), None),
                raw(None, None, Some("sem identidade")),
            ],
        );
        let dataset = run(&mut ctx, vec![batch]);

        assert_eq!(dataset.len(), 2);
        assert_eq!(ctx.dropped, 1);
        assert!(dataset.rows().iter().all(|r| r.extracted_at == ctx.extracted_at));
        // same timestamp, so ordered by link
        assert_eq!(dataset.rows()[0].link, "https://g1.globo.com/a");
    }

    #[test]
    fn test_title_only_headlines_differing_in_punctuation_stay_apart() {
        let batch = MethodBatch::new(
            Method::Scraping,
            vec![raw(Some("É fake?"), None, None), raw(Some("É fake!"), None, None)],
        );
        let mut ctx = ctx();
        let dataset = run(&mut ctx, vec![batch]);

        assert_eq!(dataset.len(), 2);
        let links: Vec<&str> = dataset.rows().iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links, vec!["title:é fake!", "title:é fake?"]);
    }

    #[test]
    fn test_conflicting_labels_are_audited() {
        let scraping = MethodBatch::new(
            Method::Scraping,
            vec![raw(Some("É FATO que ponte caiu"), Some("https://g1.globo.com/p"), None)],
        );
        let mut feed_raw = raw(Some("Ponte caiu? É #FAKE"), Some("https://g1.globo.com/p/"), None);
        feed_raw.content = Some("texto completo".to_string());
        feed_raw.author = Some("g1".to_string());
        let feed = MethodBatch::new(Method::Feed, vec![feed_raw]);

        let mut ctx = ctx();
        let dataset = run(&mut ctx, vec![scraping, feed]);

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.rows()[0].classification, Classification::Fake);
        assert_eq!(ctx.ambiguities.len(), 1);
        assert_eq!(ctx.ambiguities[0].link, "https://g1.globo.com/p");
    }
}
