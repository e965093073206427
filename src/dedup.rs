//! Identity resolution and merging of records found by several methods.
//!
//! Two records describe the same story iff their canonical links are equal.
//! Headlines are never compared: G1 reuses near-identical titles for distinct
//! checks, and a false merge loses a row for good.
//!
//! # Merge rules
//!
//! Members of a group are ranked by richness (non-absent fields), then by
//! whether the scraper found them, then by earliest `extracted_at`, then by
//! input position. The top-ranked member supplies every scalar field; any
//! field it lacks is filled from the next members in rank order.
//!
//! | Field | Merged value |
//! |-------|--------------|
//! | scalars | top-ranked member, gaps filled by rank |
//! | `tags` | union, first-occurrence order |
//! | `methods` | union |
//! | `extracted_at` | earliest |
//! | `classification` | see [`resolve_classification`] |

use crate::models::{AmbiguousClassification, Classification, Method, Record};
use crate::normalizer::canonicalize_link;
use crate::pipeline::RunContext;
use itertools::Itertools;
use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

/// Collapse records sharing a canonical link into one record per story.
///
/// Links are canonicalized before grouping, so callers may pass records that
/// did not come through the normalizer. Output keeps the order in which each
/// canonical link was first seen. Conflicting FATO/FAKE groups are resolved
/// deterministically and appended to `ctx.ambiguities`.
pub fn deduplicate(ctx: &mut RunContext, records: Vec<Record>) -> Vec<Record> {
    let input = records.len();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<Vec<Record>> = Vec::new();

    for mut record in records {
        record.link = canonicalize_link(&record.link);
        match positions.get(&record.link) {
            Some(&i) => groups[i].push(record),
            None => {
                positions.insert(record.link.clone(), groups.len());
                groups.push(vec![record]);
            }
        }
    }

    let merged: Vec<Record> = groups
        .into_iter()
        .map(|group| merge_group(ctx, group))
        .collect();

    debug!(input, output = merged.len(), "Deduplicated records");
    merged
}

fn merge_group(ctx: &mut RunContext, group: Vec<Record>) -> Record {
    if group.len() > 1 {
        debug!(link = %group[0].link, members = group.len(), "Merging duplicate records");
    }

    let ranked = rank(&group);
    let top = ranked[0];
    let mut merged = top.clone();

    for other in &ranked[1..] {
        if merged.title.is_empty() && !other.title.is_empty() {
            merged.title = other.title.clone();
        }
        fill(&mut merged.publication_date, &other.publication_date);
        fill(&mut merged.summary, &other.summary);
        fill(&mut merged.image_url, &other.image_url);
        fill(&mut merged.content, &other.content);
        fill(&mut merged.author, &other.author);
    }

    merged.tags = group
        .iter()
        .flat_map(|r| r.tags.iter().cloned())
        .unique()
        .collect();
    merged.methods = group
        .iter()
        .flat_map(|r| r.methods.iter().copied())
        .collect::<BTreeSet<Method>>();
    merged.extracted_at = group
        .iter()
        .map(|r| r.extracted_at)
        .min()
        .unwrap_or(top.extracted_at);

    let (classification, ambiguous) = resolve_classification(&ranked);
    merged.classification = classification;

    if ambiguous {
        let labels: Vec<Classification> = group.iter().map(|r| r.classification).collect();
        warn!(
            link = %merged.link,
            labels = ?labels,
            resolved = %classification,
            "Ambiguous classification across duplicate records"
        );
        ctx.ambiguities.push(AmbiguousClassification {
            link: merged.link.clone(),
            labels,
            resolved: classification,
        });
    }

    merged
}

/// Members of one group, best first.
fn rank(group: &[Record]) -> Vec<&Record> {
    group
        .iter()
        .enumerate()
        .sorted_by_key(|(i, r)| {
            (
                Reverse(r.richness()),
                Reverse(r.methods.contains(&Method::Scraping)),
                r.extracted_at,
                *i,
            )
        })
        .map(|(_, r)| r)
        .collect()
}

fn fill(slot: &mut Option<String>, candidate: &Option<String>) {
    if slot.is_none() {
        slot.clone_from(candidate);
    }
}

/// Pick the label of a group from its ranked members.
///
/// Returns the label and whether the group disagreed on FATO vs FAKE.
/// Undecided members never override a decisive one. On disagreement the
/// richest decisive member wins; if the richest decisive members themselves
/// disagree the group is INDETERMINADO rather than settled by majority or by
/// input order.
pub fn resolve_classification(ranked: &[&Record]) -> (Classification, bool) {
    let decisive: Vec<&Record> = ranked
        .iter()
        .copied()
        .filter(|r| r.classification.is_decisive())
        .collect();

    let Some(first) = decisive.first() else {
        return (Classification::Indeterminado, false);
    };
    if decisive.iter().all(|r| r.classification == first.classification) {
        return (first.classification, false);
    }

    let top = decisive.iter().map(|r| r.richness()).max().unwrap_or(0);
    let top_labels: BTreeSet<&'static str> = decisive
        .iter()
        .filter(|r| r.richness() == top)
        .map(|r| r.classification.as_str())
        .collect();

    let resolved = if top_labels.len() == 1 {
        decisive
            .iter()
            .find(|r| r.richness() == top)
            .map(|r| r.classification)
            .unwrap_or(Classification::Indeterminado)
    } else {
        Classification::Indeterminado
    };
    (resolved, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;
    use chrono::{Duration, TimeZone, Utc};

    fn ctx() -> RunContext {
        RunContext::new(Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_merges_same_link_and_unions_methods() {
        let mut a = record("https://g1.globo.com/x", Method::Scraping);
        a.classification = Classification::Fake;
        let mut b = record("https://g1.globo.com/x", Method::Feed);
        b.summary = Some("boato desmentido".to_string());
        b.classification = Classification::Fake;

        let mut ctx = ctx();
        let out = deduplicate(&mut ctx, vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].methods, BTreeSet::from([Method::Feed, Method::Scraping]));
        assert_eq!(out[0].classification, Classification::Fake);
        assert_eq!(out[0].summary.as_deref(), Some("boato desmentido"));
        assert!(ctx.ambiguities.is_empty());
    }

    #[test]
    fn test_groups_by_canonical_link() {
        let out = deduplicate(
            &mut ctx(),
            vec![
                record("https://g1.globo.com/x/", Method::Scraping),
                record("https://g1.globo.com/x?utm=1", Method::Feed),
                record("https://g1.globo.com/x", Method::Feed),
                record("https://g1.globo.com/y#topo", Method::Feed),
            ],
        );

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].link, "https://g1.globo.com/x");
        assert_eq!(out[0].methods, BTreeSet::from([Method::Feed, Method::Scraping]));
        assert_eq!(out[1].link, "https://g1.globo.com/y");
        assert_eq!(deduplicate(&mut ctx(), out.clone()), out);
    }

    #[test]
    fn test_richest_member_supplies_scalars() {
        let mut poor = record("https://g1.globo.com/x", Method::Scraping);
        poor.title = "Título curto".to_string();
        let mut rich = record("https://g1.globo.com/x", Method::Feed);
        rich.title = "Título completo".to_string();
        rich.content = Some("texto".to_string());
        rich.author = Some("g1".to_string());

        let out = deduplicate(&mut ctx(), vec![poor, rich]);
        assert_eq!(out[0].title, "Título completo");
        assert_eq!(out[0].author.as_deref(), Some("g1"));
    }

    #[test]
    fn test_scraping_wins_richness_tie() {
        let mut feed = record("https://g1.globo.com/x", Method::Feed);
        feed.title = "Título do feed".to_string();
        feed.summary = Some("resumo do feed".to_string());
        let mut scraped = record("https://g1.globo.com/x", Method::Scraping);
        scraped.title = "Título da página".to_string();
        scraped.content = Some("conteúdo".to_string());

        let out = deduplicate(&mut ctx(), vec![feed.clone(), scraped.clone()]);
        assert_eq!(out[0].title, "Título da página");
        // gap filled from the feed record
        assert_eq!(out[0].summary.as_deref(), Some("resumo do feed"));

        let reversed = deduplicate(&mut ctx(), vec![scraped, feed]);
        assert_eq!(reversed, out);
    }

    #[test]
    fn test_tags_union_first_occurrence() {
        let mut a = record("https://g1.globo.com/x", Method::Scraping);
        a.tags = vec!["b".to_string(), "a".to_string()];
        let mut b = record("https://g1.globo.com/x", Method::Feed);
        b.tags = vec!["a".to_string(), "c".to_string()];

        let out = deduplicate(&mut ctx(), vec![a, b]);
        assert_eq!(out[0].tags, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_earliest_extracted_at_kept() {
        let mut a = record("https://g1.globo.com/x", Method::Scraping);
        let mut b = record("https://g1.globo.com/x", Method::Feed);
        let earlier = a.extracted_at - Duration::hours(1);
        b.extracted_at = earlier;
        a.content = Some("mais rico".to_string());

        let out = deduplicate(&mut ctx(), vec![a, b]);
        assert_eq!(out[0].extracted_at, earlier);
    }

    #[test]
    fn test_decisive_label_beats_undecided() {
        let mut a = record("https://g1.globo.com/x", Method::Scraping);
        a.content = Some("rico".to_string());
        let mut b = record("https://g1.globo.com/x", Method::Feed);
        b.classification = Classification::Fato;

        let mut ctx = ctx();
        let out = deduplicate(&mut ctx, vec![a, b]);
        assert_eq!(out[0].classification, Classification::Fato);
        assert!(ctx.ambiguities.is_empty());
    }

    #[test]
    fn test_conflict_resolved_by_richest_not_order() {
        let mut fato = record("https://g1.globo.com/x", Method::Feed);
        fato.classification = Classification::Fato;
        let mut fake = record("https://g1.globo.com/x", Method::Feed);
        fake.classification = Classification::Fake;
        fake.summary = Some("resumo".to_string());
        fake.content = Some("texto".to_string());

        for input in [vec![fato.clone(), fake.clone()], vec![fake.clone(), fato.clone()]] {
            let mut ctx = ctx();
            let out = deduplicate(&mut ctx, input);
            assert_eq!(out[0].classification, Classification::Fake);
            assert_eq!(ctx.ambiguities.len(), 1);
            assert_eq!(ctx.ambiguities[0].resolved, Classification::Fake);
            assert_eq!(ctx.ambiguities[0].labels.len(), 2);
        }
    }

    #[test]
    fn test_conflict_tie_is_indeterminado() {
        let mut fato = record("https://g1.globo.com/x", Method::Scraping);
        fato.classification = Classification::Fato;
        let mut fake = record("https://g1.globo.com/x", Method::Feed);
        fake.classification = Classification::Fake;

        let mut ctx = ctx();
        let out = deduplicate(&mut ctx, vec![fato, fake]);
        assert_eq!(out[0].classification, Classification::Indeterminado);
        assert_eq!(ctx.ambiguities[0].resolved, Classification::Indeterminado);
    }

    #[test]
    fn test_idempotent_and_keeps_methods() {
        let mut a = record("https://g1.globo.com/x", Method::Scraping);
        a.tags = vec!["t".to_string(), "t".to_string()];
        let b = record("https://g1.globo.com/x", Method::Feed);
        let c = record("https://g1.globo.com/y", Method::Feed);
        let mut d = record("https://g1.globo.com/z", Method::Scraping);
        d.classification = Classification::Fato;
        let input = vec![a, b, c, d];

        let input_methods: BTreeSet<Method> =
            input.iter().flat_map(|r| r.methods.iter().copied()).collect();

        let once = deduplicate(&mut ctx(), input);
        let twice = deduplicate(&mut ctx(), once.clone());
        assert_eq!(once, twice);

        let output_methods: BTreeSet<Method> =
            once.iter().flat_map(|r| r.methods.iter().copied()).collect();
        assert_eq!(input_methods, output_methods);

        let links: BTreeSet<&str> = once.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(links.len(), once.len());
        assert_eq!(once.len(), 3);
    }

    #[test]
    fn test_empty_input() {
        assert!(deduplicate(&mut ctx(), vec![]).is_empty());
    }
}
