//! Final ordering of the dataset.

use crate::models::{Dataset, Record};

/// Order records into the final [`Dataset`].
///
/// Rows are sorted by `extracted_at`, then by `link`. Links are unique after
/// deduplication, so the order is total and independent of how producers
/// interleaved their output.
pub fn assemble(mut records: Vec<Record>) -> Dataset {
    records.sort_by(|a, b| {
        a.extracted_at
            .cmp(&b.extracted_at)
            .then_with(|| a.link.cmp(&b.link))
    });
    Dataset::from_ordered(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Method;
    use crate::models::tests::record;
    use chrono::Duration;

    #[test]
    fn test_orders_by_extracted_at_then_link() {
        let mut late = record("https://g1.globo.com/a", Method::Feed);
        late.extracted_at += Duration::minutes(5);
        let early_b = record("https://g1.globo.com/b", Method::Scraping);
        let early_a = record("https://g1.globo.com/c", Method::Feed);
        let mut early_c = early_a.clone();
        early_c.link = "https://g1.globo.com/0".to_string();

        let dataset = assemble(vec![late.clone(), early_b.clone(), early_a.clone(), early_c.clone()]);
        let links: Vec<&str> = dataset.rows().iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://g1.globo.com/0",
                "https://g1.globo.com/b",
                "https://g1.globo.com/c",
                "https://g1.globo.com/a",
            ]
        );
    }

    #[test]
    fn test_order_independent_of_input_order() {
        let mut first = record("https://g1.globo.com/z", Method::Feed);
        first.extracted_at -= Duration::seconds(1);
        let second = record("https://g1.globo.com/a", Method::Scraping);

        let forward = assemble(vec![first.clone(), second.clone()]);
        let backward = assemble(vec![second, first]);
        assert_eq!(forward, backward);
        assert_eq!(forward.rows()[0].link, "https://g1.globo.com/z");
    }

    #[test]
    fn test_empty_input_yields_empty_dataset() {
        let dataset = assemble(vec![]);
        assert!(dataset.is_empty());
        assert_eq!(dataset.len(), 0);
    }
}
