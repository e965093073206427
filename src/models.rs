//! Data models for fact-check records and the assembled dataset.
//!
//! This module defines the core data structures used throughout the application:
//! - [`RawRecord`]: Partial data exactly as a producer found it
//! - [`Record`]: Canonical, classified row of the dataset
//! - [`Dataset`]: Ordered table handed to the output writers
//! - [`Method`] and [`Classification`]: the two closed vocabularies of a row
//!
//! Serialized field names are the canonical column names, so the JSON and CSV
//! writers never rename anything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The extraction technique that produced a record.
///
/// Variants are declared in alphabetical order so that a `BTreeSet<Method>`
/// iterates (and serializes) as a sorted list of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Syndication feed or JSON API.
    Feed,
    /// Listing-page scraping.
    Scraping,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Feed => "feed",
            Method::Scraping => "scraping",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome label of a fact-check.
///
/// The label is always derived from text signals; it is a heuristic and
/// never an authoritative verdict on the story itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    /// Confirmed true.
    Fato,
    /// Confirmed false.
    Fake,
    /// No confident signal.
    Indeterminado,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Fato => "FATO",
            Classification::Fake => "FAKE",
            Classification::Indeterminado => "INDETERMINADO",
        }
    }

    /// `true` for FATO and FAKE.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, Classification::Indeterminado)
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unprocessed data yielded by a producer.
///
/// Producers fill whatever they managed to find; nothing is guaranteed
/// except a best-effort title or link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub title: Option<String>,
    pub link: Option<String>,
    pub publication_date: Option<String>,
    pub summary: Option<String>,
    pub image_url: Option<String>,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
}

/// A canonical, fully shaped and classified row of the dataset.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
    /// Headline; empty string when unrecoverable.
    pub title: String,
    /// Canonical link, the identity key of the story.
    pub link: String,
    /// Publication date exactly as the source printed it.
    pub publication_date: Option<String>,
    pub summary: Option<String>,
    pub classification: Classification,
    pub image_url: Option<String>,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub author: Option<String>,
    /// When this run first saw the story, not when the story was published.
    pub extracted_at: DateTime<Utc>,
    /// Producers that found the story. Never empty.
    pub methods: BTreeSet<Method>,
}

impl Record {
    /// Number of non-absent content fields.
    ///
    /// `link`, `classification`, `extracted_at` and `methods` are always
    /// present and therefore not counted.
    pub fn richness(&self) -> usize {
        [
            !self.title.is_empty(),
            self.publication_date.is_some(),
            self.summary.is_some(),
            self.image_url.is_some(),
            self.content.is_some(),
            !self.tags.is_empty(),
            self.author.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }
}

/// A deduplicated group whose members disagreed on FATO vs FAKE.
///
/// Kept for auditing; the dataset row carries only the resolved label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmbiguousClassification {
    pub link: String,
    /// Label of every group member, in input order.
    pub labels: Vec<Classification>,
    pub resolved: Classification,
}

/// The final ordered table.
///
/// One row per story, columns fixed to [`Dataset::COLUMNS`]. The dataset is
/// immutable once assembled; writers only borrow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Dataset {
    rows: Vec<Record>,
}

impl Dataset {
    /// Column names, in output order.
    pub const COLUMNS: [&'static str; 11] = [
        "title",
        "link",
        "publication_date",
        "summary",
        "classification",
        "image_url",
        "content",
        "tags",
        "author",
        "extracted_at",
        "methods",
    ];

    pub(crate) fn from_ordered(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Label and provenance counts for the run summary.
    pub fn stats(&self) -> DatasetStats {
        let mut stats = DatasetStats {
            total: self.rows.len(),
            ..DatasetStats::default()
        };
        for row in &self.rows {
            match row.classification {
                Classification::Fato => stats.fato += 1,
                Classification::Fake => stats.fake += 1,
                Classification::Indeterminado => stats.indeterminado += 1,
            }
            for method in &row.methods {
                *stats.by_method.entry(*method).or_insert(0) += 1;
            }
        }
        stats
    }
}

/// Summary counts of a [`Dataset`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub total: usize,
    pub fato: usize,
    pub fake: usize,
    pub indeterminado: usize,
    /// Rows found by each method; a row found by both counts for both.
    pub by_method: BTreeMap<Method, usize>,
}

impl DatasetStats {
    /// Share of `count` in the total, as a percentage.
    pub fn percent(&self, count: usize) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total as f64
        }
    }
}
