//! CSV output of the dataset.
//!
//! One header row with the canonical column names, then one row per record.
//! List-valued columns (`tags`, `methods`) hold a JSON array so they survive
//! a round trip through spreadsheet tools; absent values are empty cells.

use super::{DATASET_STEM, output_path};
use crate::models::{Dataset, Record};
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    title: &'a str,
    link: &'a str,
    publication_date: Option<&'a str>,
    summary: Option<&'a str>,
    classification: &'static str,
    image_url: Option<&'a str>,
    content: Option<&'a str>,
    tags: String,
    author: Option<&'a str>,
    extracted_at: String,
    methods: String,
}

impl<'a> CsvRow<'a> {
    fn from_record(record: &'a Record) -> Result<Self, serde_json::Error> {
        Ok(Self {
            title: &record.title,
            link: &record.link,
            publication_date: record.publication_date.as_deref(),
            summary: record.summary.as_deref(),
            classification: record.classification.as_str(),
            image_url: record.image_url.as_deref(),
            content: record.content.as_deref(),
            tags: serde_json::to_string(&record.tags)?,
            author: record.author.as_deref(),
            extracted_at: record.extracted_at.to_rfc3339(),
            methods: serde_json::to_string(&record.methods)?,
        })
    }
}

/// Render the dataset as CSV bytes.
pub fn to_csv(dataset: &Dataset) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    if dataset.is_empty() {
        writer.write_record(Dataset::COLUMNS)?;
    }
    for record in dataset.rows() {
        writer.serialize(CsvRow::from_record(record)?)?;
    }
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

/// Write the dataset to `{dir}/fato_ou_fake_combinado_{stamp}.csv`.
#[instrument(level = "info", skip_all, fields(%dir, rows = dataset.len()))]
pub async fn write_dataset(
    dataset: &Dataset,
    dir: &str,
    stamp: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let bytes = to_csv(dataset)?;
    let path = output_path(dir, DATASET_STEM, stamp, "csv");

    info!(path = %path.display(), "Writing CSV");
    fs::write(&path, bytes).await?;
    info!(path = %path.display(), "Wrote CSV dataset");
    Ok(path)
}
