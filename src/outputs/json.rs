//! JSON output of the dataset and of the classification audit.
//!
//! The dataset is written as a JSON array of objects keyed by the canonical
//! column names, indented with four spaces, UTF-8 without ASCII escaping.
//!
//! # Audit file
//!
//! Groups whose members disagreed on FATO vs FAKE are resolved in the dataset
//! itself; [`write_ambiguities`] keeps a record of each one so the resolved
//! labels can be reviewed.

use super::{DATASET_STEM, output_path};
use crate::models::{AmbiguousClassification, Dataset};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{info, instrument, warn};

/// File stem of the ambiguity audit.
pub const AUDIT_STEM: &str = "fato_ou_fake_ambiguas";

/// Serialize with a four-space indent.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(buf)
}

/// Write the dataset to `{dir}/fato_ou_fake_combinado_{stamp}.json`.
#[instrument(level = "info", skip_all, fields(%dir, rows = dataset.len()))]
pub async fn write_dataset(
    dataset: &Dataset,
    dir: &str,
    stamp: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = to_pretty_json(dataset)?;
    let path = output_path(dir, DATASET_STEM, stamp, "json");

    info!(path = %path.display(), "Writing JSON");
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON dataset");
    Ok(path)
}

/// Write the ambiguity audit to `{dir}/fato_ou_fake_ambiguas_{stamp}.json`.
///
/// Returns `None` without touching the disk when there is nothing to audit.
#[instrument(level = "info", skip_all, fields(%dir, count = ambiguities.len()))]
pub async fn write_ambiguities(
    ambiguities: &[AmbiguousClassification],
    dir: &str,
    stamp: &str,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    if ambiguities.is_empty() {
        return Ok(None);
    }
    let json = to_pretty_json(ambiguities)?;
    let path = output_path(dir, AUDIT_STEM, stamp, "json");

    fs::write(&path, json).await?;
    warn!(path = %path.display(), count = ambiguities.len(), "Wrote ambiguous-classification audit");
    Ok(Some(path))
}
