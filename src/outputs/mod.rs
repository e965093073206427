//! Output generation for the assembled dataset.
//!
//! This module contains submodules responsible for persisting a
//! [`Dataset`](crate::models::Dataset) in the formats the CLI offers:
//!
//! # Submodules
//!
//! - [`csv`]: Row-oriented CSV, one column per canonical field
//! - [`json`]: JSON array of objects, plus the ambiguous-classification audit
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── fato_ou_fake_combinado_20250506_143000.csv
//! ├── fato_ou_fake_combinado_20250506_143000.json
//! └── fato_ou_fake_ambiguas_20250506_143000.json   # only when conflicts occurred
//! ```
//!
//! All files of one run share the same stamp. Writers never receive an
//! empty dataset; `main` skips persistence in that case.

pub mod csv;
pub mod json;

use std::path::{Path, PathBuf};

/// File stem shared by the dataset files.
pub const DATASET_STEM: &str = "fato_ou_fake_combinado";

/// `{dir}/{stem}_{stamp}.{ext}`
pub fn output_path(dir: &str, stem: &str, stamp: &str, ext: &str) -> PathBuf {
    Path::new(dir).join(format!("{stem}_{stamp}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        assert_eq!(
            output_path("datasets", DATASET_STEM, "20250506_143000", "csv"),
            PathBuf::from("datasets/fato_ou_fake_combinado_20250506_143000.csv")
        );
    }
}
