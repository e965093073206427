//! Command-line interface definitions for the Fato ou Fake extractor.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! The CLI only selects what runs and where results go; source URLs and
//! network behaviour live in the optional YAML config (see [`crate::config`]).

use crate::models::Method;
use clap::{Parser, ValueEnum};

/// Which producers to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodChoice {
    /// Listing-page scraping only.
    Scraping,
    /// JSON API / RSS feed only.
    #[value(alias = "api")]
    Feed,
    /// Both producers, merged.
    #[value(alias = "todos")]
    Both,
}

impl MethodChoice {
    pub fn includes(&self, method: Method) -> bool {
        match self {
            MethodChoice::Both => true,
            MethodChoice::Scraping => method == Method::Scraping,
            MethodChoice::Feed => method == Method::Feed,
        }
    }
}

/// Output file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    #[value(alias = "ambos")]
    Both,
}

impl OutputFormat {
    pub fn wants_csv(&self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn wants_json(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

/// Command-line arguments for the Fato ou Fake extractor.
///
/// # Examples
///
/// ```sh
/// # Both methods, 5 listing pages, CSV into ./datasets
/// fato_ou_fake
///
/// # Feed only, JSON and CSV
/// fato_ou_fake --method feed --format both
///
/// # Scrape 10 pages with a custom config
/// fato_ou_fake -m scraping -p 10 -c fato_ou_fake.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Extraction method(s) to run
    #[arg(short, long, value_enum, default_value_t = MethodChoice::Both)]
    pub method: MethodChoice,

    /// Number of listing pages to scrape
    #[arg(short, long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Directory receiving the dataset files
    #[arg(short, long, env = "FATO_OU_FAKE_OUTPUT_DIR", default_value = "datasets")]
    pub output_dir: String,

    /// Optional path to a YAML config file
    #[arg(short, long, env = "FATO_OU_FAKE_CONFIG")]
    pub config: Option<String>,

    /// Override the User-Agent sent with every request
    #[arg(long, env = "FATO_OU_FAKE_USER_AGENT")]
    pub user_agent: Option<String>,
}
