//! Result rendering: plain text, CSV, and JSON.

pub mod csv;
pub mod json;
pub mod text;

use std::io::Write;

use crate::model::timestamp::Zone;
use crate::search::matcher::MatchResult;

/// Output format for search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!(
                "Unknown output format '{other}'. Supported: text, csv, json"
            )),
        }
    }
}

/// How timestamps are shown.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub zone: Zone,
    /// `strftime` pattern.
    pub date_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            zone: Zone::Local,
            date_format: "%Y-%m-%d %H:%M:%S%.6f".to_string(),
        }
    }
}

/// Write results in the requested format.
pub fn write_results(
    results: &[MatchResult],
    format: OutputFormat,
    options: &RenderOptions,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text::write_text(results, options, out),
        OutputFormat::Csv => csv::write_csv(results, options, out),
        OutputFormat::Json => json::write_json(results, options, out),
    }
}
