//! Export search results as CSV.

use std::io::Write;

use crate::search::matcher::MatchResult;

use super::RenderOptions;

/// Columns: Channel, Timestamp, Date, Sender, Text
pub fn write_csv(
    results: &[MatchResult],
    options: &RenderOptions,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    writeln!(out, "Channel,Timestamp,Date,Sender,Text")?;

    for result in results {
        let date = result
            .timestamp
            .format(options.zone, &options.date_format);
        writeln!(
            out,
            "{},{},{},{},{}",
            csv_escape(&result.channel),
            csv_escape(result.timestamp.as_str()),
            csv_escape(&date),
            csv_escape(&result.sender),
            csv_escape(&result.text),
        )?;
    }

    Ok(())
}

/// Escape a value for CSV (RFC 4180).
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
fn csv_escape(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
