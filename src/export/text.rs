//! Human-readable output, one message per paragraph.

use std::io::Write;

use crate::search::matcher::MatchResult;

use super::RenderOptions;

/// Write `#channel [time] <sender> text` followed by a blank line.
pub fn write_text(
    results: &[MatchResult],
    options: &RenderOptions,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    for result in results {
        let when = result
            .timestamp
            .format(options.zone, &options.date_format);
        writeln!(
            out,
            "#{} [{}] <{}> {}",
            result.channel, when, result.sender, result.text
        )?;
        writeln!(out)?;
    }
    Ok(())
}
