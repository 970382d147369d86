//! Export search results as pretty-printed JSON.

use std::io::Write;

use crate::search::matcher::MatchResult;

use super::RenderOptions;

pub fn write_json(
    results: &[MatchResult],
    options: &RenderOptions,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let items: Vec<serde_json::Value> = results
        .iter()
        .map(|r| {
            serde_json::json!({
                "channel": r.channel,
                "ts": r.timestamp,
                "date": r.timestamp.format(options.zone, &options.date_format),
                "sender": r.sender,
                "text": r.text,
                "record": r.record,
            })
        })
        .collect();

    let output = serde_json::json!({
        "result_count": results.len(),
        "results": items,
    });

    writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
