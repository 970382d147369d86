//! Search engine: query parsing and per-message matching over archives.

pub mod matcher;
pub mod query;

use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::archive::{self, Archive, ChannelFile};
use crate::config::ArchiveConfig;
use crate::error::SearchError;
use crate::model::message::MessageRecord;
use crate::model::timestamp::Zone;
use crate::model::user::UserTable;

use self::matcher::{sort_results, MatchResult, Matcher};
use self::query::{parse_query, Query};

/// Channel name given to a log read from standard input by default.
pub const STDIN_CHANNEL: &str = "stdin";

/// Settings shared by every archive in one search run.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Zone used to derive calendar dates for date facets.
    pub zone: Zone,
    /// Extra users manifest merged into every archive's user table.
    pub users_file: Option<PathBuf>,
    /// Archive file naming.
    pub layout: ArchiveConfig,
}

/// High-level search: parse the query, enumerate channel files in every
/// archive path, match each record, and return results sorted by
/// `(channel, timestamp)`.
///
/// The `progress` callback receives `(files_done, files_total)`.
pub fn execute(
    paths: &[PathBuf],
    query_str: &str,
    options: &SearchOptions,
    progress: Option<&dyn Fn(usize, usize)>,
) -> crate::error::Result<(Query, Vec<MatchResult>)> {
    let query = parse_query(query_str)?;
    debug!(?query, "Parsed query");

    let extra_users = match &options.users_file {
        Some(path) => archive::load_users_file(path)?,
        None => Vec::new(),
    };

    // Enumerate everything first so progress has a total.
    let mut sources: Vec<(UserTable, Vec<ChannelFile>)> = Vec::with_capacity(paths.len());
    for path in paths {
        let archive = Archive::open(path, &options.layout)?;
        let mut users = archive.load_users()?;
        users.extend(extra_users.iter().cloned());
        let files = archive.channel_files(|channel| query.allows_channel(channel))?;
        info!(
            path = %path.display(),
            users = users.len(),
            files = files.len(),
            "Opened archive"
        );
        sources.push((users, files));
    }

    let total: usize = sources.iter().map(|(_, files)| files.len()).sum();
    let report = progress.unwrap_or(&|_, _| {});
    let mut done = 0usize;
    let mut results = Vec::new();

    for (users, files) in &sources {
        let matcher = Matcher::new(&query, users, options.zone);
        for file in files {
            report(done, total);
            let matches = search_file(&matcher, file)?;
            debug!(
                channel = %file.channel,
                file = %file.path.display(),
                matches = matches.len(),
                "Searched file"
            );
            results.extend(matches);
            done += 1;
        }
    }
    report(total, total);

    sort_results(&mut results);
    Ok((query, results))
}

/// Search a single channel-day log read from `reader`, e.g. standard input.
///
/// `channel` goes through the same `in:`/`-in:` filter as archive channels.
/// The user table holds the built-in entry plus `options.users_file`.
pub fn search_reader(
    reader: impl Read,
    channel: &str,
    query_str: &str,
    options: &SearchOptions,
) -> crate::error::Result<(Query, Vec<MatchResult>)> {
    let query = parse_query(query_str)?;
    debug!(?query, "Parsed query");

    if !query.allows_channel(channel) {
        debug!(channel, "Input channel excluded by query");
        return Ok((query, Vec::new()));
    }

    let mut users = UserTable::new();
    if let Some(path) = &options.users_file {
        users.extend(archive::load_users_file(path)?);
    }

    let records: Vec<MessageRecord> =
        serde_json::from_reader(reader).map_err(|e| SearchError::json("<input>", e))?;
    info!(channel, records = records.len(), "Read log from input");

    let matcher = Matcher::new(&query, &users, options.zone);
    let mut results = matcher.match_all(channel, &records)?;
    sort_results(&mut results);
    Ok((query, results))
}

/// Decode one channel-day file and match all of its records.
pub fn search_file(
    matcher: &Matcher<'_>,
    file: &ChannelFile,
) -> crate::error::Result<Vec<MatchResult>> {
    let records = file.read_records()?;
    matcher.match_all(&file.channel, &records)
}

/// Convenience for a single archive with default options.
pub fn search_archive(
    path: &Path,
    query_str: &str,
    zone: Zone,
) -> crate::error::Result<Vec<MatchResult>> {
    let options = SearchOptions {
        zone,
        ..Default::default()
    };
    let (_, results) = execute(&[path.to_path_buf()], query_str, &options, None)?;
    Ok(results)
}
