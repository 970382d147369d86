//! Per-message matching against a parsed [`Query`].
//!
//! Facets are checked cheapest first and evaluation stops at the first
//! failing one: thread, date, author, then text terms.

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::Datelike;
use serde::Serialize;

use crate::error::{Result, SearchError};
use crate::model::message::MessageRecord;
use crate::model::timestamp::{Timestamp, Zone};
use crate::model::user::UserTable;

use super::query::{Query, THREAD_FLAG};

/// Prefix of the synthesized name for a bot message without `username`.
pub const BOT_MARKER: &str = "bot:";

/// Prefix of the synthesized name for a user missing from the user table.
pub const UNRESOLVED_MARKER: &str = "unknown:";

/// A message that satisfied every facet of the query.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult {
    pub channel: String,
    pub timestamp: Timestamp,
    /// Resolved display name of the sender.
    pub sender: String,
    /// Message text with user identifiers replaced by display names.
    pub text: String,
    pub record: MessageRecord,
}

/// Who sent a message: the raw identifier and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender<'a> {
    pub id: &'a str,
    pub name: Cow<'a, str>,
}

/// Evaluates messages from one archive against a query.
pub struct Matcher<'a> {
    query: &'a Query,
    users: &'a UserTable,
    zone: Zone,
}

impl<'a> Matcher<'a> {
    pub fn new(query: &'a Query, users: &'a UserTable, zone: Zone) -> Self {
        Self { query, users, zone }
    }

    /// Match a single record. `Ok(None)` means the record did not match.
    ///
    /// Fails only when the record itself is malformed.
    pub fn match_message(
        &self,
        channel: &str,
        record: &MessageRecord,
    ) -> Result<Option<MatchResult>> {
        let sender = self.resolve_sender(channel, record)?;
        let timestamp = parse_timestamp(channel, record)?;

        if !self.matches_thread(record) {
            return Ok(None);
        }

        if self.query.has_date_filter() && !self.matches_date(channel, &timestamp)? {
            return Ok(None);
        }

        if !self.matches_author(&sender) {
            return Ok(None);
        }

        let text = self.users.dereference(&record.text);
        if !self.matches_terms(&text) {
            return Ok(None);
        }

        Ok(Some(MatchResult {
            channel: channel.to_string(),
            timestamp,
            sender: sender.name.into_owned(),
            text,
            record: record.clone(),
        }))
    }

    /// Match every record of one channel file, in file order.
    pub fn match_all(&self, channel: &str, records: &[MessageRecord]) -> Result<Vec<MatchResult>> {
        let mut matches = Vec::new();
        for record in records {
            if let Some(m) = self.match_message(channel, record)? {
                matches.push(m);
            }
        }
        Ok(matches)
    }

    /// Work out the sender's identifier and display name.
    pub fn resolve_sender<'r>(
        &self,
        channel: &str,
        record: &'r MessageRecord,
    ) -> Result<Sender<'r>>
    where
        'a: 'r,
    {
        if let Some(user) = record.user.as_deref() {
            let name = match self.users.get(user) {
                Some(name) => Cow::Borrowed(name),
                None => Cow::Owned(format!("{UNRESOLVED_MARKER}{user}")),
            };
            return Ok(Sender { id: user, name });
        }

        if let Some(bot) = record.bot_id.as_deref() {
            let name = match record.username.as_deref() {
                Some(username) => Cow::Borrowed(username),
                None => Cow::Owned(format!("{BOT_MARKER}{bot}")),
            };
            return Ok(Sender { id: bot, name });
        }

        Err(SearchError::record(
            channel,
            format!(
                "message ts={} has neither 'user' nor 'bot_id'",
                record.ts.as_deref().unwrap_or("?")
            ),
        ))
    }

    fn matches_thread(&self, record: &MessageRecord) -> bool {
        // `-is:thread` wins when both are given.
        if self.query.is_not_flags.contains(THREAD_FLAG) {
            return !record.is_threaded();
        }
        if self.query.is_flags.contains(THREAD_FLAG) {
            return record.is_threaded();
        }
        true
    }

    fn matches_date(&self, channel: &str, timestamp: &Timestamp) -> Result<bool> {
        let date = timestamp.date(self.zone).ok_or_else(|| {
            SearchError::record(channel, format!("timestamp {timestamp} is out of range"))
        })?;

        if self.query.on_date.is_some_and(|on| date != on) {
            return Ok(false);
        }
        if self.query.during_month.is_some_and(|m| date.month() != m) {
            return Ok(false);
        }
        if self.query.before_date.is_some_and(|before| date > before) {
            return Ok(false);
        }
        if self.query.after_date.is_some_and(|after| date < after) {
            return Ok(false);
        }
        Ok(true)
    }

    fn matches_author(&self, sender: &Sender<'_>) -> bool {
        let named = |set: &BTreeSet<String>| {
            set.contains(sender.id) || set.contains(&*sender.name)
        };

        let included = self.query.authors_include.is_empty() || named(&self.query.authors_include);
        let excluded = !self.query.authors_exclude.is_empty() && named(&self.query.authors_exclude);
        included && !excluded
    }

    fn matches_terms(&self, text: &str) -> bool {
        if self
            .query
            .terms_exclude
            .iter()
            .any(|term| text.contains(term.as_str()))
        {
            return false;
        }

        let total = self.query.terms_include.len();
        if total == 0 {
            return true;
        }

        // Integer division: every include term must be present.
        let matched = self
            .query
            .terms_include
            .iter()
            .filter(|term| text.contains(term.as_str()))
            .count();
        matched / total >= 1
    }
}

fn parse_timestamp(channel: &str, record: &MessageRecord) -> Result<Timestamp> {
    let raw = record
        .ts
        .as_deref()
        .ok_or_else(|| SearchError::record(channel, "message has no 'ts'"))?;
    Timestamp::parse(raw)
        .ok_or_else(|| SearchError::record(channel, format!("unparseable ts '{raw}'")))
}

/// Sort results by channel, then chronologically.
pub fn sort_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        a.channel
            .cmp(&b.channel)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::parse_query;

    fn users() -> UserTable {
        let mut users = UserTable::new();
        users.insert("U1", "alice");
        users.insert("U2", "bob");
        users
    }

    fn msg(user: &str, text: &str, ts: &str) -> MessageRecord {
        MessageRecord {
            user: Some(user.to_string()),
            text: text.to_string(),
            ts: Some(ts.to_string()),
            ..Default::default()
        }
    }

    // 2024-01-05 12:00:00 UTC
    const JAN_5: &str = "1704456000.000100";
    // 2024-03-10 08:00:00 UTC
    const MAR_10: &str = "1710057600.000000";

    fn run(query: &str, record: &MessageRecord) -> Option<MatchResult> {
        let q = parse_query(query).unwrap();
        let users = users();
        Matcher::new(&q, &users, Zone::Utc)
            .match_message("general", record)
            .unwrap()
    }

    #[test]
    fn test_empty_query_matches() {
        let m = run("", &msg("U1", "hello", JAN_5)).unwrap();
        assert_eq!(m.channel, "general");
        assert_eq!(m.sender, "alice");
        assert_eq!(m.text, "hello");
        assert_eq!(m.timestamp.as_str(), JAN_5);
    }

    #[test]
    fn test_all_terms_required() {
        let record = msg("U1", "deploy finished ok", JAN_5);
        assert!(run("deploy ok", &record).is_some());
        assert!(run("deploy failed", &record).is_none());
        assert!(run("\"deploy finished\"", &record).is_some());
        assert!(run("\"finished deploy\"", &record).is_none());
    }

    #[test]
    fn test_terms_are_case_sensitive() {
        let record = msg("U1", "Deploy", JAN_5);
        assert!(run("deploy", &record).is_none());
        assert!(run("Deploy", &record).is_some());
    }

    #[test]
    fn test_exclusion_wins() {
        let record = msg("U1", "deploy finished flaky", JAN_5);
        assert!(run("deploy finished -flaky", &record).is_none());
        assert!(run("deploy -flaky deploy", &record).is_none());
        assert!(run("deploy -broken", &record).is_some());
    }

    #[test]
    fn test_terms_match_dereferenced_text() {
        let record = msg("U1", "ping <@U2>", JAN_5);
        let m = run("bob", &record).unwrap();
        assert_eq!(m.text, "ping <@bob>");
        assert!(run("U2", &record).is_none());
    }

    #[test]
    fn test_author_by_id_or_name() {
        let record = msg("U1", "hi", JAN_5);
        assert!(run("from:alice", &record).is_some());
        assert!(run("from:U1", &record).is_some());
        assert!(run("from:@alice", &record).is_some());
        assert!(run("from:bob", &record).is_none());
        assert!(run("-from:alice", &record).is_none());
        assert!(run("-from:U1", &record).is_none());
        assert!(run("-from:bob", &record).is_some());
        assert!(run("from:alice -from:U1", &record).is_none());
    }

    #[test]
    fn test_thread_facet() {
        let mut threaded = msg("U1", "reply", JAN_5);
        threaded.thread_ts = Some("1704456000.000000".to_string());
        let plain = msg("U1", "top level", JAN_5);

        assert!(run("is:thread", &threaded).is_some());
        assert!(run("-is:thread", &threaded).is_none());
        assert!(run("is:thread", &plain).is_none());
        assert!(run("-is:thread", &plain).is_some());
        // `-is:thread` wins when both are given.
        assert!(run("is:thread -is:thread", &plain).is_some());
        assert!(run("is:thread -is:thread", &threaded).is_none());
    }

    #[test]
    fn test_unknown_flag_ignored() {
        let record = msg("U1", "hi", JAN_5);
        assert!(run("is:starred", &record).is_some());
    }

    #[test]
    fn test_date_bounds_inclusive() {
        let record = msg("U1", "hi", JAN_5);
        assert!(run("before:2024-01-05", &record).is_some());
        assert!(run("after:2024-01-05", &record).is_some());
        assert!(run("on:2024-01-05", &record).is_some());
        assert!(run("before:2024-01-04", &record).is_none());
        assert!(run("after:2024-01-06", &record).is_none());
        assert!(run("on:2024-01-06", &record).is_none());
        assert!(run("after:2024-01-01 before:2024-01-31", &record).is_some());
    }

    #[test]
    fn test_during_month() {
        assert!(run("during:jan", &msg("U1", "hi", JAN_5)).is_some());
        assert!(run("during:jan", &msg("U1", "hi", MAR_10)).is_none());
        assert!(run("during:march", &msg("U1", "hi", MAR_10)).is_some());
    }

    #[test]
    fn test_unresolved_user_marker() {
        let m = run("", &msg("U999", "who am i", JAN_5)).unwrap();
        assert_eq!(m.sender, format!("{UNRESOLVED_MARKER}U999"));
        assert!(m.sender.contains(UNRESOLVED_MARKER));
    }

    #[test]
    fn test_bot_sender() {
        let mut named = MessageRecord {
            bot_id: Some("B1".to_string()),
            username: Some("deploybot".to_string()),
            text: "shipped".to_string(),
            ts: Some(JAN_5.to_string()),
            ..Default::default()
        };
        assert_eq!(run("", &named).unwrap().sender, "deploybot");
        assert!(run("from:B1", &named).is_some());
        assert!(run("from:deploybot", &named).is_some());

        named.username = None;
        assert_eq!(run("", &named).unwrap().sender, "bot:B1");
    }

    #[test]
    fn test_missing_sender_is_fatal() {
        let q = parse_query("").unwrap();
        let users = users();
        let record = MessageRecord {
            text: "orphan".to_string(),
            ts: Some(JAN_5.to_string()),
            ..Default::default()
        };
        let err = Matcher::new(&q, &users, Zone::Utc)
            .match_message("general", &record)
            .unwrap_err();
        assert!(matches!(err, SearchError::MalformedRecord { .. }));
    }

    #[test]
    fn test_bad_timestamp_is_fatal() {
        let q = parse_query("").unwrap();
        let users = users();
        let record = msg("U1", "hi", "not-a-number");
        assert!(Matcher::new(&q, &users, Zone::Utc)
            .match_message("general", &record)
            .is_err());
    }

    #[test]
    fn test_match_all_and_sort() {
        let q = parse_query("").unwrap();
        let users = users();
        let matcher = Matcher::new(&q, &users, Zone::Utc);

        let mut results = matcher
            .match_all(
                "random",
                &[msg("U1", "b", "1704456000.2"), msg("U1", "a", "1704456000.1")],
            )
            .unwrap();
        results.extend(
            matcher
                .match_all("general", &[msg("U2", "c", "1704456100")])
                .unwrap(),
        );
        sort_results(&mut results);

        let order: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.channel.as_str(), r.text.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("general", "c"), ("random", "a"), ("random", "b")]
        );
    }
}
