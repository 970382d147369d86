//! Search query parser.
//!
//! Parses user-typed query strings into a structured [`Query`].
//!
//! # Supported syntax
//!
//! **Free text**: `deploy` — substring match on the message text.
//! `"exact phrase"` — one term, spaces included.
//!
//! **Facets**:
//! - `in:#general` / `in:general` — channel
//! - `from:@alice` / `from:U024BE7LH` — sender name or identifier
//! - `is:thread` — threaded messages only
//!
//! **Date filters** (inclusive):
//! - `on:2024-01-05`
//! - `before:2024-06-01` / `until:2024-06-01`
//! - `after:2024-01-01` / `since:2024-01-01`
//! - `during:march` / `during:mar`
//!
//! **Operators**:
//! - `term1 term2` — implicit AND
//! - `-term`, `-from:bob`, `-in:random`, `-is:thread` — exclude

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::error::{Result, SearchError};

/// The only `is:` flag the matcher understands.
pub const THREAD_FLAG: &str = "thread";

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// A fully parsed search query. An empty query matches every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    /// Channels to search (leading `#` stripped). Empty means all.
    pub channels_include: BTreeSet<String>,
    pub channels_exclude: BTreeSet<String>,
    /// Sender identifiers or display names (leading `@` stripped).
    pub authors_include: BTreeSet<String>,
    pub authors_exclude: BTreeSet<String>,
    /// Case-sensitive substrings of the message text.
    pub terms_include: BTreeSet<String>,
    pub terms_exclude: BTreeSet<String>,
    /// `is:` flags. Unknown flags are kept but never satisfied.
    pub is_flags: BTreeSet<String>,
    pub is_not_flags: BTreeSet<String>,
    pub on_date: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub before_date: Option<NaiveDate>,
    /// Inclusive lower bound.
    pub after_date: Option<NaiveDate>,
    /// Month number, 1–12.
    pub during_month: Option<u32>,
}

impl Query {
    /// Whether any of the date facets is set.
    pub fn has_date_filter(&self) -> bool {
        self.on_date.is_some()
            || self.before_date.is_some()
            || self.after_date.is_some()
            || self.during_month.is_some()
    }

    /// Whether messages from `channel` should be searched at all.
    ///
    /// The matcher never checks channels; archive enumeration calls this
    /// before any record is decoded.
    pub fn allows_channel(&self, channel: &str) -> bool {
        (self.channels_include.is_empty() || self.channels_include.contains(channel))
            && !self.channels_exclude.contains(channel)
    }

    /// True when the query places no constraint at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Operators recognised at the start of an atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Channel,
    Author,
    Flag,
    During,
    On,
    Before,
    After,
}

/// Checked top to bottom; the first matching prefix wins.
const OPERATORS: &[(&str, Operator)] = &[
    ("in:", Operator::Channel),
    ("from:", Operator::Author),
    ("is:", Operator::Flag),
    ("during:", Operator::During),
    ("on:", Operator::On),
    ("before:", Operator::Before),
    ("until:", Operator::Before),
    ("after:", Operator::After),
    ("since:", Operator::After),
];

/// Parse a query string into a structured [`Query`].
///
/// Unrecognised prefixes fall through to free text. Fails only on bad
/// date or month arguments, and on negated date operators, which have no
/// exclusion form.
pub fn parse_query(input: &str) -> Result<Query> {
    let mut query = Query::default();
    let mut rest = input.trim_start();

    while !rest.is_empty() {
        let (negated, body) = match rest.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, rest),
        };

        // A lone `-` negates nothing.
        if negated && body.chars().next().is_none_or(char::is_whitespace) {
            rest = body.trim_start();
            continue;
        }

        let remainder = match OPERATORS.iter().find(|(prefix, _)| body.starts_with(prefix)) {
            Some(&(prefix, op)) => {
                let (value, remainder) = take_value(&body[prefix.len()..]);
                apply_operator(&mut query, op, &value, negated, input)?;
                remainder
            }
            None => {
                let (value, remainder) = take_value(body);
                insert_facet(
                    &mut query.terms_include,
                    &mut query.terms_exclude,
                    value,
                    negated,
                );
                remainder
            }
        };

        rest = remainder.trim_start();
    }

    Ok(query)
}

fn apply_operator(
    query: &mut Query,
    op: Operator,
    value: &str,
    negated: bool,
    input: &str,
) -> Result<()> {
    match op {
        Operator::Channel => {
            let name = value.strip_prefix('#').unwrap_or(value);
            insert_facet(
                &mut query.channels_include,
                &mut query.channels_exclude,
                name.to_string(),
                negated,
            );
        }
        Operator::Author => {
            let name = value.strip_prefix('@').unwrap_or(value);
            insert_facet(
                &mut query.authors_include,
                &mut query.authors_exclude,
                name.to_string(),
                negated,
            );
        }
        Operator::Flag => {
            insert_facet(
                &mut query.is_flags,
                &mut query.is_not_flags,
                value.to_string(),
                negated,
            );
        }
        Operator::During => {
            reject_negation(negated, "during:", input)?;
            let month = month_from_name(value).ok_or_else(|| {
                SearchError::query(input, format!("unknown month name '{value}'"))
            })?;
            query.during_month = Some(month);
        }
        Operator::On => {
            reject_negation(negated, "on:", input)?;
            query.on_date = Some(parse_date(value, input)?);
        }
        Operator::Before => {
            reject_negation(negated, "before:", input)?;
            query.before_date = Some(parse_date(value, input)?);
        }
        Operator::After => {
            reject_negation(negated, "after:", input)?;
            query.after_date = Some(parse_date(value, input)?);
        }
    }
    Ok(())
}

/// Add a value to the include or exclude set. Empty values are dropped.
fn insert_facet(
    include: &mut BTreeSet<String>,
    exclude: &mut BTreeSet<String>,
    value: String,
    negated: bool,
) {
    if value.is_empty() {
        return;
    }
    if negated {
        exclude.insert(value);
    } else {
        include.insert(value);
    }
}

fn reject_negation(negated: bool, operator: &str, input: &str) -> Result<()> {
    if negated {
        return Err(SearchError::query(
            input,
            format!("'{operator}' cannot be negated"),
        ));
    }
    Ok(())
}

/// Split off one value: a quoted phrase or a run of non-space characters.
fn take_value(s: &str) -> (String, &str) {
    if let Some(quoted) = s.strip_prefix('"') {
        return read_quoted(quoted);
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    (s[..end].to_string(), &s[end..])
}

/// Read up to the next unescaped `"`. `\"` stands for a literal quote.
///
/// Without a closing quote the whole remainder is the phrase, verbatim.
fn read_quoted(s: &str) -> (String, &str) {
    let mut phrase = String::new();
    let mut chars = s.char_indices().peekable();

    while let Some((i, ch)) = chars.next() {
        match ch {
            '\\' if matches!(chars.peek(), Some((_, '"'))) => {
                phrase.push('"');
                chars.next();
            }
            '"' => return (phrase, &s[i + 1..]),
            _ => phrase.push(ch),
        }
    }

    (s.to_string(), "")
}

/// Resolve an English month name, full or by its first three letters.
fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    if let Some(i) = MONTHS.iter().position(|m| *m == lower) {
        return Some(i as u32 + 1);
    }

    let prefix: String = lower.chars().take(3).collect();
    if prefix.chars().count() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&prefix))
        .map(|i| i as u32 + 1)
}

/// Parse a date string like `2024-01-04`.
fn parse_date(value: &str, input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| SearchError::query(input, format!("invalid date '{value}': {e}")))
}
