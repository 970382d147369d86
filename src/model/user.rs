//! User identifier to display name table.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Identifier of the built-in automated sender.
pub const SLACKBOT_ID: &str = "USLACKBOT";

/// Display name of the built-in automated sender.
pub const SLACKBOT_NAME: &str = "slackbot";

/// One entry of a `users.json` manifest. Other keys are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntry {
    pub id: String,
    pub name: String,
}

/// Maps user identifiers to display names for one archive.
///
/// Always contains the `USLACKBOT` entry.
#[derive(Debug, Clone)]
pub struct UserTable {
    names: BTreeMap<String, String>,
}

impl Default for UserTable {
    fn default() -> Self {
        Self::new()
    }
}

impl UserTable {
    /// A table holding only the built-in automated sender.
    pub fn new() -> Self {
        let mut names = BTreeMap::new();
        names.insert(SLACKBOT_ID.to_string(), SLACKBOT_NAME.to_string());
        Self { names }
    }

    /// Add or replace one entry.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }

    /// Merge manifest entries; later entries win.
    pub fn extend(&mut self, entries: impl IntoIterator<Item = UserEntry>) {
        for entry in entries {
            self.names.insert(entry.id, entry.name);
        }
    }

    /// Display name for an identifier.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Replace every known identifier in `text` with its display name.
    ///
    /// Keys are visited in reverse lexicographic order so that an identifier
    /// is replaced before any shorter identifier that is its prefix.
    pub fn dereference(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (id, name) in self.names.iter().rev() {
            if out.contains(id.as_str()) {
                out = out.replace(id.as_str(), name);
            }
        }
        out
    }
}
