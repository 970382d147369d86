//! Reading the JSON metadata files at the root of an export.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{Result, SearchError};
use crate::model::user::UserEntry;

/// One entry of `channels.json`, `groups.json` or `mpims.json`.
///
/// Direct-message manifests carry only an `id`, which is also the
/// directory name.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl ChannelEntry {
    /// Directory name of the channel inside the archive.
    pub fn dir_name(&self) -> Option<&str> {
        self.name.as_deref().or(self.id.as_deref())
    }
}

/// Read and decode a whole JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path).map_err(|e| SearchError::io(path, e))?;
    serde_json::from_str(&contents).map_err(|e| SearchError::json(path, e))
}

/// Load a users manifest (`[{"id": ..., "name": ...}, ...]`).
pub fn load_users_file(path: &Path) -> Result<Vec<UserEntry>> {
    read_json(path)
}

/// Load a channel manifest.
pub fn load_channel_manifest(path: &Path) -> Result<Vec<ChannelEntry>> {
    read_json(path)
}
