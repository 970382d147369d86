//! Archive enumeration: locating user manifests and channel-day files.
//!
//! An export looks like:
//!
//! ```text
//! export/
//!   channels.json
//!   users.json
//!   general/2024-01-05.json
//!   general/2024-01-06.json
//!   random/2024-01-05.json
//! ```
//!
//! A single day file can also be searched on its own; its channel is the
//! name of the directory containing it.

pub mod manifest;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::ArchiveConfig;
use crate::error::{Result, SearchError};
use crate::model::message::MessageRecord;
use crate::model::user::UserTable;

pub use self::manifest::load_users_file;

/// One channel-day file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFile {
    pub channel: String,
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
}

impl ChannelFile {
    /// Decode all message records in the file.
    pub fn read_records(&self) -> Result<Vec<MessageRecord>> {
        manifest::read_json(&self.path)
    }
}

/// Per-channel totals, for listing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ChannelSummary {
    pub name: String,
    pub files: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone)]
enum Kind {
    Directory,
    File,
}

/// One top-level archive path.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
    kind: Kind,
    layout: ArchiveConfig,
}

impl Archive {
    /// Open an export directory or a single channel-day file.
    pub fn open(path: &Path, layout: &ArchiveConfig) -> Result<Self> {
        if !path.exists() {
            return Err(SearchError::ArchiveNotFound(path.to_path_buf()));
        }
        let kind = if path.is_dir() {
            Kind::Directory
        } else {
            Kind::File
        };
        Ok(Self {
            path: path.to_path_buf(),
            kind,
            layout: layout.clone(),
        })
    }

    /// Directory holding the metadata files.
    fn root(&self) -> Option<&Path> {
        match self.kind {
            Kind::Directory => Some(&self.path),
            Kind::File => self.path.parent().and_then(Path::parent),
        }
    }

    /// Build the user table: built-in entries plus the users manifest, if any.
    pub fn load_users(&self) -> Result<UserTable> {
        let mut users = UserTable::new();
        let Some(root) = self.root() else {
            return Ok(users);
        };
        let manifest_path = root.join(&self.layout.users_file);
        if manifest_path.is_file() {
            users.extend(load_users_file(&manifest_path)?);
        } else {
            debug!(path = %manifest_path.display(), "No users manifest");
        }
        Ok(users)
    }

    /// Channel names present in the archive.
    ///
    /// Uses the channel manifests when any exist, otherwise every
    /// subdirectory of the archive root.
    pub fn channel_names(&self) -> Result<Vec<String>> {
        if let Kind::File = self.kind {
            return Ok(vec![self.file_channel()]);
        }

        let mut names = BTreeSet::new();
        let mut found_manifest = false;
        for manifest_name in &self.layout.channel_manifests {
            let manifest_path = self.path.join(manifest_name);
            if !manifest_path.is_file() {
                continue;
            }
            found_manifest = true;
            for entry in manifest::load_channel_manifest(&manifest_path)? {
                if let Some(name) = entry.dir_name() {
                    names.insert(name.to_string());
                }
            }
        }

        if !found_manifest {
            for entry in read_dir(&self.path)? {
                if entry.is_dir() {
                    if let Some(name) = entry.file_name().and_then(|n| n.to_str()) {
                        names.insert(name.to_string());
                    }
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Channel-day files for every channel accepted by `filter`, ordered by
    /// channel then file name.
    pub fn channel_files(&self, filter: impl Fn(&str) -> bool) -> Result<Vec<ChannelFile>> {
        if let Kind::File = self.kind {
            let channel = self.file_channel();
            if !filter(&channel) {
                return Ok(Vec::new());
            }
            return Ok(vec![ChannelFile {
                size: file_size(&self.path)?,
                channel,
                path: self.path.clone(),
            }]);
        }

        let mut files = Vec::new();
        for channel in self.channel_names()? {
            if !filter(&channel) {
                continue;
            }
            let dir = self.path.join(&channel);
            if !dir.is_dir() {
                debug!(channel = %channel, "Listed channel has no directory");
                continue;
            }
            for path in read_dir(&dir)? {
                if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                    files.push(ChannelFile {
                        size: file_size(&path)?,
                        channel: channel.clone(),
                        path,
                    });
                }
            }
        }
        Ok(files)
    }

    /// Number of day files and bytes per channel.
    pub fn channel_summaries(&self) -> Result<Vec<ChannelSummary>> {
        let mut summaries: Vec<ChannelSummary> = Vec::new();
        for file in self.channel_files(|_| true)? {
            match summaries.last_mut() {
                Some(last) if last.name == file.channel => {
                    last.files += 1;
                    last.bytes += file.size;
                }
                _ => summaries.push(ChannelSummary {
                    name: file.channel,
                    files: 1,
                    bytes: file.size,
                }),
            }
        }
        Ok(summaries)
    }

    fn file_channel(&self) -> String {
        let parent_name = self
            .path
            .parent()
            .and_then(Path::file_name)
            .and_then(|n| n.to_str());
        match parent_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                warn!(path = %self.path.display(), "Cannot infer channel from directory");
                self.path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            }
        }
    }
}

/// Directory entries sorted by path.
fn read_dir(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| SearchError::io(dir, e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SearchError::io(dir, e))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

fn file_size(path: &Path) -> Result<u64> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| SearchError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    fn sample_archive() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(
            &root.join("channels.json"),
            r#"[{"id":"C1","name":"general"},{"id":"C2","name":"random"},{"id":"C3","name":"empty"}]"#,
        );
        write(&root.join("users.json"), r#"[{"id":"U1","name":"alice"}]"#);
        write(&root.join("general/2024-01-06.json"), "[]");
        write(&root.join("general/2024-01-05.json"), "[]");
        write(&root.join("general/notes.txt"), "ignored");
        write(&root.join("random/2024-01-05.json"), "[]");
        write(&root.join("stray/2024-01-05.json"), "[]");
        tmp
    }

    #[test]
    fn test_missing_archive() {
        let err = Archive::open(Path::new("/nonexistent/export"), &ArchiveConfig::default())
            .unwrap_err();
        assert!(matches!(err, SearchError::ArchiveNotFound(_)));
    }

    #[test]
    fn test_channel_names_from_manifest() {
        let tmp = sample_archive();
        let archive = Archive::open(tmp.path(), &ArchiveConfig::default()).unwrap();
        assert_eq!(
            archive.channel_names().unwrap(),
            vec!["empty", "general", "random"]
        );
    }

    #[test]
    fn test_channel_names_from_directories() {
        let tmp = sample_archive();
        std::fs::remove_file(tmp.path().join("channels.json")).unwrap();
        let archive = Archive::open(tmp.path(), &ArchiveConfig::default()).unwrap();
        assert_eq!(
            archive.channel_names().unwrap(),
            vec!["general", "random", "stray"]
        );
    }

    #[test]
    fn test_channel_files_filtered_and_sorted() {
        let tmp = sample_archive();
        let archive = Archive::open(tmp.path(), &ArchiveConfig::default()).unwrap();
        let files = archive.channel_files(|c| c != "random").unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|f| {
                format!(
                    "{}/{}",
                    f.channel,
                    f.path.file_name().unwrap().to_string_lossy()
                )
            })
            .collect();
        assert_eq!(names, vec!["general/2024-01-05.json", "general/2024-01-06.json"]);
    }

    #[test]
    fn test_load_users_merges_builtin() {
        let tmp = sample_archive();
        let archive = Archive::open(tmp.path(), &ArchiveConfig::default()).unwrap();
        let users = archive.load_users().unwrap();
        assert_eq!(users.get("U1"), Some("alice"));
        assert_eq!(users.get("USLACKBOT"), Some("slackbot"));
    }

    #[test]
    fn test_single_file_archive() {
        let tmp = sample_archive();
        let path = tmp.path().join("random/2024-01-05.json");
        let archive = Archive::open(&path, &ArchiveConfig::default()).unwrap();
        assert_eq!(archive.channel_names().unwrap(), vec!["random"]);
        assert_eq!(archive.channel_files(|_| true).unwrap().len(), 1);
        assert!(archive.channel_files(|c| c == "general").unwrap().is_empty());
        // users.json is found two levels up
        assert_eq!(archive.load_users().unwrap().get("U1"), Some("alice"));
    }

    #[test]
    fn test_channel_summaries() {
        let tmp = sample_archive();
        let archive = Archive::open(tmp.path(), &ArchiveConfig::default()).unwrap();
        let summaries = archive.channel_summaries().unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].name, "general");
        assert_eq!(summaries[0].files, 2);
        assert_eq!(summaries[0].bytes, 4);
        assert_eq!(summaries[1].name, "random");
    }
}
