//! Target sound inventory
//!
//! A target sound tree holds one directory per target identifier; a
//! directory counts only if it contains a `subtitles.csv` listing
//! `file,subtitle` pairs.

use crate::csv_text::parse_line;
use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const SUBTITLES_FILE: &str = "subtitles.csv";

/// One target identifier found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSound {
    pub name: String,
    pub dir: PathBuf,
    /// sound file → subtitle
    pub subtitles: BTreeMap<String, String>,
}

/// Target sounds by identifier
#[derive(Debug, Clone, Default)]
pub struct TargetInventory {
    sounds: BTreeMap<String, TargetSound>,
}

impl TargetInventory {
    pub fn get(&self, name: &str) -> Option<&TargetSound> {
        self.sounds.get(name)
    }

    /// Identifiers in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sounds.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }
}

/// Walk `dir` and collect every directory holding a subtitle manifest
pub fn scan_target_sounds(dir: &Path, log: &mut DiagnosticLog) -> TargetInventory {
    let mut inventory = TargetInventory::default();
    if !dir.is_dir() {
        log.record(
            DiagnosticKind::MissingFile,
            dir.display().to_string(),
            "Target sound directory not found",
        );
        return inventory;
    }

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Error accessing entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || entry.file_name() != SUBTITLES_FILE {
            continue;
        }

        let Some(note_dir) = entry.path().parent() else {
            continue;
        };
        let name = note_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if inventory.sounds.contains_key(&name) {
            tracing::warn!(
                name = %name,
                dir = %note_dir.display(),
                "Duplicate target sound directory, keeping the first"
            );
            continue;
        }

        let subtitles = match std::fs::read_to_string(entry.path()) {
            Ok(content) => parse_subtitles(&content),
            Err(e) => {
                log.record(
                    DiagnosticKind::MissingFile,
                    entry.path().display().to_string(),
                    format!("Cannot read subtitles: {}", e),
                );
                continue;
            }
        };

        inventory.sounds.insert(
            name.clone(),
            TargetSound {
                name,
                dir: note_dir.to_path_buf(),
                subtitles,
            },
        );
    }

    tracing::info!(
        dir = %dir.display(),
        notes = inventory.len(),
        "Target sounds scanned"
    );
    inventory
}

fn parse_subtitles(content: &str) -> BTreeMap<String, String> {
    content
        .trim_start_matches('\u{feff}')
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|line| {
            let mut fields = parse_line(line).into_iter();
            let file = fields.next()?;
            let subtitle = fields.next().unwrap_or_default();
            Some((file, subtitle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_only_directories_with_subtitles_count() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("corner_1_left")).unwrap();
        fs::write(
            root.join("corner_1_left/subtitles.csv"),
            "1.wav,\"one, left\"\n2.wav,one left\n",
        )
        .unwrap();
        fs::create_dir_all(root.join("nested/detail_finish")).unwrap();
        fs::write(root.join("nested/detail_finish/subtitles.csv"), "1.wav,finish\n").unwrap();
        fs::create_dir_all(root.join("no_manifest")).unwrap();
        fs::write(root.join("no_manifest/1.wav"), b"").unwrap();

        let mut log = DiagnosticLog::new();
        let inventory = scan_target_sounds(root, &mut log);

        assert_eq!(
            inventory.names().collect::<Vec<_>>(),
            vec!["corner_1_left", "detail_finish"]
        );
        let corner = inventory.get("corner_1_left").unwrap();
        assert_eq!(corner.subtitles.get("1.wav").map(String::as_str), Some("one, left"));
        assert!(log.is_empty());
    }

    #[test]
    fn test_missing_directory_is_logged() {
        let temp = TempDir::new().unwrap();
        let mut log = DiagnosticLog::new();
        let inventory = scan_target_sounds(&temp.path().join("absent"), &mut log);
        assert!(inventory.is_empty());
        assert_eq!(log.count(DiagnosticKind::MissingFile), 1);
    }
}
