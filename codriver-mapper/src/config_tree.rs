//! ConfigTree parser
//!
//! Walks a tree of pacenote ini files. `PACKAGE::<name>` and
//! `CATEGORY::<name>` sections switch the active context and may include
//! further files through any option starting with `file`. Include paths are
//! relative to the including file and inherit the context in effect at the
//! point of inclusion. `PACENOTE::<name>` and `RANGE::<name>` sections yield
//! one [`RawDeclaration`] each.

use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::ini::{IniDocument, IniSection};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Declaration keyword of a note section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeclKind {
    Pacenote,
    Range,
}

impl DeclKind {
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "PACENOTE" => Some(DeclKind::Pacenote),
            "RANGE" => Some(DeclKind::Range),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Pacenote => "PACENOTE",
            DeclKind::Range => "RANGE",
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Package/category in effect while reading a file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeContext {
    pub package: Option<String>,
    pub category: Option<String>,
}

/// A note section as declared, before catalog insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeclaration {
    pub kind: DeclKind,
    /// Lower-cased note name
    pub name: String,
    pub category: Option<String>,
    pub package: Option<String>,
    /// File name (no directory) of the declaring ini file
    pub origin_file: String,
    pub id: Option<i64>,
    /// Value of the `Sounds` option (0 when absent)
    pub declared_sounds: usize,
    /// `Snd*` values in declaration order, duplicates removed
    pub sound_files: Vec<String>,
}

/// Recursive reader for pacenote config trees
#[derive(Debug, Default)]
pub struct ConfigTreeParser {
    visiting: HashSet<PathBuf>,
}

impl ConfigTreeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a root file and everything it includes
    ///
    /// Unreadable, missing or empty files are logged and skipped; traversal
    /// continues with the siblings.
    pub fn parse(&mut self, root_file: &Path, log: &mut DiagnosticLog) -> Vec<RawDeclaration> {
        let mut out = Vec::new();
        self.read_file(root_file, TreeContext::default(), log, &mut out);
        out
    }

    fn read_file(
        &mut self,
        file: &Path,
        mut context: TreeContext,
        log: &mut DiagnosticLog,
        out: &mut Vec<RawDeclaration>,
    ) {
        if !file.is_file() {
            log.record(
                DiagnosticKind::MissingFile,
                file.display().to_string(),
                "Config file not found",
            );
            return;
        }

        let key = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        if !self.visiting.insert(key.clone()) {
            tracing::warn!(file = %file.display(), "Include cycle detected, skipping");
            return;
        }

        debug!(
            file = %file.display(),
            package = ?context.package,
            category = ?context.category,
            "Reading config file"
        );

        let doc = match IniDocument::read(file) {
            Ok(doc) => doc,
            Err(e) => {
                log.record(
                    DiagnosticKind::MissingFile,
                    file.display().to_string(),
                    format!("Cannot read config file: {}", e),
                );
                self.visiting.remove(&key);
                return;
            }
        };

        if doc.is_empty() {
            log.record(
                DiagnosticKind::InvalidFile,
                file.display().to_string(),
                "Invalid file: no sections",
            );
            self.visiting.remove(&key);
            return;
        }

        let base_dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
        let origin_file = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        for section in doc.sections() {
            let Some((keyword, name)) = section.split_name() else {
                continue;
            };

            match keyword {
                "PACKAGE" | "CATEGORY" => {
                    if keyword == "PACKAGE" {
                        context.package = Some(name.to_string());
                    } else {
                        context.category = Some(name.to_string());
                    }

                    for (_, include) in section.options_with_prefix("file") {
                        let include = base_dir.join(include.replace('\\', "/"));
                        self.read_file(&include, context.clone(), log, out);
                    }
                }
                _ => {
                    if let Some(kind) = DeclKind::from_keyword(keyword) {
                        if name.trim().is_empty() {
                            log.record(
                                DiagnosticKind::EmptyName,
                                section.name.clone(),
                                format!("Note section without a name in {}", origin_file),
                            );
                            continue;
                        }
                        let declaration =
                            declaration_from_section(section, kind, name, &context, &origin_file, log);
                        out.push(declaration);
                    }
                }
            }
        }

        self.visiting.remove(&key);
    }
}

fn declaration_from_section(
    section: &IniSection,
    kind: DeclKind,
    name: &str,
    context: &TreeContext,
    origin_file: &str,
    log: &mut DiagnosticLog,
) -> RawDeclaration {
    let name = name.trim().to_lowercase();

    let id = match section.get("id") {
        None => None,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                log.record(
                    DiagnosticKind::InvalidId,
                    section.name.clone(),
                    format!("Non-integer id '{}' in {}", raw, origin_file),
                );
                None
            }
        },
    };

    if id.is_none() && kind == DeclKind::Pacenote {
        log.record(
            DiagnosticKind::MissingId,
            section.name.clone(),
            format!("No id in {}", origin_file),
        );
    }

    let declared_sounds = section
        .get("sounds")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut sound_files: Vec<String> = Vec::new();
    let mut present = 0;
    for (_, sound) in section.options_with_prefix("snd") {
        present += 1;
        let sound = sound.to_string();
        if !sound_files.contains(&sound) {
            sound_files.push(sound);
        }
    }

    if declared_sounds != present {
        log.record(
            DiagnosticKind::SoundCountMismatch,
            section.name.clone(),
            format!(
                "Invalid sound count: Sounds={} but {} Snd entries in {}",
                declared_sounds, present, origin_file
            ),
        );
    }

    RawDeclaration {
        kind,
        name,
        category: context.category.clone(),
        package: context.package.clone(),
        origin_file: origin_file.to_string(),
        id,
        declared_sounds,
        sound_files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_context_is_inherited_through_includes() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "Rbr.ini",
            "[PACKAGE::Numeric]\nfile0 = packages\\corners.ini\n",
        );
        write(
            temp.path(),
            "packages/corners.ini",
            "[CATEGORY::Corners]\nfile0 = left.ini\n",
        );
        write(
            temp.path(),
            "packages/left.ini",
            "[PACENOTE::ONE_LEFT]\nid = 3\nSounds = 1\nSnd0 = one_left.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        let d = &decls[0];
        assert_eq!(d.name, "one_left");
        assert_eq!(d.kind, DeclKind::Pacenote);
        assert_eq!(d.id, Some(3));
        assert_eq!(d.package.as_deref(), Some("Numeric"));
        assert_eq!(d.category.as_deref(), Some("Corners"));
        assert_eq!(d.origin_file, "left.ini");
        assert_eq!(d.sound_files, vec!["one_left.ogg"]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_sound_count_mismatch_is_logged_and_note_kept() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[PACENOTE::TWO_LEFT]\nid = 4\nSounds = 2\nSnd0 = two_left.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].sound_files.len(), 1);
        assert_eq!(decls[0].declared_sounds, 2);
        assert_eq!(log.count(DiagnosticKind::SoundCountMismatch), 1);
    }

    #[test]
    fn test_missing_include_and_invalid_file_do_not_abort() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[CATEGORY::Misc]\nfile0 = absent.ini\nfile1 = empty.ini\nfile2 = good.ini\n",
        );
        write(temp.path(), "empty.ini", "; nothing here\n");
        write(
            temp.path(),
            "good.ini",
            "[RANGE::100]\nSounds = 1\nSnd0 = 100.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].kind, DeclKind::Range);
        assert_eq!(decls[0].id, None);
        assert_eq!(log.count(DiagnosticKind::MissingFile), 1);
        assert_eq!(log.count(DiagnosticKind::InvalidFile), 1);
        // ranges without id are not suspect
        assert_eq!(log.count(DiagnosticKind::MissingId), 0);
    }

    #[test]
    fn test_pacenote_without_id_is_logged_not_dropped() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[PACENOTE::CAUTION]\nSounds = 1\nSnd0 = caution.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].id, None);
        assert_eq!(log.count(DiagnosticKind::MissingId), 1);
    }

    #[test]
    fn test_unnamed_note_section_is_skipped() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[PACENOTE::]\nid = 5\nSounds = 1\nSnd0 = x.ogg\n\
             [RANGE:: ]\nSounds = 1\nSnd0 = y.ogg\n\
             [PACENOTE::JUMP]\nid = 30\nSounds = 1\nSnd0 = jump.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "jump");
        assert_eq!(log.count(DiagnosticKind::EmptyName), 2);
        assert_eq!(log.count(DiagnosticKind::MissingId), 0);
    }

    #[test]
    fn test_non_integer_id_is_logged_and_note_kept() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[PACENOTE::BRIDGE]\nid = abc\nSounds = 1\nSnd0 = bridge.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "bridge");
        assert_eq!(decls[0].id, None);
        assert_eq!(log.count(DiagnosticKind::InvalidId), 1);
        assert_eq!(log.count(DiagnosticKind::MissingId), 1);
        assert_eq!(log.entries()[0].subject, "PACENOTE::BRIDGE");
    }

    #[test]
    fn test_duplicate_sound_entries_are_collapsed() {
        let temp = TempDir::new().unwrap();
        let root = write(
            temp.path(),
            "root.ini",
            "[PACENOTE::JUMP]\nid = 30\nSounds = 2\nSnd0 = jump.ogg\nSnd1 = jump.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);

        assert_eq!(decls[0].sound_files, vec!["jump.ogg"]);
        assert_eq!(log.count(DiagnosticKind::SoundCountMismatch), 0);
    }

    #[test]
    fn test_include_cycle_is_skipped() {
        let temp = TempDir::new().unwrap();
        let root = write(temp.path(), "a.ini", "[PACKAGE::P]\nfile0 = b.ini\n");
        write(
            temp.path(),
            "b.ini",
            "[CATEGORY::C]\nfile0 = a.ini\n[PACENOTE::X]\nid = 1\nSounds = 1\nSnd0 = x.ogg\n",
        );

        let mut log = DiagnosticLog::new();
        let decls = ConfigTreeParser::new().parse(&root, &mut log);
        assert_eq!(decls.len(), 1);
    }
}
