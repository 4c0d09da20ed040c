//! Source catalog
//!
//! The deduplicated set of source notes of one package (numeric,
//! descriptive, reversed, ...). Notes are keyed by identity `(name, id)`.
//! The first note stored for an identity wins; a later declaration with the
//! same identity but different content is reported as a conflict and
//! discarded, so parse order is preserved.

use crate::config_tree::{ConfigTreeParser, DeclKind, RawDeclaration};
use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::ini::IniDocument;
use crate::translation::TranslationResolver;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Identity of a source note
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey {
    pub name: String,
    pub id: Option<i64>,
}

/// One unit of source-taxonomy content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceNote {
    /// Lower-cased name, never empty
    pub name: String,
    pub id: Option<i64>,
    pub kind: DeclKind,
    pub category: Option<String>,
    pub package: Option<String>,
    /// Ini file the note was declared in
    pub origin_file: String,
    /// `Sounds` as declared
    pub declared_sounds: usize,
    /// Sound file names, no duplicates
    pub sound_files: Vec<String>,
    pub sounds_dir: PathBuf,
    pub translation: String,
    /// Subset of `sound_files` confirmed missing on disk
    pub sounds_not_found: BTreeSet<String>,
    /// original → substituted file name
    pub sounds_renamed: BTreeMap<String, String>,
}

impl SourceNote {
    /// A note standing for a single sound file referenced directly by a
    /// static override rather than declared in a config tree
    pub fn direct_file(
        file: &str,
        package: &str,
        sounds_dir: impl Into<PathBuf>,
        id: Option<i64>,
    ) -> Self {
        Self {
            name: file.to_lowercase(),
            id,
            kind: DeclKind::Pacenote,
            category: None,
            package: Some(package.to_string()),
            origin_file: String::new(),
            declared_sounds: 1,
            sound_files: vec![file.to_string()],
            sounds_dir: sounds_dir.into(),
            translation: String::new(),
            sounds_not_found: BTreeSet::new(),
            sounds_renamed: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> NoteKey {
        NoteKey {
            name: self.name.clone(),
            id: self.id,
        }
    }

    pub fn has_sounds(&self) -> bool {
        !self.sound_files.is_empty()
    }

    pub fn is_sound_missing(&self, file: &str) -> bool {
        self.sounds_not_found.contains(file)
    }

    /// True if at least one sound file exists on disk
    pub fn has_available_sound(&self) -> bool {
        self.sound_files.iter().any(|f| !self.is_sound_missing(f))
    }

    pub fn sound_path(&self, file: &str) -> PathBuf {
        self.sounds_dir.join(file)
    }

    /// Original name of a substituted sound file
    pub fn renamed_from(&self, file: &str) -> Option<&str> {
        self.sounds_renamed
            .iter()
            .find(|(_, to)| to.as_str() == file)
            .map(|(from, _)| from.as_str())
    }

    /// Full structural equality: name, id, category, package, translation
    /// and the set of sound files
    pub fn same_content(&self, other: &SourceNote) -> bool {
        let mine: BTreeSet<&String> = self.sound_files.iter().collect();
        let theirs: BTreeSet<&String> = other.sound_files.iter().collect();
        self.name == other.name
            && self.id == other.id
            && self.category == other.category
            && self.package == other.package
            && self.translation == other.translation
            && mine == theirs
    }

    /// Report order: `(id, name, category, translation)`
    pub fn report_order(a: &SourceNote, b: &SourceNote) -> Ordering {
        (a.id, &a.name, &a.category, &a.translation).cmp(&(b.id, &b.name, &b.category, &b.translation))
    }
}

impl fmt::Display for SourceNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - T: {} - C: {} - P: {} - Sounds: {:?} - Translation: {} - Ini: {}",
            self.id.unwrap_or(-1),
            self.name,
            self.kind,
            self.category.as_deref().unwrap_or(""),
            self.package.as_deref().unwrap_or(""),
            self.sound_files,
            self.translation,
            self.origin_file
        )
    }
}

/// Insertion outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// Same identity and same content already stored
    Duplicate,
    /// Same identity, different content; stored note kept
    Conflict,
}

/// The notes of one package
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    package: String,
    sounds_dir: PathBuf,
    notes: Vec<SourceNote>,
    index: HashMap<NoteKey, usize>,
    by_id: HashMap<i64, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl SourceCatalog {
    pub fn new(package: impl Into<String>, sounds_dir: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            sounds_dir: sounds_dir.into(),
            ..Default::default()
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn sounds_dir(&self) -> &Path {
        &self.sounds_dir
    }

    /// Store a note unless its identity is already taken
    pub fn insert_note(&mut self, note: SourceNote, log: &mut DiagnosticLog) -> InsertOutcome {
        let key = note.key();
        if let Some(&existing) = self.index.get(&key) {
            let stored = &self.notes[existing];
            if stored.same_content(&note) {
                return InsertOutcome::Duplicate;
            }
            log.record(
                DiagnosticKind::Conflict,
                note.name.clone(),
                format!("Conflicting pacenote:\n{}\n{}", stored, note),
            );
            return InsertOutcome::Conflict;
        }

        let index = self.notes.len();
        if let Some(id) = note.id {
            self.by_id.entry(id).or_default().push(index);
        }
        self.by_name.entry(note.name.to_lowercase()).or_default().push(index);
        self.index.insert(key, index);
        self.notes.push(note);
        InsertOutcome::Inserted
    }

    /// All notes in insertion order
    pub fn all_notes(&self) -> &[SourceNote] {
        &self.notes
    }

    pub fn by_id(&self, id: i64) -> Vec<&SourceNote> {
        self.collect(self.by_id.get(&id))
    }

    /// Case-insensitive exact name match
    pub fn by_name(&self, name: &str) -> Vec<&SourceNote> {
        self.collect(self.by_name.get(&name.to_lowercase()))
    }

    pub fn get(&self, key: &NoteKey) -> Option<&SourceNote> {
        self.index.get(key).map(|&i| &self.notes[i])
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Mark a sound file of a stored note as missing after the fact
    pub fn record_missing_sound(&mut self, key: &NoteKey, file: &str) -> bool {
        match self.index.get(key) {
            Some(&i) if self.notes[i].sound_files.iter().any(|f| f == file) => {
                self.notes[i].sounds_not_found.insert(file.to_string());
                true
            }
            _ => false,
        }
    }

    fn collect(&self, indices: Option<&Vec<usize>>) -> Vec<&SourceNote> {
        indices
            .map(|v| v.iter().map(|&i| &self.notes[i]).collect())
            .unwrap_or_default()
    }
}

/// Catalogs by package name
pub type CatalogSet = BTreeMap<String, SourceCatalog>;

/// Insertion policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPolicy {
    /// Notes declaring fewer `Snd*` entries than this are not tracked
    pub min_declared_sounds: usize,
    /// Check every sound file on disk
    pub check_sounds_exist: bool,
}

impl Default for CatalogPolicy {
    fn default() -> Self {
        Self {
            min_declared_sounds: 1,
            check_sounds_exist: true,
        }
    }
}

/// File locations of one pacenote plugin installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginLayout {
    pub plugin_dir: PathBuf,
    /// Config tree roots, read in order
    pub root_files: Vec<PathBuf>,
    pub sounds_dir: PathBuf,
    /// `language/<lang>` directory
    pub language_dir: PathBuf,
}

impl PluginLayout {
    /// Derive the layout from `PaceNote.ini` `[SETTINGS]` (`sounds`, `language`)
    ///
    /// Roots are `config/pacenotes/<ini>` for each entry of `ini_files`
    /// followed by `config/ranges/Rbr.ini`.
    pub fn from_plugin_dir(
        plugin_dir: &Path,
        ini_files: &[String],
        log: &mut DiagnosticLog,
    ) -> Option<Self> {
        if !plugin_dir.is_dir() {
            log.record(
                DiagnosticKind::MissingFile,
                plugin_dir.display().to_string(),
                "Not a directory",
            );
            return None;
        }

        let settings_file = plugin_dir.join("PaceNote.ini");
        let doc = match IniDocument::read(&settings_file) {
            Ok(doc) => doc,
            Err(e) => {
                log.record(
                    DiagnosticKind::MissingFile,
                    settings_file.display().to_string(),
                    format!("Cannot read plugin settings: {}", e),
                );
                return None;
            }
        };

        let settings = doc.section("SETTINGS");
        let sounds = settings.and_then(|s| s.get("sounds")).unwrap_or_default();
        let language = settings.and_then(|s| s.get("language")).unwrap_or_default();
        if sounds.is_empty() || language.is_empty() {
            tracing::warn!(
                file = %settings_file.display(),
                "Plugin settings lack 'sounds' or 'language'"
            );
        }

        debug!(sounds, language, "Plugin settings");

        let config_dir = plugin_dir.join("config");
        let mut root_files: Vec<PathBuf> = ini_files
            .iter()
            .map(|ini| config_dir.join("pacenotes").join(ini))
            .collect();
        root_files.push(config_dir.join("ranges").join("Rbr.ini"));

        Some(Self {
            plugin_dir: plugin_dir.to_path_buf(),
            root_files,
            sounds_dir: plugin_dir.join("sounds").join(sounds),
            language_dir: plugin_dir.join("language").join(language),
        })
    }
}

/// Builds a [`SourceCatalog`] from raw declarations
pub struct CatalogBuilder {
    catalog: SourceCatalog,
    policy: CatalogPolicy,
    renames: BTreeMap<String, String>,
    translations: TranslationResolver,
}

impl CatalogBuilder {
    pub fn new(
        package: impl Into<String>,
        sounds_dir: impl Into<PathBuf>,
        language_dir: impl Into<PathBuf>,
        policy: CatalogPolicy,
    ) -> Self {
        Self {
            catalog: SourceCatalog::new(package, sounds_dir),
            policy,
            renames: BTreeMap::new(),
            translations: TranslationResolver::new(language_dir),
        }
    }

    /// Sound file substitutions (original → replacement) applied on insert
    pub fn with_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.renames = renames;
        self
    }

    /// Build a note from a declaration and store it
    ///
    /// Returns `None` if the declaration is below the declared-sound threshold.
    pub fn insert(&mut self, raw: RawDeclaration, log: &mut DiagnosticLog) -> Option<InsertOutcome> {
        if raw.sound_files.len() < self.policy.min_declared_sounds {
            debug!(
                name = %raw.name,
                sounds = raw.sound_files.len(),
                "Skipping note below declared-sound threshold"
            );
            return None;
        }

        let translation = match self
            .translations
            .resolve(&raw.name, raw.category.as_deref(), &raw.origin_file)
        {
            Some(text) => text,
            None => {
                log.record(
                    DiagnosticKind::MissingTranslation,
                    raw.name.clone(),
                    format!("No translation for: {}", raw.name),
                );
                String::new()
            }
        };

        let mut sound_files = Vec::with_capacity(raw.sound_files.len());
        let mut sounds_renamed = BTreeMap::new();
        for file in raw.sound_files {
            let file = match self.renames.get(&file) {
                Some(substitute) => {
                    sounds_renamed.insert(file.clone(), substitute.clone());
                    substitute.clone()
                }
                None => file,
            };
            if !sound_files.contains(&file) {
                sound_files.push(file);
            }
        }

        let sounds_dir = self.catalog.sounds_dir.clone();
        let mut sounds_not_found = BTreeSet::new();
        if self.policy.check_sounds_exist {
            for file in &sound_files {
                if !sounds_dir.join(file).is_file() {
                    log.record(
                        DiagnosticKind::MissingSound,
                        file.clone(),
                        format!("Sound file of '{}' not found in {}", raw.name, sounds_dir.display()),
                    );
                    sounds_not_found.insert(file.clone());
                }
            }
        }

        let note = SourceNote {
            name: raw.name,
            id: raw.id,
            kind: raw.kind,
            category: raw.category,
            package: raw.package,
            origin_file: raw.origin_file,
            declared_sounds: raw.declared_sounds,
            sound_files,
            sounds_dir,
            translation,
            sounds_not_found,
            sounds_renamed,
        };

        Some(self.catalog.insert_note(note, log))
    }

    /// Parse a config tree and insert every declaration
    pub fn insert_tree(&mut self, root_file: &Path, log: &mut DiagnosticLog) {
        let declarations = ConfigTreeParser::new().parse(root_file, log);
        for raw in declarations {
            self.insert(raw, log);
        }
    }

    pub fn finish(self) -> SourceCatalog {
        self.catalog
    }
}

/// Build the catalog of one package from a plugin installation
///
/// A missing plugin directory or settings file yields an empty catalog.
pub fn build_catalog(
    package: &str,
    plugin_dir: &Path,
    ini_files: &[String],
    policy: CatalogPolicy,
    renames: BTreeMap<String, String>,
) -> (SourceCatalog, DiagnosticLog) {
    let mut log = DiagnosticLog::new();

    let Some(layout) = PluginLayout::from_plugin_dir(plugin_dir, ini_files, &mut log) else {
        return (SourceCatalog::new(package, PathBuf::new()), log);
    };

    let mut builder = CatalogBuilder::new(
        package,
        layout.sounds_dir.clone(),
        layout.language_dir.clone(),
        policy,
    )
    .with_renames(renames);

    for root in &layout.root_files {
        builder.insert_tree(root, &mut log);
    }

    let catalog = builder.finish();
    info!(
        package,
        notes = catalog.len(),
        problems = log.len(),
        "Source catalog built"
    );
    (catalog, log)
}
