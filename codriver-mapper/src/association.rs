//! Mapped associations
//!
//! The outcome of resolving one target identifier. Notes are borrowed from
//! the catalogs where possible; notes fabricated for direct file references
//! are owned by the association.

use crate::catalog::SourceNote;
use crate::popularity::PopularityTable;
use crate::registry::TargetEntry;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

/// How an association (or one report row) came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolutionSource {
    ResolvedFromSource,
    NoSourceMatch,
    SourceNoteHasNoSounds,
    SoundFileMissing,
    ResolvedFromBaseFallback,
    /// Uncovered base note whose id is a target type
    UnmappedBaseType,
    /// Uncovered base note whose id is a target modifier
    UnmappedBaseModifier,
    /// Uncovered base note with no target counterpart
    UnmappedBaseUntyped,
}

impl ResolutionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolutionSource::ResolvedFromSource => "resolved-from-source",
            ResolutionSource::NoSourceMatch => "no-source-match",
            ResolutionSource::SourceNoteHasNoSounds => "source-note-has-no-sounds",
            ResolutionSource::SoundFileMissing => "sound-file-missing",
            ResolutionSource::ResolvedFromBaseFallback => "resolved-from-base-fallback",
            ResolutionSource::UnmappedBaseType => "unmapped-base-note-of-kind-type",
            ResolutionSource::UnmappedBaseModifier => "unmapped-base-note-of-kind-modifier",
            ResolutionSource::UnmappedBaseUntyped => "unmapped-base-note-of-kind-none",
        }
    }

    /// Tag for a set of resolved notes
    pub fn classify(notes: &[Cow<'_, SourceNote>]) -> Self {
        if notes.is_empty() {
            ResolutionSource::NoSourceMatch
        } else if notes.iter().all(|n| !n.has_sounds()) {
            ResolutionSource::SourceNoteHasNoSounds
        } else if notes.iter().all(|n| !n.has_available_sound()) {
            ResolutionSource::SoundFileMissing
        } else {
            ResolutionSource::ResolvedFromSource
        }
    }
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedAssociation<'a> {
    /// Raw target identifier
    pub target_name: String,
    pub target: Option<TargetEntry>,
    /// Package the notes were looked up in
    pub package: String,
    /// Sorted by `(id, name, category, translation)`
    pub notes: Vec<Cow<'a, SourceNote>>,
    pub source: ResolutionSource,
    /// Popularity of the first note's id, else of the target id
    pub popularity: Option<f64>,
    /// Popularity by source note id
    pub note_popularity: BTreeMap<i64, f64>,
    /// Played before the notes of a compound identifier
    pub prefix: Option<Cow<'a, SourceNote>>,
    pub rushed: bool,
}

/// One line of the mapping report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub source: ResolutionSource,
    pub target_name: String,
    pub source_id: Option<i64>,
    pub popularity: Option<f64>,
    pub file: String,
    pub subtitle: String,
}

impl ReportRow {
    pub const HEADER: [&'static str; 6] = ["src", "type", "rbr_id", "popularity", "file", "subtitle"];

    pub fn fields(&self) -> [String; 6] {
        [
            self.source.as_str().to_string(),
            self.target_name.clone(),
            self.source_id.unwrap_or(-1).to_string(),
            self.popularity.map(|p| p.to_string()).unwrap_or_else(|| "-1".to_string()),
            self.file.clone(),
            self.subtitle.clone(),
        ]
    }
}

impl<'a> MappedAssociation<'a> {
    pub fn new(target_name: impl Into<String>, package: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            target: None,
            package: package.into(),
            notes: Vec::new(),
            source: ResolutionSource::NoSourceMatch,
            popularity: None,
            note_popularity: BTreeMap::new(),
            prefix: None,
            rushed: false,
        }
    }

    /// Set the notes, sorting them and deriving the resolution tag
    pub fn with_notes(mut self, mut notes: Vec<Cow<'a, SourceNote>>) -> Self {
        notes.sort_by(|a, b| SourceNote::report_order(a, b));
        self.source = ResolutionSource::classify(&notes);
        self.notes = notes;
        self
    }

    /// Look up the popularity of every note id and of the association
    pub fn attach_popularity(&mut self, table: Option<&PopularityTable>) {
        let Some(table) = table else {
            return;
        };
        self.note_popularity = self
            .notes
            .iter()
            .filter_map(|n| n.id)
            .filter_map(|id| table.popularity(id).map(|p| (id, p)))
            .collect();
        self.popularity = self
            .notes
            .first()
            .and_then(|n| n.id)
            .or_else(|| self.target_id())
            .and_then(|id| table.popularity(id));
    }

    pub fn is_resolved(&self) -> bool {
        self.source == ResolutionSource::ResolvedFromSource
    }

    /// Id reported when no note carries one
    pub fn target_id(&self) -> Option<i64> {
        self.target.as_ref().and_then(TargetEntry::id)
    }

    /// Expand into one row per (note, sound file)
    ///
    /// Files are sorted per note. A missing file is tagged
    /// `sound-file-missing`; an association without sounds yields one row
    /// with an empty file.
    pub fn rows(&self) -> Vec<ReportRow> {
        let mut rows = Vec::new();
        for note in &self.notes {
            let mut files: Vec<&String> = note.sound_files.iter().collect();
            files.sort();
            for file in files {
                let source = if note.is_sound_missing(file) && self.source == ResolutionSource::ResolvedFromSource {
                    ResolutionSource::SoundFileMissing
                } else {
                    self.source
                };
                rows.push(ReportRow {
                    source,
                    target_name: self.target_name.clone(),
                    source_id: note.id,
                    popularity: note.id.and_then(|id| self.note_popularity.get(&id).copied()),
                    file: file.clone(),
                    subtitle: note.translation.clone(),
                });
            }
        }

        if rows.is_empty() {
            rows.push(ReportRow {
                source: self.source,
                target_name: self.target_name.clone(),
                source_id: self.notes.first().and_then(|n| n.id).or_else(|| self.target_id()),
                popularity: self.popularity,
                file: String::new(),
                subtitle: String::new(),
            });
        }
        rows
    }
}
