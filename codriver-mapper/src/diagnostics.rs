//! Recoverable problems collected during a run
//!
//! Every entry is also emitted through `tracing` when it is recorded, so a
//! run with logging enabled shows problems as they happen and the log can
//! still be reviewed at the end.

use std::fmt;

/// Severity class of a recoverable problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The data is malformed or inconsistent
    DataQuality,
    /// Something referenced does not exist
    MissingResource,
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Enumeration line not of the form `name = id[,]`
    MalformedEnumLine,
    /// `Sounds` count differs from the number of `Snd*` options
    SoundCountMismatch,
    /// Pacenote declared without an id
    MissingId,
    /// `id` option is not an integer
    InvalidId,
    /// Note section with an empty name
    EmptyName,
    /// No translation found for a non-numeric note
    MissingTranslation,
    /// Same identity declared twice with different content
    Conflict,
    /// Config file with no sections
    InvalidFile,
    /// Include or root file does not exist
    MissingFile,
    /// Referenced sound file does not exist on disk
    MissingSound,
    /// Target identifier resolved to no source notes
    UnresolvedMapping,
}

impl DiagnosticKind {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::MalformedEnumLine
            | DiagnosticKind::SoundCountMismatch
            | DiagnosticKind::MissingId
            | DiagnosticKind::InvalidId
            | DiagnosticKind::EmptyName
            | DiagnosticKind::MissingTranslation
            | DiagnosticKind::Conflict
            | DiagnosticKind::InvalidFile => Severity::DataQuality,
            DiagnosticKind::MissingFile
            | DiagnosticKind::MissingSound
            | DiagnosticKind::UnresolvedMapping => Severity::MissingResource,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::MalformedEnumLine => "malformed_enum_line",
            DiagnosticKind::SoundCountMismatch => "sound_count_mismatch",
            DiagnosticKind::MissingId => "missing_id",
            DiagnosticKind::InvalidId => "invalid_id",
            DiagnosticKind::EmptyName => "empty_name",
            DiagnosticKind::MissingTranslation => "missing_translation",
            DiagnosticKind::Conflict => "conflict",
            DiagnosticKind::InvalidFile => "invalid_file",
            DiagnosticKind::MissingFile => "missing_file",
            DiagnosticKind::MissingSound => "missing_sound",
            DiagnosticKind::UnresolvedMapping => "unresolved_mapping",
        }
    }
}

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// The file, note or identifier the problem is about
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind.as_str(), self.subject, self.message)
    }
}

/// Ordered log of recoverable problems
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a problem and emit it through tracing
    pub fn record(
        &mut self,
        kind: DiagnosticKind,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };

        match kind.severity() {
            Severity::DataQuality => tracing::warn!(
                kind = kind.as_str(),
                subject = %diagnostic.subject,
                "{}",
                diagnostic.message
            ),
            Severity::MissingResource => tracing::error!(
                kind = kind.as_str(),
                subject = %diagnostic.subject,
                "{}",
                diagnostic.message
            ),
        }

        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count entries of one kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.iter().filter(|d| d.kind == kind).count()
    }

    /// Count entries by severity: (data quality, missing resource)
    pub fn count_by_severity(&self) -> (usize, usize) {
        let mut data_quality = 0;
        let mut missing = 0;
        for entry in &self.entries {
            match entry.kind.severity() {
                Severity::DataQuality => data_quality += 1,
                Severity::MissingResource => missing += 1,
            }
        }
        (data_quality, missing)
    }

    /// Append every entry of another log
    pub fn extend(&mut self, other: DiagnosticLog) {
        self.entries.extend(other.entries);
    }

    /// One-line summary for the end of a run
    pub fn summary_message(&self) -> String {
        if self.entries.is_empty() {
            return "No problems recorded".to_string();
        }
        let (data_quality, missing) = self.count_by_severity();
        format!(
            "{} problem(s) recorded: {} data quality, {} missing resource",
            self.entries.len(),
            data_quality,
            missing
        )
    }
}
