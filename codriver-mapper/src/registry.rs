//! Target type registry
//!
//! Flat id ↔ name tables for the target taxonomy, read from enumeration-like
//! text files:
//!
//! ```text
//! // Weird naming is used to simplify sound reading.
//! corner_1_left = 0,
//! corner_square_left = 1,
//! detail_finish = 22,
//! ```

use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::error::{MapperError, Result};
use crate::translation::is_numeric;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Structural prefix of detail notes in the target taxonomy
pub const DETAIL_PREFIX: &str = "detail_";

/// Target corner tokens and their source-side ordinal words, applied in order
const CORNER_ORDINALS: [(&str, &str); 6] = [
    ("corner_1", "one"),
    ("corner_2", "two"),
    ("corner_3", "three"),
    ("corner_4", "four"),
    ("corner_5", "five"),
    ("corner_6", "six"),
];

/// A target-taxonomy identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetEntry {
    Type { name: String, id: i64 },
    Modifier { name: String, id: i64, strip_prefix: bool },
    /// Distance or count; `id` stays unset until matched
    Range { name: String, id: Option<i64> },
}

impl TargetEntry {
    /// Range from a purely numeric token
    pub fn range(token: &str) -> Result<Self> {
        if !is_numeric(token) {
            return Err(MapperError::InvalidArgument(format!(
                "Invalid name: {} for range",
                token
            )));
        }
        Ok(TargetEntry::Range {
            name: token.to_string(),
            id: None,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            TargetEntry::Type { name, .. }
            | TargetEntry::Modifier { name, .. }
            | TargetEntry::Range { name, .. } => name,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            TargetEntry::Type { id, .. } | TargetEntry::Modifier { id, .. } => Some(*id),
            TargetEntry::Range { id, .. } => *id,
        }
    }

    /// Name as spelled in the source taxonomy
    pub fn source_name(&self) -> String {
        match self {
            TargetEntry::Type { name, .. } => {
                let mut translated = name.clone();
                for (token, word) in CORNER_ORDINALS {
                    translated = translated.replace(token, word);
                }
                translated.replace(DETAIL_PREFIX, "")
            }
            TargetEntry::Modifier {
                name, strip_prefix, ..
            } => {
                if *strip_prefix {
                    name.replace(DETAIL_PREFIX, "")
                } else {
                    name.clone()
                }
            }
            TargetEntry::Range { name, .. } => name.clone(),
        }
    }

    /// Working `(id, name)` pair the mapping pipeline starts from
    pub fn resolution_key(&self) -> (Option<i64>, String) {
        (self.id(), self.source_name())
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            TargetEntry::Type { .. } => "type",
            TargetEntry::Modifier { .. } => "modifier",
            TargetEntry::Range { .. } => "range",
        }
    }
}

impl fmt::Display for TargetEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{} - {}", self.name(), id),
            None => write!(f, "{} - -1", self.name()),
        }
    }
}

/// Parse one enumeration line: `name = id[,]`
///
/// Returns `None` for malformed lines.
fn parse_enum_line(line: &str) -> Option<(String, i64)> {
    let (name, id) = line.split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let id = id.trim().trim_end_matches(',').trim();
    let id = id.parse::<i64>().ok()?;
    Some((name.to_string(), id))
}

/// Parse an enumeration file into `id → name`
///
/// `//` lines and blank lines are skipped; malformed lines are logged and
/// skipped. A later line with the same id replaces the earlier one.
pub fn parse_enum_file(path: &Path, log: &mut DiagnosticLog) -> Result<BTreeMap<i64, String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_enum_text(&content, &path.display().to_string(), log))
}

/// Parse enumeration text; `source` names the origin in diagnostics
pub fn parse_enum_text(content: &str, source: &str, log: &mut DiagnosticLog) -> BTreeMap<i64, String> {
    let mut lookup = BTreeMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let line = match line.find("//") {
            Some(comment) => line[..comment].trim(),
            None => line,
        };
        match parse_enum_line(line) {
            Some((name, id)) => {
                lookup.insert(id, name);
            }
            None => log.record(
                DiagnosticKind::MalformedEnumLine,
                source.to_string(),
                format!("Invalid line: {}", line),
            ),
        }
    }
    lookup
}

/// Type and modifier tables of the target taxonomy
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    types: BTreeMap<i64, String>,
    modifiers: BTreeMap<i64, String>,
    strip_modifier_prefix: bool,
}

impl TargetRegistry {
    pub fn new(
        types: BTreeMap<i64, String>,
        modifiers: BTreeMap<i64, String>,
        strip_modifier_prefix: bool,
    ) -> Self {
        Self {
            types,
            modifiers,
            strip_modifier_prefix,
        }
    }

    /// Load both enumeration files
    pub fn from_files(
        type_file: &Path,
        modifier_file: &Path,
        strip_modifier_prefix: bool,
        log: &mut DiagnosticLog,
    ) -> Result<Self> {
        let types = parse_enum_file(type_file, log)?;
        let modifiers = parse_enum_file(modifier_file, log)?;
        tracing::info!(
            types = types.len(),
            modifiers = modifiers.len(),
            "Target registry loaded"
        );
        Ok(Self::new(types, modifiers, strip_modifier_prefix))
    }

    /// Merge additional `name → id` type entries after file parsing
    pub fn extend_types<'a>(&mut self, extra: impl IntoIterator<Item = (&'a String, &'a i64)>) {
        for (name, id) in extra {
            self.types.insert(*id, name.clone());
        }
    }

    fn make_type(&self, id: i64, name: &str) -> TargetEntry {
        TargetEntry::Type {
            name: name.to_string(),
            id,
        }
    }

    fn make_modifier(&self, id: i64, name: &str) -> TargetEntry {
        TargetEntry::Modifier {
            name: name.to_string(),
            id,
            strip_prefix: self.strip_modifier_prefix,
        }
    }

    /// Type with this name (case-insensitive)
    pub fn type_for(&self, name: &str) -> Option<TargetEntry> {
        self.types
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(&id, n)| self.make_type(id, n))
    }

    /// Modifier with this name (case-insensitive)
    pub fn modifier_for(&self, name: &str) -> Option<TargetEntry> {
        self.modifiers
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(&id, n)| self.make_modifier(id, n))
    }

    /// Range for an all-digit token
    pub fn range_from_sound(&self, token: &str) -> Option<TargetEntry> {
        TargetEntry::range(token).ok()
    }

    /// Type, then modifier, then numeric range
    pub fn lookup(&self, name: &str) -> Option<TargetEntry> {
        self.type_for(name)
            .or_else(|| self.modifier_for(name))
            .or_else(|| self.range_from_sound(name))
    }

    pub fn type_by_id(&self, id: i64) -> Option<TargetEntry> {
        self.types.get(&id).map(|n| self.make_type(id, n))
    }

    pub fn is_type_id(&self, id: i64) -> bool {
        self.types.contains_key(&id)
    }

    pub fn is_modifier_id(&self, id: i64) -> bool {
        self.modifiers.contains_key(&id)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn modifier_count(&self) -> usize {
        self.modifiers.len()
    }
}
