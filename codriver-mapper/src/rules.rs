//! Resolution rules
//!
//! Every behavior switch of the mapping pipeline lives in one
//! [`ResolutionRules`] value handed to the resolver. Loosely typed config
//! tables (remaps, static entries) are checked when the rules are built;
//! an entry of the wrong shape is a fatal [`MapperError::InvalidMappingConfig`].

use crate::error::{MapperError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Explicit target → source override
///
/// Matches on the target id or the target name of the working pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoteOverride {
    #[serde(default, alias = "cc_id")]
    pub target_id: Option<i64>,
    #[serde(default, alias = "cc_name")]
    pub target_name: Option<String>,
    #[serde(default, alias = "rbr_id")]
    pub source_id: Option<i64>,
    #[serde(default, alias = "rbr_name")]
    pub source_name: Option<String>,
}

impl NoteOverride {
    pub fn matches(&self, id: Option<i64>, name: &str) -> bool {
        let id_match = matches!((self.target_id, id), (Some(a), Some(b)) if a == b);
        let name_match = self.target_name.as_deref() == Some(name);
        id_match || name_match
    }
}

/// Where a package-scoped id remap sends a source id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapTarget {
    /// Another id in the same package
    ToId(i64),
    /// An id in another package
    ToPackageId { package: String, id: i64 },
    /// A name lookup (id cleared), optionally in another package
    ToName { package: Option<String>, name: String },
}

impl RemapTarget {
    /// Accepts `id`, `"name"`, `["package", id]` or `["package", "name"]`
    pub fn from_value(identifier: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(RemapTarget::ToId)
                .ok_or_else(|| MapperError::mapping_config(identifier, format!("non-integer id {}", n))),
            Value::String(name) => Ok(RemapTarget::ToName {
                package: None,
                name: name.clone(),
            }),
            Value::Array(items) => match items.as_slice() {
                [Value::String(package), Value::Number(n)] => {
                    let id = n.as_i64().ok_or_else(|| {
                        MapperError::mapping_config(identifier, format!("non-integer id {}", n))
                    })?;
                    Ok(RemapTarget::ToPackageId {
                        package: package.clone(),
                        id,
                    })
                }
                [Value::String(package), Value::String(name)] => Ok(RemapTarget::ToName {
                    package: Some(package.clone()),
                    name: name.clone(),
                }),
                _ => Err(MapperError::mapping_config(
                    identifier,
                    format!("expected [package, id] or [package, name], got {}", value),
                )),
            },
            other => Err(MapperError::mapping_config(
                identifier,
                format!("unsupported remap target {}", other),
            )),
        }
    }
}

/// A target identifier mapped straight to a sound file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticOverride {
    pub package: String,
    pub file: String,
    /// Played before `file`
    pub prefix_file: Option<String>,
    pub id: Option<i64>,
}

impl StaticOverride {
    /// Accepts `[package, file]`, `[package, file, id]` and the same with
    /// `file` given as `[prefix_file, file]`
    pub fn from_values(identifier: &str, values: &[Value]) -> Result<Self> {
        let (package, file, id) = match values {
            [package, file] => (package, file, None),
            [package, file, id] => (package, file, Some(id)),
            _ => {
                return Err(MapperError::mapping_config(
                    identifier,
                    format!("expected 2 or 3 elements, got {}", values.len()),
                ))
            }
        };

        let package = package
            .as_str()
            .ok_or_else(|| MapperError::mapping_config(identifier, "package must be a string"))?
            .to_string();

        let (prefix_file, file) = match file {
            Value::String(file) => (None, file.clone()),
            Value::Array(pair) => match pair.as_slice() {
                [Value::String(prefix), Value::String(file)] => (Some(prefix.clone()), file.clone()),
                _ => {
                    return Err(MapperError::mapping_config(
                        identifier,
                        "file list must be [prefix_file, file]",
                    ))
                }
            },
            _ => {
                return Err(MapperError::mapping_config(
                    identifier,
                    "file must be a string or [prefix_file, file]",
                ))
            }
        };

        let id = match id {
            None => None,
            Some(value) => Some(value.as_i64().ok_or_else(|| {
                MapperError::mapping_config(identifier, format!("non-integer id {}", value))
            })?),
        };

        Ok(Self {
            package,
            file,
            prefix_file,
            id,
        })
    }
}

/// All switches of one mapping run
#[derive(Debug, Clone, Default)]
pub struct ResolutionRules {
    overrides: Vec<NoteOverride>,
    static_overrides: BTreeMap<String, StaticOverride>,
    sound_renames: BTreeMap<String, String>,
    remaps: BTreeMap<String, BTreeMap<i64, RemapTarget>>,
    skip_notes: BTreeSet<String>,
    fallback_to_base: bool,
}

impl ResolutionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: Vec<NoteOverride>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_sound_renames(mut self, renames: BTreeMap<String, String>) -> Self {
        self.sound_renames = renames;
        self
    }

    pub fn with_skip_notes(mut self, skip: impl IntoIterator<Item = String>) -> Self {
        self.skip_notes = skip.into_iter().collect();
        self
    }

    pub fn with_fallback_to_base(mut self, fallback: bool) -> Self {
        self.fallback_to_base = fallback;
        self
    }

    pub fn with_static_override(mut self, identifier: impl Into<String>, entry: StaticOverride) -> Self {
        self.static_overrides.insert(identifier.into(), entry);
        self
    }

    /// Add the static table as read from config
    pub fn with_static_table(mut self, table: &BTreeMap<String, Vec<Value>>) -> Result<Self> {
        for (identifier, values) in table {
            let entry = StaticOverride::from_values(identifier, values)?;
            self.static_overrides.insert(identifier.clone(), entry);
        }
        Ok(self)
    }

    pub fn with_remap(mut self, package: impl Into<String>, from_id: i64, target: RemapTarget) -> Self {
        self.remaps.entry(package.into()).or_default().insert(from_id, target);
        self
    }

    /// Add one package's remap table as read from config
    ///
    /// Config keys are strings; non-numeric keys are skipped.
    pub fn with_remap_table(mut self, package: &str, table: &BTreeMap<String, Value>) -> Result<Self> {
        let remaps = self.remaps.entry(package.to_string()).or_default();
        for (from, value) in table {
            let Ok(from_id) = from.trim().parse::<i64>() else {
                tracing::warn!(package, key = %from, "Ignoring non-numeric remap key");
                continue;
            };
            let identifier = format!("{}:{}", package, from);
            remaps.insert(from_id, RemapTarget::from_value(&identifier, value)?);
        }
        Ok(self)
    }

    /// First override matching the working pair
    pub fn find_override(&self, id: Option<i64>, name: &str) -> Option<&NoteOverride> {
        self.overrides.iter().find(|o| o.matches(id, name))
    }

    pub fn static_override(&self, identifier: &str) -> Option<&StaticOverride> {
        self.static_overrides.get(identifier)
    }

    pub fn rename(&self, token: &str) -> Option<&str> {
        self.sound_renames.get(token).map(String::as_str)
    }

    pub fn remap_for(&self, package: &str, id: i64) -> Option<&RemapTarget> {
        self.remaps.get(package).and_then(|m| m.get(&id))
    }

    /// True if `id` is the source of a remap in any package
    pub fn is_remapped(&self, id: i64) -> bool {
        self.remaps.values().any(|m| m.contains_key(&id))
    }

    pub fn skips(&self, identifier: &str) -> bool {
        self.skip_notes.contains(identifier)
    }

    pub fn fallback_to_base(&self) -> bool {
        self.fallback_to_base
    }
}
