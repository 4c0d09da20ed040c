//! Mapping resolver
//!
//! Resolves a decomposed target identifier to source notes in four stages:
//! registry lookup, explicit override, package-scoped id remap, and finally
//! catalog lookup by id then by name.

use crate::association::MappedAssociation;
use crate::catalog::{CatalogSet, SourceNote};
use crate::decomposer::{SoundKeyDecomposer, NUMERIC_PACKAGE};
use crate::diagnostics::{DiagnosticKind, DiagnosticLog};
use crate::error::{MapperError, Result};
use crate::popularity::PopularityTable;
use crate::registry::{TargetEntry, TargetRegistry};
use crate::rules::{RemapTarget, ResolutionRules, StaticOverride};
use std::borrow::Cow;
use tracing::debug;

/// Target identifier every compound association is prefixed with
pub const INTO_PREFIX_NOTE: &str = "detail_into";

/// Working pair after the override and remap stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupPlan {
    pub id: Option<i64>,
    pub name: String,
    pub package: String,
}

/// Result of resolving one lookup key
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub plan: LookupPlan,
    pub notes: Vec<&'a SourceNote>,
    /// False when `plan.package` has no catalog
    pub package_known: bool,
}

pub struct MappingResolver<'a> {
    registry: &'a TargetRegistry,
    catalogs: &'a CatalogSet,
    rules: &'a ResolutionRules,
}

impl<'a> MappingResolver<'a> {
    pub fn new(registry: &'a TargetRegistry, catalogs: &'a CatalogSet, rules: &'a ResolutionRules) -> Self {
        Self {
            registry,
            catalogs,
            rules,
        }
    }

    /// Run the override and remap stages for a target entry
    ///
    /// Overrides match on the target id, the target name or the translated
    /// working name.
    pub fn plan(&self, entry: &TargetEntry, package: &str) -> LookupPlan {
        let (id, name) = entry.resolution_key();
        let mut plan = LookupPlan {
            id,
            name,
            package: package.to_string(),
        };

        let found = self
            .rules
            .find_override(plan.id, entry.name())
            .or_else(|| self.rules.find_override(plan.id, &plan.name));
        if let Some(o) = found {
            debug!(name = %plan.name, ?o, "Applying note override");
            match (o.source_id, o.source_name.as_deref()) {
                (Some(source_id), Some(source_name)) => {
                    plan.id = Some(source_id);
                    plan.name = source_name.to_string();
                }
                (Some(source_id), None) => plan.id = Some(source_id),
                (None, Some(source_name)) => match self.registry.lookup(source_name) {
                    // a target identifier: resolve as if it had been requested
                    Some(entry) => {
                        let (id, name) = entry.resolution_key();
                        plan.id = id;
                        plan.name = name;
                    }
                    None => {
                        plan.id = None;
                        plan.name = source_name.to_string();
                    }
                },
                (None, None) => {}
            }
        }

        if let Some(from_id) = plan.id {
            if let Some(target) = self.rules.remap_for(&plan.package, from_id) {
                debug!(package = %plan.package, from_id, ?target, "Applying id remap");
                match target {
                    RemapTarget::ToId(id) => plan.id = Some(*id),
                    RemapTarget::ToPackageId { package, id } => {
                        plan.package = package.clone();
                        plan.id = Some(*id);
                    }
                    RemapTarget::ToName { package, name } => {
                        if let Some(package) = package {
                            plan.package = package.clone();
                        }
                        plan.id = None;
                        plan.name = name.clone();
                    }
                }
            }
        }

        plan
    }

    /// Catalog lookup: by id first, then by name
    pub fn lookup(&self, plan: LookupPlan) -> Resolution<'a> {
        let Some(catalog) = self.catalogs.get(&plan.package) else {
            return Resolution {
                plan,
                notes: Vec::new(),
                package_known: false,
            };
        };

        let mut notes = match plan.id {
            Some(id) if id >= 0 => catalog.by_id(id),
            _ => Vec::new(),
        };
        if notes.is_empty() && !plan.name.is_empty() {
            notes = catalog.by_name(&plan.name);
        }

        Resolution {
            plan,
            notes,
            package_known: true,
        }
    }

    /// Resolve a lookup key in a package
    ///
    /// Returns `None` when the key is neither a known type nor modifier nor
    /// a numeric range.
    pub fn resolve(&self, lookup_key: &str, package: &str) -> Option<Resolution<'a>> {
        let entry = self.registry.lookup(lookup_key)?;
        Some(self.lookup(self.plan(&entry, package)))
    }
}

/// Resolve every target identifier
///
/// Identifiers are processed in sorted order; `skip_notes` entries are
/// dropped. Fatal errors: a static entry naming a package without catalog,
/// or a compound prefix that does not resolve to exactly one note.
pub fn map_all<'a>(
    registry: &'a TargetRegistry,
    catalogs: &'a CatalogSet,
    rules: &'a ResolutionRules,
    identifiers: &[String],
    popularity: Option<&PopularityTable>,
    log: &mut DiagnosticLog,
) -> Result<Vec<MappedAssociation<'a>>> {
    let resolver = MappingResolver::new(registry, catalogs, rules);
    let decomposer = SoundKeyDecomposer::new(rules);
    let mut prefix_note: Option<&'a SourceNote> = None;

    let mut sorted: Vec<&String> = identifiers.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut out = Vec::with_capacity(sorted.len());
    for raw in sorted {
        if rules.skips(raw) {
            debug!(identifier = %raw, "Skipping note");
            continue;
        }

        let d = decomposer.decompose(raw);

        if let Some(direct) = &d.direct {
            let mut assoc = direct_association(raw, direct, catalogs)?;
            assoc.rushed = d.flags.rushed;
            assoc.attach_popularity(popularity);
            out.push(assoc);
            continue;
        }

        let prefix = if d.flags.compound_prefix {
            let note = match prefix_note {
                Some(note) => note,
                None => {
                    let note = resolve_prefix(&resolver)?;
                    prefix_note = Some(note);
                    note
                }
            };
            Some(Cow::Borrowed(note))
        } else {
            None
        };

        let mut assoc = MappedAssociation::new(raw.as_str(), d.package.as_str());
        assoc.rushed = d.flags.rushed;
        assoc.prefix = prefix;

        let Some(entry) = registry.lookup(&d.lookup_key) else {
            log.record(
                DiagnosticKind::UnresolvedMapping,
                raw.clone(),
                format!("Unknown pacenote type: {}", d.lookup_key),
            );
            out.push(assoc);
            continue;
        };

        let resolution = resolver.lookup(resolver.plan(&entry, &d.package));
        if !resolution.package_known {
            log.record(
                DiagnosticKind::UnresolvedMapping,
                raw.clone(),
                format!("No catalog for package '{}'", resolution.plan.package),
            );
        } else if resolution.notes.is_empty() {
            log.record(
                DiagnosticKind::UnresolvedMapping,
                raw.clone(),
                format!(
                    "No source note for id {} / name '{}' in package '{}'",
                    resolution.plan.id.unwrap_or(-1),
                    resolution.plan.name,
                    resolution.plan.package
                ),
            );
        } else if resolution.notes.len() > 1 {
            debug!(identifier = %raw, notes = resolution.notes.len(), "Multiple source notes");
        }

        assoc.package = resolution.plan.package.clone();
        assoc.target = Some(entry);
        assoc = assoc.with_notes(resolution.notes.into_iter().map(Cow::Borrowed).collect());
        assoc.attach_popularity(popularity);
        out.push(assoc);
    }

    let resolved = out.iter().filter(|a| a.is_resolved()).count();
    tracing::info!(
        targets = out.len(),
        resolved,
        unresolved = out.len() - resolved,
        "Mapping complete"
    );
    Ok(out)
}

fn resolve_prefix<'a>(resolver: &MappingResolver<'a>) -> Result<&'a SourceNote> {
    let notes = resolver
        .resolve(INTO_PREFIX_NOTE, NUMERIC_PACKAGE)
        .map(|r| r.notes)
        .unwrap_or_default();
    match notes.as_slice() {
        [note] => Ok(*note),
        _ => Err(MapperError::PrefixUnresolved {
            identifier: INTO_PREFIX_NOTE.to_string(),
            found: notes.len(),
        }),
    }
}

fn direct_association<'a>(
    raw: &str,
    direct: &StaticOverride,
    catalogs: &CatalogSet,
) -> Result<MappedAssociation<'a>> {
    let catalog = catalogs
        .get(&direct.package)
        .ok_or_else(|| MapperError::UnknownPackage(direct.package.clone()))?;
    let sounds_dir = catalog.sounds_dir();

    let make = |file: &str| {
        let mut note = SourceNote::direct_file(file, &direct.package, sounds_dir, direct.id);
        if !note.sound_path(file).is_file() {
            note.sounds_not_found.insert(file.to_string());
        }
        note
    };

    let mut assoc = MappedAssociation::new(raw, direct.package.as_str()).with_notes(vec![Cow::Owned(make(&direct.file))]);
    assoc.prefix = direct.prefix_file.as_deref().map(|f| Cow::Owned(make(f)));
    Ok(assoc)
}
