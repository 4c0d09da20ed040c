//! Base reconciler
//!
//! Finds the notes of the base taxonomy that a child mapping does not
//! cover and turns each into one synthesized association, so nothing the
//! base offers is silently lost. Also applies the optional base fallback
//! for unresolved child associations.

use crate::association::{MappedAssociation, ResolutionSource};
use crate::catalog::{CatalogSet, SourceCatalog, SourceNote};
use crate::popularity::PopularityTable;
use crate::registry::{TargetRegistry, DETAIL_PREFIX};
use crate::rules::ResolutionRules;
use std::borrow::Cow;
use std::collections::HashMap;
use tracing::{debug, info};

pub struct BaseReconciler<'a> {
    registry: &'a TargetRegistry,
    rules: &'a ResolutionRules,
    popularity: Option<&'a PopularityTable>,
}

impl<'a> BaseReconciler<'a> {
    pub fn new(registry: &'a TargetRegistry, rules: &'a ResolutionRules) -> Self {
        Self {
            registry,
            rules,
            popularity: None,
        }
    }

    pub fn with_popularity(mut self, popularity: Option<&'a PopularityTable>) -> Self {
        self.popularity = popularity;
        self
    }

    /// Synthesize one association per base note the child does not cover
    ///
    /// Base notes are visited in `(id, name, category, translation)` order.
    pub fn reconcile<'n>(
        &self,
        child: &[MappedAssociation<'_>],
        base: &'n SourceCatalog,
        child_catalogs: &'n CatalogSet,
    ) -> Vec<MappedAssociation<'n>> {
        let mut base_notes: Vec<&SourceNote> = base.all_notes().iter().collect();
        base_notes.sort_by(|a, b| SourceNote::report_order(a, b));

        let mut out = Vec::new();
        for base_note in base_notes {
            if self.is_covered(base_note, child) {
                continue;
            }

            let note = rehome(base_note, child_catalogs).unwrap_or(base_note);
            let (target_name, source) = match note.id {
                Some(id) if self.registry.is_type_id(id) => (
                    format!("{}{}", DETAIL_PREFIX, note.name),
                    ResolutionSource::UnmappedBaseType,
                ),
                Some(id) if self.registry.is_modifier_id(id) => {
                    (note.name.clone(), ResolutionSource::UnmappedBaseModifier)
                }
                _ => (note.name.clone(), ResolutionSource::UnmappedBaseUntyped),
            };
            debug!(note = %note.name, id = note.id.unwrap_or(-1), tag = %source, "Uncovered base note");

            let package = note.package.clone().unwrap_or_else(|| base.package().to_string());
            let mut assoc = MappedAssociation::new(target_name, package);
            assoc.target = note.id.and_then(|id| self.registry.type_by_id(id));
            assoc.notes = vec![Cow::Borrowed(note)];
            assoc.source = source;
            assoc.attach_popularity(self.popularity);
            out.push(assoc);
        }

        info!(
            base_notes = base.len(),
            uncovered = out.len(),
            "Base reconciliation complete"
        );
        out
    }

    /// Covered by a child note with the same id (or name when the child note
    /// has no id), or excluded by a remap in any package
    pub fn is_covered(&self, base_note: &SourceNote, child: &[MappedAssociation<'_>]) -> bool {
        let mapped = child.iter().flat_map(|a| a.notes.iter()).any(|note| match note.id {
            Some(id) => base_note.id == Some(id),
            None => base_note.name == note.name,
        });
        mapped || base_note.id.is_some_and(|id| self.rules.is_remapped(id))
    }
}

/// The child's own instance of a base note, if it has one
fn rehome<'n>(base_note: &SourceNote, child_catalogs: &'n CatalogSet) -> Option<&'n SourceNote> {
    child_catalogs
        .values()
        .flat_map(|c| c.all_notes().iter())
        .find(|mine| match base_note.id {
            Some(id) => mine.id == Some(id),
            None => mine.name == base_note.name,
        })
}

/// Replace every child association that did not resolve by the base
/// taxonomy's resolved association for the same target name
pub fn apply_base_fallback<'a>(
    child: Vec<MappedAssociation<'a>>,
    base: &[MappedAssociation<'a>],
) -> Vec<MappedAssociation<'a>> {
    let resolved_base: HashMap<&str, &MappedAssociation<'a>> = base
        .iter()
        .filter(|a| a.is_resolved())
        .map(|a| (a.target_name.as_str(), a))
        .collect();

    let mut replaced = 0;
    let out: Vec<MappedAssociation<'a>> = child
        .into_iter()
        .map(|assoc| {
            if assoc.is_resolved() {
                return assoc;
            }
            match resolved_base.get(assoc.target_name.as_str()) {
                Some(base_assoc) => {
                    replaced += 1;
                    let mut fallback = (*base_assoc).clone();
                    fallback.source = ResolutionSource::ResolvedFromBaseFallback;
                    fallback
                }
                None => assoc,
            }
        })
        .collect();

    info!(replaced, "Base fallback applied");
    out
}

/// Reconcile a child mapping against a base catalog
pub fn reconcile_with_base<'n>(
    associations: &[MappedAssociation<'_>],
    base: &'n SourceCatalog,
    child_catalogs: &'n CatalogSet,
    registry: &TargetRegistry,
    rules: &ResolutionRules,
) -> Vec<MappedAssociation<'n>> {
    BaseReconciler::new(registry, rules).reconcile(associations, base, child_catalogs)
}
