//! codriver-mapper library interface
//!
//! Reconciles the pacenote catalogs of rally codriver plugins (source
//! taxonomy) with a flat enumeration of note types (target taxonomy).
//! Pipeline:
//!
//! 1. [`config_tree`] + [`translation`] + [`catalog`]: build one
//!    [`catalog::SourceCatalog`] per package
//! 2. [`registry`]: load the target type and modifier tables
//! 3. [`decomposer`] + [`resolver`]: map every target identifier to source notes
//! 4. [`reconciler`]: account for base notes the mapping does not cover

pub mod association;
pub mod catalog;
pub mod config;
pub mod config_tree;
pub mod csv_text;
pub mod decomposer;
pub mod diagnostics;
pub mod error;
pub mod ini;
pub mod inventory;
pub mod popularity;
pub mod reconciler;
pub mod registry;
pub mod report;
pub mod resolver;
pub mod rules;
pub mod translation;

pub use crate::association::{MappedAssociation, ResolutionSource};
pub use crate::catalog::{build_catalog, CatalogPolicy, CatalogSet, SourceCatalog, SourceNote};
pub use crate::diagnostics::{DiagnosticKind, DiagnosticLog, Severity};
pub use crate::error::{MapperError, Result};
pub use crate::reconciler::{apply_base_fallback, reconcile_with_base, BaseReconciler};
pub use crate::registry::{TargetEntry, TargetRegistry};
pub use crate::resolver::{map_all, MappingResolver};
pub use crate::rules::ResolutionRules;
