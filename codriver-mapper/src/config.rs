//! Project configuration
//!
//! One TOML (or JSON) file describes the target taxonomy files, the base
//! codriver and every codriver with its pacenote plugin packages and
//! mapping tables. Relative paths are resolved against the directory of the
//! config file.
//!
//! ```toml
//! target_sounds = "codriver/sounds"
//! type_file = "cc_pacenote_type.txt"
//! modifier_file = "cc_pacenote_modifier.txt"
//! base_codriver = "rbr_base"
//! base_package = "numeric"
//!
//! [[codrivers.janne.packages]]
//! type = "numeric"
//! base_dir = "plugins/Janne"
//! ini_files = ["Rbr.ini"]
//! ```

use crate::catalog::{build_catalog, CatalogPolicy, CatalogSet, SourceCatalog};
use crate::diagnostics::DiagnosticLog;
use crate::error::{MapperError, Result};
use crate::popularity::PopularityTable;
use crate::registry::TargetRegistry;
use crate::rules::{NoteOverride, ResolutionRules};
use codriver_common::config::{load_config, relative_to, LoggingConfig};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Identifiers ignored by the mapping, as a list or as a table of names
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SkipNotes {
    List(Vec<String>),
    Table(BTreeMap<String, Value>),
}

impl Default for SkipNotes {
    fn default() -> Self {
        SkipNotes::List(Vec::new())
    }
}

impl SkipNotes {
    pub fn names(&self) -> BTreeSet<String> {
        match self {
            SkipNotes::List(names) => names.iter().cloned().collect(),
            SkipNotes::Table(table) => table.keys().cloned().collect(),
        }
    }
}

/// One pacenote plugin installation providing a package
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PackageConfig {
    /// Package name: numeric, descriptive, reversed, ...
    #[serde(rename = "type")]
    pub package: String,
    pub base_dir: PathBuf,
    pub ini_files: Vec<String>,
    /// Source id → remap target
    #[serde(default)]
    pub map_rbr_ids: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CodriverConfig {
    pub packages: Vec<PackageConfig>,
    /// Sound file redirection: original → substituted
    #[serde(default)]
    pub map_files: BTreeMap<String, String>,
    /// Target identifier → `[package, file(, id)]`
    #[serde(default)]
    pub map_static: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Target sound tree scanned for identifiers
    #[serde(alias = "cc_sounds")]
    pub target_sounds: PathBuf,

    #[serde(default = "default_type_file")]
    pub type_file: PathBuf,

    #[serde(default = "default_modifier_file")]
    pub modifier_file: PathBuf,

    /// Per-stage note statistics
    #[serde(default)]
    pub pacenote_stats: Option<PathBuf>,

    #[serde(alias = "rbr_base_mod")]
    pub base_codriver: String,

    #[serde(default = "default_base_package")]
    pub base_package: String,

    #[serde(default)]
    pub fallback_to_base: bool,

    #[serde(default = "default_min_declared_sounds")]
    pub min_declared_sounds: usize,

    #[serde(default = "default_true")]
    pub strip_modifier_prefix: bool,

    #[serde(default)]
    pub skip_notes: SkipNotes,

    #[serde(default)]
    pub map_notes: Vec<NoteOverride>,

    /// Target identifier renames applied before the package suffix check
    #[serde(default)]
    pub map_cc_types: BTreeMap<String, String>,

    /// Extra target types: name → id
    #[serde(default)]
    pub additional_cc_types: BTreeMap<String, i64>,

    pub codrivers: BTreeMap<String, CodriverConfig>,
}

fn default_type_file() -> PathBuf {
    PathBuf::from("cc_pacenote_type.txt")
}

fn default_modifier_file() -> PathBuf {
    PathBuf::from("cc_pacenote_modifier.txt")
}

fn default_base_package() -> String {
    "numeric".to_string()
}

fn default_min_declared_sounds() -> usize {
    1
}

fn default_true() -> bool {
    true
}

/// Catalogs and rules of one codriver
#[derive(Debug)]
pub struct Codriver {
    pub name: String,
    pub catalogs: CatalogSet,
    pub rules: ResolutionRules,
    pub diagnostics: DiagnosticLog,
}

impl Codriver {
    pub fn catalog(&self, package: &str) -> Result<&SourceCatalog> {
        self.catalogs
            .get(package)
            .ok_or_else(|| MapperError::UnknownPackage(format!("{}/{}", self.name, package)))
    }
}

impl ProjectConfig {
    /// Load and resolve relative paths against the config file location
    pub fn load(path: &Path) -> Result<Self> {
        let mut config: ProjectConfig = load_config(path)?;
        config.resolve_paths(path);
        info!(
            config = %path.display(),
            codrivers = config.codrivers.len(),
            "Project config loaded"
        );
        Ok(config)
    }

    fn resolve_paths(&mut self, config_path: &Path) {
        self.target_sounds = relative_to(config_path, &self.target_sounds);
        self.type_file = relative_to(config_path, &self.type_file);
        self.modifier_file = relative_to(config_path, &self.modifier_file);
        self.pacenote_stats = self
            .pacenote_stats
            .as_deref()
            .map(|stats| relative_to(config_path, stats));
        for codriver in self.codrivers.values_mut() {
            for package in &mut codriver.packages {
                package.base_dir = relative_to(config_path, &package.base_dir);
            }
        }
    }

    pub fn codriver(&self, name: &str) -> Result<&CodriverConfig> {
        self.codrivers
            .get(name)
            .ok_or_else(|| MapperError::InvalidArgument(format!("Unknown codriver: {}", name)))
    }

    pub fn catalog_policy(&self) -> CatalogPolicy {
        CatalogPolicy {
            min_declared_sounds: self.min_declared_sounds,
            ..CatalogPolicy::default()
        }
    }

    /// Build the resolution rules of one codriver; malformed tables are fatal
    pub fn rules_for(&self, name: &str) -> Result<ResolutionRules> {
        let codriver = self.codriver(name)?;
        let mut rules = ResolutionRules::new()
            .with_overrides(self.map_notes.clone())
            .with_sound_renames(self.map_cc_types.clone())
            .with_skip_notes(self.skip_notes.names())
            .with_fallback_to_base(self.fallback_to_base)
            .with_static_table(&codriver.map_static)?;
        for package in &codriver.packages {
            rules = rules.with_remap_table(&package.package, &package.map_rbr_ids)?;
        }
        Ok(rules)
    }

    /// Target registry with the additional types merged in
    pub fn registry(&self, log: &mut DiagnosticLog) -> Result<TargetRegistry> {
        let mut registry = TargetRegistry::from_files(
            &self.type_file,
            &self.modifier_file,
            self.strip_modifier_prefix,
            log,
        )?;
        registry.extend_types(&self.additional_cc_types);
        Ok(registry)
    }

    pub fn popularity(&self) -> Result<Option<PopularityTable>> {
        self.pacenote_stats
            .as_deref()
            .map(PopularityTable::from_csv)
            .transpose()
    }

    /// Build the catalogs of a codriver, optionally limited to one package
    pub fn build_codriver(&self, name: &str, only_package: Option<&str>) -> Result<Codriver> {
        let codriver_config = self.codriver(name)?;
        let rules = self.rules_for(name)?;
        let mut diagnostics = DiagnosticLog::new();
        let mut catalogs = CatalogSet::new();

        for package in &codriver_config.packages {
            if only_package.is_some_and(|p| p != package.package) {
                continue;
            }
            let (catalog, log) = build_catalog(
                &package.package,
                &package.base_dir,
                &package.ini_files,
                self.catalog_policy(),
                codriver_config.map_files.clone(),
            );
            diagnostics.extend(log);
            catalogs.insert(package.package.clone(), catalog);
        }

        if let Some(package) = only_package {
            if !catalogs.contains_key(package) {
                return Err(MapperError::UnknownPackage(format!("{}/{}", name, package)));
            }
        }

        info!(
            codriver = name,
            packages = catalogs.len(),
            problems = diagnostics.len(),
            "Codriver catalogs built"
        );

        Ok(Codriver {
            name: name.to_string(),
            catalogs,
            rules,
            diagnostics,
        })
    }
}
