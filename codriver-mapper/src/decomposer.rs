//! Sound-key decomposer
//!
//! Turns a raw target identifier (a target sound directory name such as
//! `cmp_into_number_3_right` or `detail_over_crest_descriptive`) into the
//! lookup key, source package and flags the resolver works with.
//! Stages run in a fixed order:
//!
//! 1. static override (short-circuits everything else)
//! 2. `cmp_` then `into_` (compound prefix)
//! 3. `number_`
//! 4. `_rushed`
//! 5. rename table
//! 6. `_descriptive` / `_reversed` package suffix

use crate::rules::{ResolutionRules, StaticOverride};

pub const NUMERIC_PACKAGE: &str = "numeric";
pub const DESCRIPTIVE_PACKAGE: &str = "descriptive";
pub const REVERSED_PACKAGE: &str = "reversed";

const COMPOUND_PREFIX: &str = "cmp_";
const INTO_PREFIX: &str = "into_";
const NUMBER_PREFIX: &str = "number_";
const RUSHED_SUFFIX: &str = "_rushed";
const DESCRIPTIVE_SUFFIX: &str = "_descriptive";
const REVERSED_SUFFIX: &str = "_reversed";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecomposeFlags {
    /// Resolved association carries the `detail_into` note as prefix
    pub compound_prefix: bool,
    pub rushed: bool,
    /// Static override: `lookup_key` is a sound file name
    pub direct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub lookup_key: String,
    pub package: String,
    pub flags: DecomposeFlags,
    pub direct: Option<StaticOverride>,
}

pub struct SoundKeyDecomposer<'a> {
    rules: &'a ResolutionRules,
}

impl<'a> SoundKeyDecomposer<'a> {
    pub fn new(rules: &'a ResolutionRules) -> Self {
        Self { rules }
    }

    pub fn decompose(&self, raw: &str) -> Decomposition {
        let mut flags = DecomposeFlags::default();

        if let Some(entry) = self.rules.static_override(raw) {
            flags.direct = true;
            flags.rushed = raw.ends_with(RUSHED_SUFFIX);
            return Decomposition {
                lookup_key: entry.file.clone(),
                package: entry.package.clone(),
                flags,
                direct: Some(entry.clone()),
            };
        }

        let mut key = raw;
        if let Some(rest) = raw.strip_prefix(COMPOUND_PREFIX) {
            key = rest;
            // only compound identifiers carry the into prefix
            if let Some(rest) = key.strip_prefix(INTO_PREFIX) {
                key = rest;
                flags.compound_prefix = true;
            }
        }

        key = key.strip_prefix(NUMBER_PREFIX).unwrap_or(key);

        if let Some(rest) = key.strip_suffix(RUSHED_SUFFIX) {
            key = rest;
            flags.rushed = true;
        }

        let key = self.rules.rename(key).unwrap_or(key);

        let (key, package) = if let Some(rest) = key.strip_suffix(DESCRIPTIVE_SUFFIX) {
            (rest, DESCRIPTIVE_PACKAGE)
        } else if let Some(rest) = key.strip_suffix(REVERSED_SUFFIX) {
            (rest, REVERSED_PACKAGE)
        } else {
            (key, NUMERIC_PACKAGE)
        };

        Decomposition {
            lookup_key: key.to_string(),
            package: package.to_string(),
            flags,
            direct: None,
        }
    }
}

/// Decompose with the given rules
pub fn decompose(raw: &str, rules: &ResolutionRules) -> Decomposition {
    SoundKeyDecomposer::new(rules).decompose(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_compound_number_key() {
        let rules = ResolutionRules::new();
        let d = decompose("cmp_into_number_3_right", &rules);
        assert_eq!(d.lookup_key, "3_right");
        assert_eq!(d.package, NUMERIC_PACKAGE);
        assert!(d.flags.compound_prefix);
        assert!(!d.flags.rushed);
        assert!(!d.flags.direct);
    }

    #[test]
    fn test_plain_key_is_unchanged() {
        let d = decompose("corner_1_left", &ResolutionRules::new());
        assert_eq!(d.lookup_key, "corner_1_left");
        assert_eq!(d.package, NUMERIC_PACKAGE);
        assert_eq!(d.flags, DecomposeFlags::default());
    }

    #[test]
    fn test_rushed_and_package_suffixes() {
        let rules = ResolutionRules::new();
        let d = decompose("detail_over_crest_descriptive_rushed", &rules);
        assert_eq!(d.lookup_key, "detail_over_crest");
        assert_eq!(d.package, DESCRIPTIVE_PACKAGE);
        assert!(d.flags.rushed);

        let d = decompose("corner_2_left_reversed", &rules);
        assert_eq!(d.lookup_key, "corner_2_left");
        assert_eq!(d.package, REVERSED_PACKAGE);
    }

    #[test]
    fn test_into_without_compound_prefix_is_kept() {
        let d = decompose("into_3_right", &ResolutionRules::new());
        assert_eq!(d.lookup_key, "into_3_right");
        assert_eq!(d.package, NUMERIC_PACKAGE);
        assert_eq!(d.flags, DecomposeFlags::default());

        let d = decompose("cmp_number_3_right", &ResolutionRules::new());
        assert_eq!(d.lookup_key, "3_right");
        assert!(!d.flags.compound_prefix);
    }

    #[test]
    fn test_rename_runs_before_suffix_check() {
        let mut renames = BTreeMap::new();
        renames.insert("detail_keep_in".to_string(), "detail_keep_in_descriptive".to_string());
        let rules = ResolutionRules::new().with_sound_renames(renames);

        let d = decompose("detail_keep_in", &rules);
        assert_eq!(d.lookup_key, "detail_keep_in");
        assert_eq!(d.package, DESCRIPTIVE_PACKAGE);
    }

    #[test]
    fn test_static_override_short_circuits() {
        let rules = ResolutionRules::new().with_static_override(
            "cmp_into_go_rushed",
            StaticOverride {
                package: "descriptive".to_string(),
                file: "go.ogg".to_string(),
                prefix_file: None,
                id: Some(4),
            },
        );

        let d = decompose("cmp_into_go_rushed", &rules);
        assert_eq!(d.lookup_key, "go.ogg");
        assert_eq!(d.package, "descriptive");
        assert!(d.flags.direct);
        assert!(d.flags.rushed);
        assert!(!d.flags.compound_prefix);
        assert_eq!(d.direct.and_then(|s| s.id), Some(4));
    }

    #[test]
    fn test_decomposition_is_idempotent() {
        let rules = ResolutionRules::new();
        for raw in [
            "cmp_into_number_3_right",
            "number_100",
            "detail_bridge_rushed",
            "corner_4_right_descriptive",
            "into_number_1_left_reversed",
            "detail_into",
        ] {
            let once = decompose(raw, &rules);
            let twice = decompose(&once.lookup_key, &rules);
            assert_eq!(twice.lookup_key, once.lookup_key, "over-stripped {}", raw);
            assert_eq!(twice.flags, DecomposeFlags::default(), "{}", raw);
        }
    }
}
