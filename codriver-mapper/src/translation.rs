//! Translation resolver
//!
//! Looks up the display text of a note in the localized string tables below
//! `language/<lang>/`. Search order, first hit wins:
//! 1. `pacenotes/packages/<category>/<origin file>`
//! 2. `pacenotes/packages/<category>/strings.ini`
//! 3. `pacenotes/packages/strings.ini`
//! 4. `pacenotes/strings.ini`
//!
//! Every file is optional. Only the `[STRINGS]` section is read.

use crate::ini::IniDocument;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Section holding english key → translated text
const STRINGS_SECTION: &str = "STRINGS";

type StringTable = HashMap<String, String>;

/// Resolves note names to display text, caching each table it reads
#[derive(Debug)]
pub struct TranslationResolver {
    language_dir: PathBuf,
    tables: HashMap<PathBuf, Option<StringTable>>,
}

impl TranslationResolver {
    /// `language_dir` is the `language/<lang>` directory of a plugin
    pub fn new(language_dir: impl Into<PathBuf>) -> Self {
        Self {
            language_dir: language_dir.into(),
            tables: HashMap::new(),
        }
    }

    /// Candidate string tables in search order
    fn candidates(&self, category: Option<&str>, origin_file: &str) -> Vec<PathBuf> {
        let packages = self.language_dir.join("pacenotes").join("packages");
        let mut files = Vec::with_capacity(4);
        if let Some(category) = category {
            let category_dir = packages.join(category.to_lowercase());
            if !origin_file.is_empty() {
                files.push(category_dir.join(origin_file));
            }
            files.push(category_dir.join("strings.ini"));
        }
        files.push(packages.join("strings.ini"));
        files.push(self.language_dir.join("pacenotes").join("strings.ini"));
        files
    }

    /// Translation from the string tables only
    pub fn lookup(&mut self, name: &str, category: Option<&str>, origin_file: &str) -> Option<String> {
        let key = name.to_lowercase();
        for file in self.candidates(category, origin_file) {
            if let Some(text) = self.table(&file).and_then(|t| t.get(&key)) {
                return Some(text.clone());
            }
        }
        None
    }

    /// Translation with numeric fallback
    ///
    /// Returns `None` when a non-numeric name has no entry in any table; the
    /// caller records that as a missing translation.
    pub fn resolve(&mut self, name: &str, category: Option<&str>, origin_file: &str) -> Option<String> {
        if let Some(text) = self.lookup(name, category, origin_file) {
            return Some(text);
        }
        if is_numeric(name) {
            return Some(name.to_string());
        }
        None
    }

    fn table(&mut self, file: &Path) -> Option<&StringTable> {
        if !self.tables.contains_key(file) {
            let table = load_strings(file);
            self.tables.insert(file.to_path_buf(), table);
        }
        self.tables.get(file).and_then(Option::as_ref)
    }
}

fn load_strings(file: &Path) -> Option<StringTable> {
    if !file.is_file() {
        return None;
    }
    let doc = match IniDocument::read(file) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(file = %file.display(), error = %e, "Cannot read string table");
            return None;
        }
    };

    let section = doc.section(STRINGS_SECTION)?;
    let table = section
        .options()
        .filter(|(_, text)| !text.is_empty())
        .map(|(english, text)| (english.to_string(), text.to_string()))
        .collect();
    Some(table)
}

/// True for non-empty all-digit strings
pub fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_origin_file_table_wins() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pacenotes/packages/corners/cat1.ini", "[STRINGS]\none_left = from cat1\n");
        write(temp.path(), "pacenotes/packages/corners/strings.ini", "[STRINGS]\none_left = from category\n");
        write(temp.path(), "pacenotes/strings.ini", "[STRINGS]\none_left = from top\n");

        let mut resolver = TranslationResolver::new(temp.path());
        assert_eq!(
            resolver.resolve("ONE_LEFT", Some("Corners"), "cat1.ini").as_deref(),
            Some("from cat1")
        );
        assert_eq!(
            resolver.resolve("one_left", Some("Corners"), "other.ini").as_deref(),
            Some("from category")
        );
        assert_eq!(
            resolver.resolve("one_left", None, "cat1.ini").as_deref(),
            Some("from top")
        );
    }

    #[test]
    fn test_packages_level_before_top_level() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pacenotes/packages/strings.ini", "[STRINGS]\njump = packages\n");
        write(temp.path(), "pacenotes/strings.ini", "[STRINGS]\njump = top\n");

        let mut resolver = TranslationResolver::new(temp.path());
        assert_eq!(resolver.resolve("jump", Some("Misc"), "x.ini").as_deref(), Some("packages"));
    }

    #[test]
    fn test_bom_prefixed_table_parses() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "pacenotes/strings.ini", "\u{feff}[STRINGS]\ncaution = Achtung\n");

        let mut resolver = TranslationResolver::new(temp.path());
        assert_eq!(resolver.resolve("caution", None, "").as_deref(), Some("Achtung"));
    }

    #[test]
    fn test_numeric_fallback_and_missing() {
        let temp = TempDir::new().unwrap();
        let mut resolver = TranslationResolver::new(temp.path());
        assert_eq!(resolver.resolve("150", None, "").as_deref(), Some("150"));
        assert_eq!(resolver.resolve("unknown_note", None, ""), None);
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("100"));
        assert!(!is_numeric(""));
        assert!(!is_numeric("1a"));
        assert!(!is_numeric("-1"));
    }
}
