//! Section/option reader for the pacenote ini dialect
//!
//! - A leading UTF-8 byte-order marker is stripped
//! - `;` and `#` start comment lines
//! - Options are `key = value` or `key: value`, split at the first delimiter
//! - Option names are lower-cased, section names are kept verbatim
//! - A repeated section is merged into the first one (later options win)
//! - Lines outside any section and lines without a delimiter are ignored

use std::path::Path;

const BOM: char = '\u{feff}';

/// One `[SECTION]` with its options in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    pub name: String,
    options: Vec<(String, String)>,
}

impl IniSection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: Vec::new(),
        }
    }

    fn set(&mut self, key: String, value: String) {
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.options.push((key, value)),
        }
    }

    /// Value of an option (name is matched case-insensitively)
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_lowercase();
        self.options
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All options in declaration order
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Options whose (lower-cased) name starts with `prefix`
    pub fn options_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.options().filter(move |(k, _)| k.starts_with(prefix))
    }

    /// `[TYPE::name]` split into its two halves
    pub fn split_name(&self) -> Option<(&str, &str)> {
        self.name.split_once("::")
    }
}

/// A parsed ini file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
}

impl IniDocument {
    /// Parse ini text
    pub fn parse(text: &str) -> Self {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut doc = IniDocument::default();
        let mut current: Option<usize> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let name = line[1..line.len() - 1].trim();
                current = Some(doc.section_index_or_insert(name));
                continue;
            }

            let Some(index) = current else {
                continue;
            };

            let Some(split) = line.find(['=', ':']) else {
                continue;
            };
            let key = line[..split].trim().to_lowercase();
            let value = line[split + 1..].trim().to_string();
            if key.is_empty() {
                continue;
            }
            doc.sections[index].set(key, value);
        }

        doc
    }

    /// Read and parse a file; invalid UTF-8 is replaced rather than rejected
    pub fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    fn section_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            return index;
        }
        self.sections.push(IniSection::new(name));
        self.sections.len() - 1
    }

    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
