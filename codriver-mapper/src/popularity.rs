//! Pacenote popularity from per-stage statistics
//!
//! The statistics file has one row per stage; every column whose header is
//! an integer counts how often the note with that id is called on the
//! stage. Popularity is the share of stages using the note at least once,
//! rounded to two decimals.

use crate::csv_text::parse_line;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopularityTable {
    stages: usize,
    /// id → stages with a non-zero count
    seen: BTreeMap<i64, usize>,
    /// id → total count over all stages
    counts: BTreeMap<i64, u64>,
}

impl PopularityTable {
    pub fn from_csv(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let table = Self::from_csv_text(&content);
        tracing::info!(
            file = %path.display(),
            stages = table.stages,
            notes = table.seen.len(),
            "Pacenote statistics loaded"
        );
        Ok(table)
    }

    pub fn from_csv_text(content: &str) -> Self {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let Some(header) = lines.next() else {
            return Self::default();
        };

        let columns: Vec<Option<i64>> = parse_line(header.trim_start_matches('\u{feff}'))
            .iter()
            .map(|h| h.trim().parse::<i64>().ok())
            .collect();

        let mut table = Self::default();
        for line in lines {
            table.stages += 1;
            for (column, cell) in columns.iter().zip(parse_line(line)) {
                let Some(id) = column else { continue };
                let count = cell.trim().parse::<u64>().unwrap_or(0);
                *table.counts.entry(*id).or_default() += count;
                let seen = table.seen.entry(*id).or_default();
                if count > 0 {
                    *seen += 1;
                }
            }
        }
        table
    }

    pub fn popularity(&self, id: i64) -> Option<f64> {
        if self.stages == 0 {
            return None;
        }
        let seen = *self.seen.get(&id)?;
        let share = seen as f64 / self.stages as f64;
        Some((share * 100.0).round() / 100.0)
    }

    pub fn total_count(&self, id: i64) -> Option<u64> {
        self.counts.get(&id).copied()
    }

    pub fn stage_count(&self) -> usize {
        self.stages
    }
}
