//! CSV reports
//!
//! Two listings: the mapping report (one row per target identifier and
//! sound file) and the catalog listing (one row per source note and sound
//! file, with missing and redirected files annotated).

use crate::association::{MappedAssociation, ReportRow};
use crate::catalog::{CatalogSet, SourceNote};
use crate::csv_text::format_row;
use crate::popularity::PopularityTable;
use std::io::{self, Write};

pub const CATALOG_HEADER: [&str; 12] = [
    "style",
    "id",
    "name",
    "type",
    "category",
    "package",
    "ini",
    "sound_count",
    "translation",
    "sound",
    "popularity",
    "error",
];

pub fn write_mapping_header<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", format_row(&ReportRow::HEADER))
}

/// Write the rows of a batch of associations, returning the row count
pub fn write_mapping_rows<W: Write>(out: &mut W, associations: &[MappedAssociation<'_>]) -> io::Result<usize> {
    let mut written = 0;
    for assoc in associations {
        for row in assoc.rows() {
            writeln!(out, "{}", format_row(&row.fields()))?;
            written += 1;
        }
    }
    Ok(written)
}

/// Annotation for one sound file of a note
fn sound_error(note: &SourceNote, file: &str) -> String {
    if note.is_sound_missing(file) {
        "file missing".to_string()
    } else if let Some(from) = note.renamed_from(file) {
        format!("file mapped from {}", from)
    } else {
        String::new()
    }
}

/// Write every note of every catalog, grouped by package (`style`)
pub fn write_catalog_listing<W: Write>(
    out: &mut W,
    catalogs: &CatalogSet,
    popularity: Option<&PopularityTable>,
) -> io::Result<usize> {
    writeln!(out, "{}", format_row(&CATALOG_HEADER))?;
    let mut written = 0;
    for (style, catalog) in catalogs {
        let mut notes: Vec<&SourceNote> = catalog.all_notes().iter().collect();
        notes.sort_by(|a, b| (a.id, &a.name, &a.category).cmp(&(b.id, &b.name, &b.category)));

        for note in notes {
            let score = popularity
                .zip(note.id)
                .and_then(|(t, id)| t.popularity(id))
                .map(|p| p.to_string())
                .unwrap_or_else(|| "-1".to_string());
            for file in &note.sound_files {
                let row = [
                    style.clone(),
                    note.id.unwrap_or(-1).to_string(),
                    note.name.clone(),
                    note.kind.to_string(),
                    note.category.clone().unwrap_or_default(),
                    note.package.clone().unwrap_or_default(),
                    note.origin_file.clone(),
                    note.declared_sounds.to_string(),
                    note.translation.clone(),
                    file.clone(),
                    score.clone(),
                    sound_error(note, file),
                ];
                writeln!(out, "{}", format_row(&row))?;
                written += 1;
            }
        }
    }
    Ok(written)
}
