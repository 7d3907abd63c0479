use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ItemField, RequirementItem};

/// File name used when a region has no usable name
const FALLBACK_EXPORT_NAME: &str = "export";

/// A CSV document ready to be written to disk or offered as a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

impl CsvExport {
    /// UTF-8 bytes of the document
    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }

    /// Writes the document into `dir` and returns the full path
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create export directory: {:?}", dir))?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.as_bytes())
            .with_context(|| format!("Failed to write CSV export: {:?}", path))?;
        log::info!("Exported CSV: {}", path.display());
        Ok(path)
    }
}

/// Quotes a CSV field, doubling any embedded quotes
pub fn csv_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Flattens a value so it stays inside one spreadsheet cell when pasted
pub fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ").trim().to_string()
}

fn header_row(separator: &str) -> String {
    ItemField::COLUMNS
        .iter()
        .map(|c| c.header())
        .collect::<Vec<_>>()
        .join(separator)
}

fn row(item: &RequirementItem, separator: &str, cell: fn(&str) -> String) -> String {
    ItemField::COLUMNS
        .iter()
        .map(|c| cell(item.field(*c)))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Renders items as CSV, or `None` when there is nothing to export
pub fn to_csv<'a, I>(items: I) -> Option<String>
where
    I: IntoIterator<Item = &'a RequirementItem>,
{
    let rows: Vec<String> = items.into_iter().map(|i| row(i, ",", csv_field)).collect();
    if rows.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header_row(","));
    lines.extend(rows);
    Some(lines.join("\n"))
}

/// Renders items as tab-separated text for pasting into spreadsheets and
/// prototyping tools, or `None` when there is nothing to copy
pub fn to_tsv<'a, I>(items: I) -> Option<String>
where
    I: IntoIterator<Item = &'a RequirementItem>,
{
    let rows: Vec<String> = items.into_iter().map(|i| row(i, "\t", tsv_field)).collect();
    if rows.is_empty() {
        return None;
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header_row("\t"));
    lines.extend(rows);
    Some(lines.join("\n"))
}

/// Download file name for a region's CSV
pub fn csv_file_name(region: &str) -> String {
    let base: String = region
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if base.is_empty() {
        format!("{}_requirements.csv", FALLBACK_EXPORT_NAME)
    } else {
        format!("{}_requirements.csv", base)
    }
}

/// Builds the CSV download for one region
pub fn export_region_csv<'a, I>(region: &str, items: I) -> Option<CsvExport>
where
    I: IntoIterator<Item = &'a RequirementItem>,
{
    to_csv(items).map(|content| CsvExport {
        file_name: csv_file_name(region),
        content,
    })
}
