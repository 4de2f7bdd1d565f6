use crate::record::{OrderField, OrderRecord};
use crate::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Serialization formats for a record list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Tab-separated values, the spreadsheet export
    Tsv,
    /// Array of objects, keys in field order
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Tsv => "tsv",
            ExportFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Tsv => "text/tab-separated-values",
            ExportFormat::Json => "application/json",
        }
    }

    /// Guess a format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" | "tab" | "xls" => Some(ExportFormat::Tsv),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

pub struct OrderWriter;

impl OrderWriter {
    /// Render records in the given format
    pub fn to_string(records: &[OrderRecord], format: ExportFormat) -> Result<String> {
        let out = match format {
            ExportFormat::Csv => Self::delimited(records, ','),
            ExportFormat::Tsv => Self::delimited(records, '\t'),
            ExportFormat::Json => serde_json::to_string_pretty(records)?,
        };
        Ok(out)
    }

    /// Write records to a file
    pub fn to_file(records: &[OrderRecord], path: &Path, format: ExportFormat) -> Result<()> {
        tracing::debug!("Writing {} records to: {}", records.len(), path.display());

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(Self::to_string(records, format)?.as_bytes())?;
        writer.flush()?;

        tracing::info!(
            "Wrote {} records as {} to {}",
            records.len(),
            format.extension(),
            path.display()
        );

        Ok(())
    }

    fn delimited(records: &[OrderRecord], delim: char) -> String {
        let mut out = String::new();

        let header: Vec<&str> = OrderField::ALL.iter().map(|f| f.key()).collect();
        out.push_str(&header.join(&delim.to_string()));
        out.push('\n');

        for record in records {
            let cells: Vec<String> = record.values().map(|v| Self::cell(v, delim)).collect();
            out.push_str(&cells.join(&delim.to_string()));
            out.push('\n');
        }

        out
    }

    fn cell(value: &str, delim: char) -> String {
        if delim == '\t' {
            return value.replace(['\t', '\r', '\n'], " ");
        }
        if value.contains([delim, '"', '\n', '\r']) {
            format!("\"{}\"", value.replace('"', "\"\""))
        } else {
            value.to_string()
        }
    }
}
