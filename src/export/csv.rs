use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use super::ExportError;
use crate::models::{ExportWindow, LedgerEntry};

pub const CSV_HEADER: [&str; 10] = [
    "txid", "refid", "time", "type", "subtype", "aclass", "asset", "amount", "fee", "balance",
];

/// Local directory every export is written to
pub const EXPORT_DIR: &str = "exports";

/// Filename the upload flow writes and hands to the browser
pub const LATEST_EXPORT_FILENAME: &str = "latest-kraken-export.csv";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Serialized ledger export and where it landed
#[derive(Debug, Clone)]
pub struct CsvArtifact {
    pub contents: String,
    pub rows: usize,
    pub path: Option<PathBuf>,
}

/// `kraken-[YYYY.MM.DD - YYYY.MM.DD].csv` for a window
pub fn default_filename(window: &ExportWindow) -> String {
    format!("kraken-{}.csv", window.label())
}

/// Append `.csv` unless the name already ends with it
pub fn with_csv_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".csv") {
        name.to_string()
    } else {
        format!("{}.csv", name)
    }
}

fn format_time(entry: &LedgerEntry) -> String {
    entry
        .local_time()
        .map(|dt| dt.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| entry.time.to_string())
}

/// Serialize rows under the fixed header
pub fn render_csv(rows: &[LedgerEntry]) -> Result<String, ExportError> {
    let mut writer = ::csv::WriterBuilder::new()
        .quote(b'|')
        .terminator(::csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER)?;

    for entry in rows {
        let time = format_time(entry);
        writer.write_record([
            entry.txid.as_str(),
            entry.refid.as_str(),
            time.as_str(),
            entry.entry_type.as_str(),
            entry.subtype.as_str(),
            entry.aclass.as_str(),
            entry.asset.as_str(),
            entry.amount.as_str(),
            entry.fee.as_str(),
            entry.balance.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(e.into_error().into()))?;

    String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
}

/// Write serialized CSV to `dir/filename`, creating `dir` if needed
pub fn write_csv(dir: &Path, filename: &str, contents: &str) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(filename);
    fs::write(&path, contents).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    info!("Wrote {}", path.display());
    Ok(path)
}
