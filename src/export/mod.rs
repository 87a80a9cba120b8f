pub mod csv;
pub mod ledger;
pub mod trades;

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ApiError;

pub use self::csv::{
    default_filename, render_csv, with_csv_extension, write_csv, CsvArtifact, CSV_HEADER,
    EXPORT_DIR, LATEST_EXPORT_FILENAME,
};
pub use ledger::{LedgerExport, LedgerExporter, LEDGER_PAGE_SIZE};
pub use trades::{ForwardError, ForwardSummary, TradeForwarder};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
