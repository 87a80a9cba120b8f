use std::path::PathBuf;

use log::info;

use crate::api::ExchangeClient;
use crate::export::{render_csv, write_csv, CsvArtifact, ExportError, LedgerExporter};
use crate::models::ExportWindow;

/// Where a ledger export should end up
#[derive(Debug, Clone)]
pub enum CsvTarget {
    /// Write `dir/filename`
    File { dir: PathBuf, filename: String },
    /// Only return the serialized text
    InMemory,
}

/// Query the ledger over `window`, drop excluded types, and serialize the rows as CSV
pub async fn export_to_csv<C: ExchangeClient + ?Sized>(
    client: &C,
    window: ExportWindow,
    excluded_types: &[String],
    target: CsvTarget,
) -> Result<CsvArtifact, ExportError> {
    let export = LedgerExporter::new(client, excluded_types.iter().cloned())
        .export(window)
        .await?;

    let contents = render_csv(&export.rows)?;

    let path = match target {
        CsvTarget::File { dir, filename } => Some(write_csv(&dir, &filename, &contents)?),
        CsvTarget::InMemory => None,
    };

    info!("Generated Kraken CSV! ({} rows)", export.rows.len());

    Ok(CsvArtifact {
        contents,
        rows: export.rows.len(),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, AssetPair, LedgerPage, LedgerQuery, TradesPage, TradesQuery};
    use crate::export::CSV_HEADER;
    use crate::models::LedgerEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Serves one page of ledger entries, then empty pages
    struct OnePageLedger {
        entries: Mutex<Option<Vec<LedgerEntry>>>,
    }

    impl OnePageLedger {
        fn new(entries: Vec<LedgerEntry>) -> Self {
            Self {
                entries: Mutex::new(Some(entries)),
            }
        }
    }

    #[async_trait]
    impl ExchangeClient for OnePageLedger {
        async fn fetch_ledger(&self, _query: LedgerQuery) -> Result<LedgerPage, ApiError> {
            let entries = self.entries.lock().unwrap().take().unwrap_or_default();
            Ok(LedgerPage { entries, count: None })
        }

        async fn fetch_trades(&self, _query: TradesQuery) -> Result<TradesPage, ApiError> {
            unreachable!("csv export never reads trades")
        }

        async fn fetch_asset_pair(&self, _pair: &str) -> Result<AssetPair, ApiError> {
            unreachable!("csv export never reads asset pairs")
        }
    }

    fn entry(id: &str, time: f64, entry_type: &str) -> LedgerEntry {
        LedgerEntry {
            txid: id.to_string(),
            refid: format!("R-{}", id),
            time,
            entry_type: entry_type.to_string(),
            subtype: String::new(),
            aclass: "currency".to_string(),
            asset: "ZEUR".to_string(),
            amount: "10.0".to_string(),
            fee: "0.0".to_string(),
            balance: "100.0".to_string(),
        }
    }

    fn ledger() -> OnePageLedger {
        OnePageLedger::new(vec![
            entry("L3", 1_674_900_000.0, "trade"),
            entry("L2", 1_674_000_000.0, "withdrawal"),
            entry("L1", 1_673_000_000.0, "deposit"),
        ])
    }

    const WINDOW: ExportWindow = ExportWindow {
        start: 1_672_531_200,
        end: 1_675_209_600,
    };

    #[tokio::test]
    async fn test_in_memory_export_returns_text_without_a_file() {
        let excluded = vec!["withdrawal".to_string()];
        let artifact = export_to_csv(&ledger(), WINDOW, &excluded, CsvTarget::InMemory)
            .await
            .unwrap();

        assert!(artifact.path.is_none());
        assert_eq!(artifact.rows, 2);

        let lines: Vec<&str> = artifact.contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));
        assert!(lines[1].starts_with("L3,R-L3,"));
        assert!(lines[2].starts_with("L1,R-L1,"));
        assert!(!artifact.contents.contains("withdrawal"));
    }

    #[tokio::test]
    async fn test_file_export_returns_the_written_text() {
        let dir = tempfile::tempdir().unwrap();
        let excluded = vec!["withdrawal".to_string()];

        let artifact = export_to_csv(
            &ledger(),
            WINDOW,
            &excluded,
            CsvTarget::File {
                dir: dir.path().join("exports"),
                filename: "ledger.csv".to_string(),
            },
        )
        .await
        .unwrap();

        let path = artifact.path.clone().unwrap();
        assert_eq!(path, dir.path().join("exports").join("ledger.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), artifact.contents.as_bytes());
        assert_eq!(artifact.rows, 2);
    }
}
