use std::fs::{self, File};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::info;
use thiserror::Error;

use crate::models::PortfolioTransaction;

#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Failed to record transaction: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Destination for normalized trades (a portfolio tracker, a file, ...)
#[async_trait]
pub trait TransactionRecorder: Send {
    async fn add_transaction(&mut self, transaction: &PortfolioTransaction) -> Result<(), RecorderError>;
}

const HEADER: [&str; 8] = [
    "type", "crypto", "fiat", "amount", "price", "time", "fee", "note",
];

/// Appends each transaction as a row of a CSV file
pub struct CsvTransactionRecorder {
    writer: csv::Writer<File>,
    path: PathBuf,
    recorded: usize,
}

impl CsvTransactionRecorder {
    pub fn create(dir: &Path, filename: &str) -> Result<Self, RecorderError> {
        fs::create_dir_all(dir).map_err(|source| RecorderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = dir.join(filename);
        let file = File::create(&path).map_err(|source| RecorderError::Io {
            path: path.clone(),
            source,
        })?;

        let mut writer = csv::WriterBuilder::new().quote(b'|').from_writer(file);
        writer.write_record(HEADER)?;

        Ok(Self {
            writer,
            path,
            recorded: 0,
        })
    }

    /// Flush and return the file path
    pub fn finish(mut self) -> Result<PathBuf, RecorderError> {
        self.writer.flush().map_err(|source| RecorderError::Io {
            path: self.path.clone(),
            source,
        })?;
        info!("Recorded {} transactions to {}", self.recorded, self.path.display());
        Ok(self.path)
    }

    /// Close and delete the file, leaving no partial output behind
    pub fn discard(self) -> Result<(), RecorderError> {
        let Self { writer, path, .. } = self;
        drop(writer);

        fs::remove_file(&path).map_err(|source| RecorderError::Io { path: path.clone(), source })?;
        info!("Discarded {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl TransactionRecorder for CsvTransactionRecorder {
    async fn add_transaction(&mut self, transaction: &PortfolioTransaction) -> Result<(), RecorderError> {
        let time = transaction.transaction_time.format("%Y-%m-%d %H:%M:%S").to_string();
        self.writer.write_record([
            transaction.transaction_type.as_str(),
            transaction.crypto_symbol.as_str(),
            transaction.fiat_symbol.as_str(),
            transaction.amount.as_str(),
            transaction.price.as_str(),
            time.as_str(),
            transaction.fee.as_str(),
            transaction.note.as_str(),
        ])?;
        self.recorded += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[tokio::test]
    async fn test_csv_recorder_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = CsvTransactionRecorder::create(dir.path(), "trades.csv").unwrap();

        let transaction_time = Local.with_ymd_and_hms(2023, 1, 15, 12, 30, 0).unwrap();
        recorder
            .add_transaction(&PortfolioTransaction {
                transaction_type: "buy".to_string(),
                crypto_symbol: "BTC".to_string(),
                fiat_symbol: "EUR".to_string(),
                amount: "0.01".to_string(),
                price: "19500.0".to_string(),
                transaction_time,
                fee: "0.5".to_string(),
                note: "Automated entry ordertxid: O1 postxid: P1".to_string(),
            })
            .await
            .unwrap();

        let path = recorder.finish().unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines[0], "type,crypto,fiat,amount,price,time,fee,note");
        assert_eq!(
            lines[1],
            "buy,BTC,EUR,0.01,19500.0,2023-01-15 12:30:00,0.5,Automated entry ordertxid: O1 postxid: P1"
        );
    }

    #[tokio::test]
    async fn test_discard_removes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = CsvTransactionRecorder::create(dir.path(), "trades.csv").unwrap();
        assert!(dir.path().join("trades.csv").exists());

        recorder.discard().unwrap();
        assert!(!dir.path().join("trades.csv").exists());
    }
}
