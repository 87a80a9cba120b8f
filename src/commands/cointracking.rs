use std::path::Path;

use anyhow::Context;

use super::export::{export_to_csv, CsvTarget};
use crate::api::ExchangeClient;
use crate::export::LATEST_EXPORT_FILENAME;
use crate::models::{ExportWindow, Settings};
use crate::upload::{CoinTrackingUpload, FirefoxSession, UploadOptions};

/// Export the ledger to `latest-kraken-export.csv` and import it on cointracking.info
pub async fn export_to_cointracking<C: ExchangeClient + ?Sized>(
    client: &C,
    settings: &Settings,
    window: ExportWindow,
    excluded_types: &[String],
    export_dir: &Path,
) -> anyhow::Result<()> {
    let credentials = settings.upload_credentials()?;

    let artifact = export_to_csv(
        client,
        window,
        excluded_types,
        CsvTarget::File {
            dir: export_dir.to_path_buf(),
            filename: LATEST_EXPORT_FILENAME.to_string(),
        },
    )
    .await?;

    let written = artifact
        .path
        .context("export did not produce a file to upload")?;
    let csv_path = std::fs::canonicalize(&written)
        .with_context(|| format!("failed to resolve {}", written.display()))?;

    let mut browser = FirefoxSession::launch(settings).await?;

    CoinTrackingUpload::new(credentials, UploadOptions::default())
        .run(&mut browser, &csv_path)
        .await?;

    Ok(())
}
