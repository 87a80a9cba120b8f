use std::path::Path;

use log::warn;

use crate::api::ExchangeClient;
use crate::export::{ForwardSummary, TradeForwarder};
use crate::models::ExportWindow;
use crate::recorder::CsvTransactionRecorder;

/// Forward the window's trade history into `kraken-trades-[...].csv`.
///
/// The file only survives a complete run; a failed forward removes it.
pub async fn forward_trades<C: ExchangeClient + ?Sized>(
    client: &C,
    window: ExportWindow,
    export_dir: &Path,
) -> anyhow::Result<ForwardSummary> {
    let filename = format!("kraken-trades-{}.csv", window.label());
    let mut recorder = CsvTransactionRecorder::create(export_dir, &filename)?;

    match TradeForwarder::new(client).forward(Some(window), &mut recorder).await {
        Ok(summary) => {
            recorder.finish()?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(cleanup) = recorder.discard() {
                warn!("Could not remove partial trades file: {}", cleanup);
            }
            Err(e.into())
        }
    }
}
