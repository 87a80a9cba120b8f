use std::collections::HashSet;

use log::{debug, info};

use crate::api::{ApiError, ExchangeClient, LedgerQuery};
use crate::models::{ExportWindow, LedgerEntry};

/// Maximum number of entries Kraken returns per ledger query
pub const LEDGER_PAGE_SIZE: usize = 50;

/// Rows collected by one export, newest first
#[derive(Debug, Clone, Default)]
pub struct LedgerExport {
    pub rows: Vec<LedgerEntry>,
    pub pages_fetched: usize,
    /// Entries dropped because their type is excluded
    pub excluded: usize,
}

/// Walks the ledger endpoint backward in time over an export window.
///
/// Each query is bounded above by a cursor that starts at the window end and
/// moves to the oldest timestamp of the previous page (rounded up, so entries
/// sharing that second are fetched again and dropped by id). Within one second
/// the walk advances through `ofs`. The walk ends at the first page that
/// contributes no unseen entry.
pub struct LedgerExporter<'a, C: ExchangeClient + ?Sized> {
    client: &'a C,
    excluded_types: HashSet<String>,
    page_size: usize,
}

impl<'a, C: ExchangeClient + ?Sized> LedgerExporter<'a, C> {
    pub fn new<I, S>(client: &'a C, excluded_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            client,
            excluded_types: excluded_types.into_iter().map(Into::into).collect(),
            page_size: LEDGER_PAGE_SIZE,
        }
    }

    pub fn is_excluded(&self, entry: &LedgerEntry) -> bool {
        self.excluded_types.contains(&entry.entry_type)
    }

    pub async fn export(&self, window: ExportWindow) -> Result<LedgerExport, ApiError> {
        let mut excluded: Vec<&String> = self.excluded_types.iter().collect();
        excluded.sort();
        info!("Skipping: {:?}", excluded);

        let mut export = LedgerExport::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut cursor = window.end;
        let mut ofs: u64 = 0;

        loop {
            let page = self
                .client
                .fetch_ledger(LedgerQuery {
                    start: Some(window.start),
                    end: Some(cursor),
                    ofs: (ofs > 0).then_some(ofs),
                })
                .await?;
            export.pages_fetched += 1;

            let received = page.entries.len();
            let mut fresh = 0usize;
            let mut oldest: Option<f64> = None;

            for entry in page.entries {
                oldest = Some(oldest.map_or(entry.time, |t: f64| t.min(entry.time)));

                if !seen.insert(entry.txid.clone()) {
                    continue;
                }
                fresh += 1;

                if self.is_excluded(&entry) {
                    export.excluded += 1;
                    continue;
                }
                export.rows.push(entry);
            }

            debug!(
                "Ledger page {} (end={}, ofs={}): {} entries, {} new",
                export.pages_fetched, cursor, ofs, received, fresh
            );

            if fresh == 0 {
                if received >= self.page_size {
                    // A full page of already-seen entries: step over them within the same bound
                    ofs += received as u64;
                    continue;
                }
                break;
            }

            let next_cursor = oldest.map(|t| t.ceil() as i64).unwrap_or(cursor);
            if next_cursor < cursor {
                cursor = next_cursor;
                ofs = 0;
            } else {
                ofs += received as u64;
            }
        }

        info!(
            "Collected {} ledger entries ({} excluded) over {} pages",
            export.rows.len(),
            export.excluded,
            export.pages_fetched
        );

        Ok(export)
    }
}
