pub mod api;
pub mod cli;
pub mod commands;
pub mod export;
pub mod models;
pub mod recorder;
pub mod upload;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error, info};

use api::KrakenClient;
use cli::{Cli, Mode, MODE_GUIDANCE};
use commands::CsvTarget;
use export::{default_filename, with_csv_extension, EXPORT_DIR};
use models::{ConfigError, Settings};

/// Binary entry point: parse arguments, run the selected mode, map the outcome to an exit code
pub async fn run() -> ExitCode {
    dotenv::dotenv().ok();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();

    let cli = Cli::parse();
    debug!("{:?}", cli);

    match execute(&cli, Settings::from_env, Path::new(EXPORT_DIR)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Run one CLI invocation.
///
/// Settings are loaded before anything else, so a missing credential fails the
/// run before any request is sent.
pub async fn execute<F>(cli: &Cli, load_settings: F, export_dir: &Path) -> anyhow::Result<()>
where
    F: FnOnce() -> Result<Settings, ConfigError>,
{
    let settings = load_settings()?;
    debug!("{:?}", settings);

    let Some(mode) = cli.mode() else {
        println!("{}", MODE_GUIDANCE);
        return Ok(());
    };

    let window = cli.window(chrono::Local::now())?;

    // Upload credentials are checked before the export starts
    if mode == Mode::CoinTracking {
        settings.upload_credentials()?;
    }

    let client = KrakenClient::new(&settings)?;

    match mode {
        Mode::Csv => {
            let filename = cli
                .output
                .as_deref()
                .map(with_csv_extension)
                .unwrap_or_else(|| default_filename(&window));

            let artifact = commands::export_to_csv(
                &client,
                window,
                &cli.excluded_types,
                CsvTarget::File {
                    dir: export_dir.to_path_buf(),
                    filename,
                },
            )
            .await?;

            if let Some(path) = artifact.path {
                println!("Generated Kraken CSV! {} rows written to {}", artifact.rows, path.display());
            }
        }
        Mode::CoinTracking => {
            commands::export_to_cointracking(&client, &settings, window, &cli.excluded_types, export_dir)
                .await?;
            println!("Successfully uploaded kraken CSV to cointracking.info!");
        }
        Mode::Trades => {
            let summary = commands::forward_trades(&client, window, export_dir).await?;
            info!("{:?}", summary);
            println!("Forwarded {} trades", summary.forwarded);
        }
    }

    Ok(())
}
