use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    kraken_export_lib::run().await
}
