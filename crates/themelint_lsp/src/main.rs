//! themelint language server binary.

use tracing_subscriber::EnvFilter;

/// Environment variable overriding the log filter.
const LOG_ENV: &str = "THEMELINT_LOG";

#[tokio::main]
async fn main() {
    // stdout carries the protocol; logs go to stderr.
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    themelint_lsp::run().await;
}
