// src/logging.rs

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialisiert das Logging für das Binary.
///
/// Filter über `RUST_LOG`, ohne Angabe gilt `info`. Alle Logs, auch die
/// Zusammenfassung am Ende des Laufs, gehen nach stderr.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
