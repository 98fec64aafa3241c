//! callroute Daemon – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Daemon.

use anyhow::Result;
use callroute_daemon::{Daemon, config::DaemonConfig};
use callroute_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("CALLROUTE_CONFIG").unwrap_or_else(|_| "callroute.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = DaemonConfig::laden(&config_pfad)?;

    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "callroute Daemon wird initialisiert"
    );

    let daemon = Daemon::neu(config)?;
    daemon.starten().await?;

    Ok(())
}
