//! Fehlertypen des Daemons

use callroute_core::CallrouteError;
use callroute_routing::RoutingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("Protokollfehler: {0}")]
    Protokoll(String),

    #[error("Ungueltige Eingabe: {0}")]
    UngueltigeEingabe(String),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Plattform(#[from] CallrouteError),
}

impl DaemonError {
    /// Fehler-ID in der Antwortzeile
    pub fn code(&self) -> u32 {
        match self {
            DaemonError::Protokoll(_) => 1,
            DaemonError::UngueltigeEingabe(_) => 2,
            DaemonError::Routing(_) => 3,
            DaemonError::Plattform(_) => 4,
        }
    }
}

pub type DaemonResult<T> = std::result::Result<T, DaemonError>;
