//! Fehlertypen fuer die Routing-Engine

use callroute_core::CallrouteError;
use thiserror::Error;

/// Fehler bei der Benutzung des Routers
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("Router nicht initialisiert")]
    NichtInitialisiert,

    #[error("Router wurde bereits initialisiert")]
    BereitsInitialisiert,

    #[error("Router wurde beendet")]
    Beendet,

    #[error("Unbekannter Nachrichten-Code: {0}")]
    UnbekannterCode(i32),

    #[error("Ungueltiges Argument fuer {code}: {grund}")]
    UngueltigesArgument { code: String, grund: String },

    #[error("Nachrichten-Queue geschlossen")]
    QueueGeschlossen,

    #[error("Thread konnte nicht gestartet werden: {0}")]
    ThreadStart(#[from] std::io::Error),

    #[error(transparent)]
    Kollaborateur(#[from] CollaboratorError),
}

/// Fehler die ein Kollaborateur meldet (z.B. abgebrochener RPC)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Dienst nicht erreichbar: {0}")]
    NichtErreichbar(String),

    #[error("Aufruf abgelehnt: {0}")]
    Abgelehnt(String),

    #[error("Geraet nicht vorhanden: {0}")]
    GeraetFehlt(String),
}

pub type RoutingResult<T> = Result<T, RoutingError>;

impl From<RoutingError> for CallrouteError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::NichtInitialisiert => CallrouteError::NichtInitialisiert,
            RoutingError::Beendet | RoutingError::QueueGeschlossen => CallrouteError::Beendet,
            RoutingError::UnbekannterCode(code) => CallrouteError::UnbekannterCode(code),
            RoutingError::UngueltigesArgument { code, grund } => {
                CallrouteError::UngueltigeNachricht(format!("{code}: {grund}"))
            }
            RoutingError::Kollaborateur(e) => CallrouteError::kollaborateur("routing", e.to_string()),
            andere => CallrouteError::intern(andere.to_string()),
        }
    }
}
