//! Fehlertypen fuer callroute
//!
//! Zentraler Fehler-Enum fuer alles was crate-uebergreifend gemeldet wird.
//! Die Routing-Engine definiert eigene Fehler und konvertiert via `#[from]`.

use thiserror::Error;

/// Globaler Result-Alias fuer callroute
pub type Result<T> = std::result::Result<T, CallrouteError>;

/// Alle crate-uebergreifenden Fehler
#[derive(Debug, Error)]
pub enum CallrouteError {
    // --- Nachrichten ---
    #[error("Ungueltige Nachricht: {0}")]
    UngueltigeNachricht(String),

    #[error("Unbekannter Nachrichten-Code: {0}")]
    UnbekannterCode(i32),

    // --- Lebenszyklus ---
    #[error("Router nicht initialisiert")]
    NichtInitialisiert,

    #[error("Router wurde beendet")]
    Beendet,

    // --- Kollaborateure ---
    #[error("Kollaborateur-Fehler ({name}): {grund}")]
    Kollaborateur { name: String, grund: String },

    // --- Konfiguration ---
    #[error("Konfigurationsfehler: {0}")]
    Konfiguration(String),

    // --- Intern ---
    #[error("Interner Fehler: {0}")]
    Intern(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl CallrouteError {
    /// Erstellt einen internen Fehler aus einer beliebigen Nachricht
    pub fn intern(msg: impl Into<String>) -> Self {
        Self::Intern(msg.into())
    }

    /// Erstellt einen Kollaborateur-Fehler
    pub fn kollaborateur(name: impl Into<String>, grund: impl Into<String>) -> Self {
        Self::Kollaborateur {
            name: name.into(),
            grund: grund.into(),
        }
    }

    /// Gibt true zurueck wenn der Router nicht mehr angesprochen werden kann
    pub fn ist_endgueltig(&self) -> bool {
        matches!(self, Self::Beendet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fehler_anzeige() {
        let e = CallrouteError::UngueltigeNachricht("fehlendes Argument".into());
        assert_eq!(e.to_string(), "Ungueltige Nachricht: fehlendes Argument");
    }

    #[test]
    fn endgueltig_erkennung() {
        assert!(CallrouteError::Beendet.ist_endgueltig());
        assert!(!CallrouteError::NichtInitialisiert.ist_endgueltig());
    }

    #[test]
    fn kollaborateur_fehler() {
        let e = CallrouteError::kollaborateur("audio", "RPC abgebrochen");
        assert!(e.to_string().contains("audio"));
        assert!(e.to_string().contains("RPC abgebrochen"));
    }
}
