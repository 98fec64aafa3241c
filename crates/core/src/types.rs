//! Gemeinsame Identifikationstypen fuer callroute
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! verschiedenen ID-Arten zur Compilezeit auszuschliessen.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Eindeutige Anruf-ID (vom Call-Lifecycle-Manager vergeben)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(pub Uuid);

impl CallId {
    /// Erstellt eine neue zufaellige CallId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Gibt die innere UUID zurueck
    pub fn inner(&self) -> Uuid {
        self.0
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CallId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "call:{}", self.0)
    }
}

/// Log-Session einer Nachricht
///
/// Jede Nachricht in der Queue bekommt eine eigene Session, damit alle
/// Log-Eintraege eines zusammengesetzten Routenwechsels korrelierbar sind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Erstellt eine neue zufaellige SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Kurzform fuer Logs und Dumps (erste 8 Hex-Zeichen)
    pub fn kurz(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session:{}", self.kurz())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_id_eindeutig() {
        let a = CallId::new();
        let b = CallId::new();
        assert_ne!(a, b, "Zwei neue CallIds muessen verschieden sein");
    }

    #[test]
    fn call_id_display() {
        let id = CallId(Uuid::nil());
        assert!(id.to_string().starts_with("call:"));
    }

    #[test]
    fn session_id_kurzform() {
        let id = SessionId(Uuid::nil());
        assert_eq!(id.kurz(), "00000000");
        assert_eq!(id.to_string(), "session:00000000");
    }

    #[test]
    fn ids_sind_serde_kompatibel() {
        let cid = CallId::new();
        let json = serde_json::to_string(&cid).unwrap();
        let cid2: CallId = serde_json::from_str(&json).unwrap();
        assert_eq!(cid, cid2);
    }
}
