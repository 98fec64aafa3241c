//! Konfiguration des Routers
//!
//! Alle Felder haben Standardwerte, die Struktur kann direkt als
//! `[router]`-Abschnitt aus TOML geladen werden.

use serde::{Deserialize, Serialize};

/// Wie ermittelt wird ob das Geraet einen eingebauten Hoerer hat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarpieceControl {
    ForceDisabled,
    ForceEnabled,
    /// Den Audio-Dienst fragen
    #[default]
    AutoDetect,
}

/// Wo blockierende Hardware-Aufrufe laufen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorMode {
    /// Eigener Thread, der Automat wartet nie auf die Hardware
    #[default]
    Thread,
    /// Direkt auf dem Automaten-Thread (deterministisch, fuer Tests)
    Inline,
}

/// Router-Konfiguration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub earpiece: EarpieceControl,
    /// Bluetooth nicht automatisch waehlen wenn nur Uhren verbunden sind
    pub ignore_watch_devices: bool,
    pub hardware_executor: ExecutorMode,
    /// Anzahl verarbeiteter Nachrichten die `dump()` zeigt
    pub history_size: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            earpiece: EarpieceControl::AutoDetect,
            ignore_watch_devices: true,
            hardware_executor: ExecutorMode::Thread,
            history_size: 20,
        }
    }
}

impl RouterConfig {
    /// Konfiguration fuer deterministische Tests
    pub fn inline() -> Self {
        Self {
            hardware_executor: ExecutorMode::Inline,
            ..Default::default()
        }
    }
}
