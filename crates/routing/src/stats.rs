//! Laufzeit-Statistiken des Automaten
//!
//! Werden vom Automaten-Thread geschrieben und sind von jedem Thread aus
//! lesbar (Metriken-Export, Dumps).

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Zaehler des Automaten
#[derive(Debug, Default)]
pub struct MachineStats {
    messages: AtomicU64,
    transitions: AtomicU64,
    publications: AtomicU64,
    ignored_commands: AtomicU64,
    dropped_messages: AtomicU64,
    handler_failures: AtomicU64,
    active: AtomicBool,
}

/// Momentaufnahme der Zaehler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub messages: u64,
    pub transitions: u64,
    pub publications: u64,
    pub ignored_commands: u64,
    pub dropped_messages: u64,
    pub handler_failures: u64,
    pub active: bool,
}

impl MachineStats {
    pub fn nachricht(&self) {
        self.messages.fetch_add(1, Ordering::Relaxed);
    }

    pub fn transition(&self) {
        self.transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn veroeffentlichung(&self) {
        self.publications.fetch_add(1, Ordering::Relaxed);
    }

    /// Kommando bestaetigt aber wirkungslos (z.B. Route nicht verfuegbar)
    pub fn ignoriert(&self) {
        self.ignored_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn verworfen(&self, anzahl: u64) {
        self.dropped_messages.fetch_add(anzahl, Ordering::Relaxed);
    }

    pub fn handler_fehler(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn aktiv_setzen(&self, aktiv: bool) {
        self.active.store(aktiv, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages: self.messages.load(Ordering::Relaxed),
            transitions: self.transitions.load(Ordering::Relaxed),
            publications: self.publications.load(Ordering::Relaxed),
            ignored_commands: self.ignored_commands.load(Ordering::Relaxed),
            dropped_messages: self.dropped_messages.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zaehler_starten_bei_null() {
        assert_eq!(MachineStats::default().snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn zaehler_zaehlen() {
        let stats = MachineStats::default();
        stats.nachricht();
        stats.nachricht();
        stats.transition();
        stats.verworfen(3);
        stats.aktiv_setzen(true);

        let snap = stats.snapshot();
        assert_eq!(snap.messages, 2);
        assert_eq!(snap.transitions, 1);
        assert_eq!(snap.dropped_messages, 3);
        assert!(snap.active);
    }
}
