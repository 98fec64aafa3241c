//! Versteckte Zustandsgroessen des Automaten
//!
//! Diese Werte werden nie direkt veroeffentlicht, bestimmen aber Baseline,
//! Maskenpflege und Fokus-Verhalten.

use callroute_core::{AudioFocus, RouteMask};
use serde::Serialize;
use std::fmt;

/// Versteckte Skalare des Automaten
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteContext {
    /// Waehlbare Routen (Geraet ∩ Anruf)
    pub available_routes: RouteMask,
    /// Vom Geraet unterstuetzte Routen
    pub device_supported_routes: RouteMask,
    pub audio_focus: AudioFocus,
    /// Lautsprecher war aktiv bevor das Headset eingesteckt wurde
    pub was_on_speaker: bool,
    /// Der Benutzer hat Bluetooth ausdruecklich verlassen
    pub has_user_explicitly_left_bluetooth: bool,
    pub muted: bool,
}

impl RouteContext {
    /// Passt beide Masken an eine Geraete-Aenderung an
    ///
    /// Hinzugefuegte Routen landen in `available_routes` nur soweit der
    /// aktuelle Anruf sie erlaubt.
    pub fn routen_aendern(
        &mut self,
        entfernt: RouteMask,
        hinzugefuegt: RouteMask,
        anruf_erlaubt: RouteMask,
    ) {
        self.available_routes =
            modify_routes(self.available_routes, entfernt, hinzugefuegt.intersection(anruf_erlaubt));
        self.device_supported_routes =
            modify_routes(self.device_supported_routes, entfernt, hinzugefuegt);
    }
}

/// Erst entfernen, dann hinzufuegen
pub fn modify_routes(basis: RouteMask, entfernt: RouteMask, hinzugefuegt: RouteMask) -> RouteMask {
    basis.difference(entfernt).union(hinzugefuegt)
}

impl fmt::Display for RouteContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "available={} device_supported={} focus={} was_on_speaker={} user_left_bt={} muted={}",
            self.available_routes,
            self.device_supported_routes,
            self.audio_focus,
            self.was_on_speaker,
            self.has_user_explicitly_left_bluetooth,
            self.muted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entfernen_vor_hinzufuegen() {
        let basis = RouteMask::EARPIECE.union(RouteMask::SPEAKER);
        let ergebnis = modify_routes(basis, RouteMask::EARPIECE, RouteMask::WIRED_HEADSET);
        assert_eq!(ergebnis, RouteMask::WIRED_HEADSET.union(RouteMask::SPEAKER));

        // Dieselbe Route entfernt und hinzugefuegt bleibt erhalten
        let gleich = modify_routes(basis, RouteMask::SPEAKER, RouteMask::SPEAKER);
        assert_eq!(gleich, basis);
    }

    #[test]
    fn anruf_beschraenkt_nur_verfuegbare() {
        let mut ctx = RouteContext {
            available_routes: RouteMask::EARPIECE,
            device_supported_routes: RouteMask::EARPIECE,
            ..Default::default()
        };
        ctx.routen_aendern(RouteMask::NONE, RouteMask::BLUETOOTH, RouteMask::EARPIECE);

        assert!(!ctx.available_routes.contains(callroute_core::Route::Bluetooth));
        assert!(ctx
            .device_supported_routes
            .contains(callroute_core::Route::Bluetooth));
    }

    #[test]
    fn anzeige_enthaelt_skalare() {
        let ctx = RouteContext {
            was_on_speaker: true,
            ..Default::default()
        };
        let text = ctx.to_string();
        assert!(text.contains("was_on_speaker=true"));
        assert!(text.contains("focus=NO_FOCUS"));
    }
}
