//! Uebergangstabellen des Automaten
//!
//! Jede Datei behandelt eine Routen-Familie: erst die gemeinsame
//! Familien-Stufe, dann die konkreten Zustaende. `common` ist die erste
//! Stufe fuer alle Zustaende.

mod bluetooth;
mod common;
mod earpiece;
mod headset;
mod speaker;
mod streaming;

use crate::machine::RouteMachine;
use crate::message::Command;
use crate::states::{MachineState, RouteFamily};

/// Ergebnis einer Verarbeitungsstufe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposition {
    Handled,
    NotHandled,
}

impl RouteMachine {
    /// Reicht ein Kommando durch die drei Stufen
    pub(crate) fn dispatch(&mut self, zustand: MachineState, command: Command) {
        if self.handle_common(&command) == Disposition::Handled {
            return;
        }

        let familie = match zustand.family() {
            Some(RouteFamily::Earpiece) => self.handle_earpiece_family(zustand, &command),
            Some(RouteFamily::Headset) => self.handle_headset_family(zustand, &command),
            Some(RouteFamily::Bluetooth) => self.handle_bluetooth_family(zustand, &command),
            Some(RouteFamily::Speaker) => self.handle_speaker_family(zustand, &command),
            None => Disposition::NotHandled,
        };
        if familie == Disposition::Handled {
            return;
        }

        let konkret = match zustand {
            MachineState::ActiveEarpiece => self.handle_active_earpiece(&command),
            MachineState::QuiescentEarpiece => self.handle_quiescent_earpiece(&command),
            MachineState::ActiveHeadset => self.handle_active_headset(&command),
            MachineState::QuiescentHeadset => self.handle_quiescent_headset(&command),
            MachineState::ActiveBluetooth => self.handle_active_bluetooth(&command),
            MachineState::RingingBluetooth => self.handle_ringing_bluetooth(&command),
            MachineState::QuiescentBluetooth => self.handle_quiescent_bluetooth(&command),
            MachineState::ActiveSpeaker => self.handle_active_speaker(&command),
            MachineState::QuiescentSpeaker => self.handle_quiescent_speaker(&command),
            MachineState::Streaming => self.handle_streaming(&command),
        };
        if konkret == Disposition::Handled {
            return;
        }

        self.unhandled_message(zustand, command);
    }

    /// Wechsel zu einer Route die gerade nicht waehlbar ist
    pub(crate) fn route_nicht_verfuegbar(&self, command: &Command) -> Disposition {
        tracing::info!(
            kommando = %command,
            verfuegbar = %self.ctx.available_routes,
            "Route nicht verfuegbar, Wechsel ignoriert"
        );
        self.stats.ignoriert();
        Disposition::Handled
    }
}
