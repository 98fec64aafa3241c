//! Zustaende des Routing-Automaten
//!
//! Vier Routen-Familien (Hoerer, Headset, Bluetooth, Lautsprecher) jeweils
//! aktiv und ruhend, dazu `RingingBluetooth` fuer Klingeln ohne In-Band
//! und `Streaming`.

use callroute_core::Route;
use serde::Serialize;
use std::fmt;

/// Routen-Familie eines Zustands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RouteFamily {
    Earpiece,
    Headset,
    Bluetooth,
    Speaker,
}

/// Ein Zustand des Automaten
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MachineState {
    ActiveEarpiece,
    QuiescentEarpiece,
    ActiveHeadset,
    QuiescentHeadset,
    ActiveBluetooth,
    RingingBluetooth,
    QuiescentBluetooth,
    ActiveSpeaker,
    QuiescentSpeaker,
    Streaming,
}

impl MachineState {
    pub const ALLE: [MachineState; 10] = [
        MachineState::ActiveEarpiece,
        MachineState::QuiescentEarpiece,
        MachineState::ActiveHeadset,
        MachineState::QuiescentHeadset,
        MachineState::ActiveBluetooth,
        MachineState::RingingBluetooth,
        MachineState::QuiescentBluetooth,
        MachineState::ActiveSpeaker,
        MachineState::QuiescentSpeaker,
        MachineState::Streaming,
    ];

    /// Name wie in Logs und Dumps
    pub fn name(self) -> &'static str {
        match self {
            MachineState::ActiveEarpiece => "ActiveEarpieceRoute",
            MachineState::QuiescentEarpiece => "QuiescentEarpieceRoute",
            MachineState::ActiveHeadset => "ActiveHeadsetRoute",
            MachineState::QuiescentHeadset => "QuiescentHeadsetRoute",
            MachineState::ActiveBluetooth => "ActiveBluetoothRoute",
            MachineState::RingingBluetooth => "RingingBluetoothRoute",
            MachineState::QuiescentBluetooth => "QuiescentBluetoothRoute",
            MachineState::ActiveSpeaker => "ActiveSpeakerRoute",
            MachineState::QuiescentSpeaker => "QuiescentSpeakerRoute",
            MachineState::Streaming => "StreamingState",
        }
    }

    /// Traegt dieser Zustand gerade Anruf-Audio?
    ///
    /// `RingingBluetooth` zaehlt nicht als aktiv.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            MachineState::ActiveEarpiece
                | MachineState::ActiveHeadset
                | MachineState::ActiveBluetooth
                | MachineState::ActiveSpeaker
                | MachineState::Streaming
        )
    }

    /// Gemerkte Route ohne Anruf-Fokus
    pub fn is_quiescent(self) -> bool {
        matches!(
            self,
            MachineState::QuiescentEarpiece
                | MachineState::QuiescentHeadset
                | MachineState::QuiescentBluetooth
                | MachineState::QuiescentSpeaker
        )
    }

    /// Veroeffentlichte Route dieses Zustands
    pub fn route(self) -> Route {
        match self {
            MachineState::ActiveEarpiece | MachineState::QuiescentEarpiece => Route::Earpiece,
            MachineState::ActiveHeadset | MachineState::QuiescentHeadset => Route::WiredHeadset,
            MachineState::ActiveBluetooth
            | MachineState::RingingBluetooth
            | MachineState::QuiescentBluetooth => Route::Bluetooth,
            MachineState::ActiveSpeaker | MachineState::QuiescentSpeaker => Route::Speaker,
            MachineState::Streaming => Route::Streaming,
        }
    }

    /// Familie fuer die zweite Verarbeitungsstufe (Streaming hat keine)
    pub fn family(self) -> Option<RouteFamily> {
        match self.route() {
            Route::Earpiece => Some(RouteFamily::Earpiece),
            Route::WiredHeadset => Some(RouteFamily::Headset),
            Route::Bluetooth => Some(RouteFamily::Bluetooth),
            Route::Speaker => Some(RouteFamily::Speaker),
            Route::Streaming => None,
        }
    }

    /// Ruhender Zustand fuer eine Route
    pub fn quiescent_for(route: Route) -> MachineState {
        match route {
            Route::Earpiece => MachineState::QuiescentEarpiece,
            Route::WiredHeadset => MachineState::QuiescentHeadset,
            Route::Bluetooth => MachineState::QuiescentBluetooth,
            Route::Speaker => MachineState::QuiescentSpeaker,
            Route::Streaming => MachineState::Streaming,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
