//! Streaming: Audio laeuft ueber ein entferntes Geraet
//!
//! Routenwechsel und Hardware-Fakten werden quittiert aber nicht umgesetzt.
//! Erst das Abschalten des Streamings oder Fokusverlust fuehren zurueck.

use callroute_core::AudioFocus;
use tracing::debug;

use super::Disposition;
use crate::machine::RouteMachine;
use crate::message::Command;

impl RouteMachine {
    pub(crate) fn handle_streaming(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_)
            | Command::SwitchBluetooth { .. }
            | Command::SwitchHeadset(_)
            | Command::SwitchSpeaker(_)
            | Command::SpeakerOn
            | Command::SpeakerOff
            | Command::BluetoothAudioConnected => {
                debug!(kommando = %command, "Im Streaming ignoriert");
                self.stats.ignoriert();
            }
            Command::ConnectWiredHeadset
            | Command::DisconnectWiredHeadset
            | Command::ConnectDock
            | Command::DisconnectDock
            | Command::BluetoothDeviceListChanged
            | Command::BluetoothActiveDevicePresent
            | Command::BluetoothActiveDeviceGone
            | Command::BluetoothAudioDisconnected
            | Command::StreamingForceEnabled => {}
            Command::SwitchFocus(AudioFocus::NoFocus) => self.fokus_verloren(),
            Command::SwitchFocus(_) => {}
            Command::StreamingForceDisabled => self.reinitialize(),
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }
}
