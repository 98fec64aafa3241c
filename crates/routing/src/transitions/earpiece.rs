//! Hoerer-Familie

use callroute_core::{AudioFocus, Route};
use tracing::{error, info, warn};

use super::Disposition;
use crate::collaborators::CommunicationDevice;
use crate::machine::RouteMachine;
use crate::message::{Command, SwitchOrigin};
use crate::states::MachineState;

impl RouteMachine {
    pub(crate) fn handle_earpiece_family(
        &mut self,
        zustand: MachineState,
        command: &Command,
    ) -> Disposition {
        match command {
            Command::ConnectWiredHeadset => {
                self.send_internal(Command::SwitchHeadset(SwitchOrigin::Derived));
            }
            Command::BluetoothActiveDevicePresent => {
                if self.ctx.has_user_explicitly_left_bluetooth {
                    info!("Benutzer hat Bluetooth verlassen, bleibe beim Hoerer");
                } else {
                    self.send_internal(Command::SwitchBluetooth {
                        origin: SwitchOrigin::Derived,
                        address: None,
                    });
                }
            }
            Command::DisconnectWiredHeadset => {
                error!(zustand = %zustand, "Kabel-Headset getrennt obwohl Hoerer aktiv");
            }
            Command::StreamingForceEnabled => self.transition_to(MachineState::Streaming),
            Command::StreamingForceDisabled => {
                info!(zustand = %zustand, "Kein Streaming aktiv, nichts zu beenden");
            }
            Command::BluetoothActiveDeviceGone
            | Command::BluetoothAudioDisconnected
            | Command::BluetoothDeviceListChanged
            | Command::DisconnectDock => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_active_earpiece(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) | Command::SpeakerOff => {}
            Command::BluetoothAudioConnected => self.transition_to(MachineState::ActiveBluetooth),
            Command::SwitchBluetooth { address, .. } => {
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.clear_communication_device(CommunicationDevice::BuiltinEarpiece);
                if self.ctx.audio_focus == AudioFocus::ActiveFocus
                    || self.collaborators.bluetooth.is_inband_ringing_enabled()
                {
                    self.set_bluetooth_on(address.as_deref());
                } else {
                    self.transition_to(MachineState::RingingBluetooth);
                }
            }
            Command::SwitchHeadset(_) => {
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveHeadset);
            }
            Command::ConnectDock | Command::SwitchSpeaker(_) => {
                self.set_speakerphone_on(true);
                self.transition_to(MachineState::ActiveSpeaker);
            }
            Command::SpeakerOn => {
                if self.collaborators.audio.is_speakerphone_on() {
                    self.transition_to(MachineState::ActiveSpeaker);
                }
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => self.fokus_verloren(),
            Command::SwitchFocus(_) => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_quiescent_earpiece(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) | Command::SpeakerOn | Command::SpeakerOff => {}
            Command::BluetoothAudioConnected => {
                warn!("Bluetooth-Audio im ruhenden Hoerer-Zustand verbunden");
                self.transition_to(MachineState::ActiveBluetooth);
            }
            Command::SwitchBluetooth { .. } => {
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentBluetooth);
            }
            Command::SwitchHeadset(_) => {
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentHeadset);
            }
            Command::ConnectDock | Command::SwitchSpeaker(_) => {
                self.transition_to(MachineState::QuiescentSpeaker);
            }
            Command::SwitchFocus(AudioFocus::ActiveFocus | AudioFocus::RingingFocus) => {
                self.transition_to(MachineState::ActiveEarpiece);
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => {
                self.collaborators.call_audio.notify_audio_operations_complete();
            }
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }
}
