//! Kabel-Headset-Familie

use callroute_core::{AudioFocus, Route};
use tracing::{error, info, warn};

use super::Disposition;
use crate::collaborators::CommunicationDevice;
use crate::machine::RouteMachine;
use crate::message::{Command, SwitchOrigin};
use crate::states::MachineState;

impl RouteMachine {
    pub(crate) fn handle_headset_family(
        &mut self,
        zustand: MachineState,
        command: &Command,
    ) -> Disposition {
        match command {
            Command::ConnectWiredHeadset => {
                error!(zustand = %zustand, "Kabel-Headset sollte bereits verbunden sein");
            }
            Command::BluetoothActiveDevicePresent => {
                if self.ctx.has_user_explicitly_left_bluetooth {
                    info!("Benutzer hat Bluetooth verlassen, bleibe beim Headset");
                } else {
                    self.send_internal(Command::SwitchBluetooth {
                        origin: SwitchOrigin::Derived,
                        address: None,
                    });
                }
            }
            Command::DisconnectWiredHeadset => {
                if self.ctx.was_on_speaker {
                    self.set_speakerphone_on(true);
                    self.send_internal(Command::SwitchSpeaker(SwitchOrigin::Derived));
                } else {
                    self.send_internal(Command::SwitchBaselineRoute {
                        origin: SwitchOrigin::Derived,
                        include_bluetooth: true,
                    });
                }
            }
            Command::StreamingForceEnabled => self.transition_to(MachineState::Streaming),
            Command::StreamingForceDisabled => {
                info!(zustand = %zustand, "Kein Streaming aktiv, nichts zu beenden");
            }
            Command::BluetoothActiveDeviceGone
            | Command::BluetoothAudioDisconnected
            | Command::BluetoothDeviceListChanged
            | Command::ConnectDock
            | Command::DisconnectDock => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_active_headset(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) => {
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveEarpiece);
            }
            Command::BluetoothAudioConnected => self.transition_to(MachineState::ActiveBluetooth),
            Command::SwitchBluetooth { address, .. } => {
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    return self.route_nicht_verfuegbar(command);
                }
                if self.ctx.audio_focus == AudioFocus::ActiveFocus
                    || self.collaborators.bluetooth.is_inband_ringing_enabled()
                {
                    self.clear_communication_device(CommunicationDevice::WiredHeadset);
                    self.set_bluetooth_on(address.as_deref());
                } else {
                    self.transition_to(MachineState::RingingBluetooth);
                }
            }
            Command::SwitchHeadset(_) | Command::SpeakerOff => {}
            Command::SwitchSpeaker(_) => {
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

    pub(crate) fn handle_quiescent_headset(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) => {
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentEarpiece);
            }
            Command::BluetoothAudioConnected => {
                warn!("Bluetooth-Audio im ruhenden Headset-Zustand verbunden");
                self.transition_to(MachineState::ActiveBluetooth);
            }
            Command::SwitchBluetooth { .. } => {
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentBluetooth);
            }
            Command::SwitchHeadset(_) | Command::SpeakerOn | Command::SpeakerOff => {}
            Command::SwitchSpeaker(_) => self.transition_to(MachineState::QuiescentSpeaker),
            Command::SwitchFocus(AudioFocus::ActiveFocus | AudioFocus::RingingFocus) => {
                self.transition_to(MachineState::ActiveHeadset);
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => {
                self.collaborators.call_audio.notify_audio_operations_complete();
            }
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }
}
