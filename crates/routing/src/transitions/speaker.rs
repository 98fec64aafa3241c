//! Lautsprecher-Familie

use callroute_core::{AudioFocus, Route};
use tracing::{info, warn};

use super::Disposition;
use crate::machine::RouteMachine;
use crate::message::{Command, SwitchOrigin};
use crate::states::MachineState;

impl RouteMachine {
    pub(crate) fn handle_speaker_family(
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
                    info!("Benutzer hat Bluetooth verlassen, bleibe beim Lautsprecher");
                } else {
                    self.send_internal(Command::SwitchBluetooth {
                        origin: SwitchOrigin::Derived,
                        address: None,
                    });
                }
            }
            Command::DisconnectDock => self.baseline_mit_bluetooth(),
            Command::StreamingForceEnabled => self.transition_to(MachineState::Streaming),
            Command::StreamingForceDisabled => {
                info!(zustand = %zustand, "Kein Streaming aktiv, nichts zu beenden");
            }
            Command::BluetoothActiveDeviceGone
            | Command::DisconnectWiredHeadset
            | Command::BluetoothAudioDisconnected
            | Command::BluetoothDeviceListChanged
            | Command::ConnectDock => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    fn baseline_mit_bluetooth(&self) {
        self.send_internal(Command::SwitchBaselineRoute {
            origin: SwitchOrigin::Derived,
            include_bluetooth: true,
        });
    }

    fn lautsprecher_verlassen(&mut self, origin: SwitchOrigin) {
        if origin.ist_benutzer() {
            self.ctx.was_on_speaker = false;
        }
    }

    pub(crate) fn handle_active_speaker(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(origin) => {
                self.lautsprecher_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveEarpiece);
            }
            Command::BluetoothAudioConnected => self.transition_to(MachineState::ActiveBluetooth),
            Command::SwitchBluetooth { origin, address } => {
                self.lautsprecher_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    return self.route_nicht_verfuegbar(command);
                }
                if self.ctx.audio_focus == AudioFocus::ActiveFocus
                    || self.collaborators.bluetooth.is_inband_ringing_enabled()
                {
                    self.set_bluetooth_on(address.as_deref());
                } else {
                    self.transition_to(MachineState::RingingBluetooth);
                }
            }
            Command::SwitchHeadset(origin) => {
                self.lautsprecher_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveHeadset);
            }
            Command::SwitchSpeaker(_) | Command::SpeakerOn => {}
            Command::SpeakerOff => {
                // Von aussen abgeschaltet und kein Bluetooth unterwegs
                if !self.collaborators.bluetooth.is_audio_connected_or_pending()
                    && !self.collaborators.audio.is_speakerphone_on()
                {
                    self.baseline_mit_bluetooth();
                }
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => self.fokus_verloren(),
            Command::SwitchFocus(_) => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_quiescent_speaker(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) => {
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentEarpiece);
            }
            Command::BluetoothAudioConnected => {
                warn!("Bluetooth-Audio im ruhenden Lautsprecher-Zustand verbunden");
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
            Command::SwitchSpeaker(_) | Command::SpeakerOn => {}
            Command::SpeakerOff => {
                if !self.collaborators.audio.is_speakerphone_on() {
                    self.baseline_mit_bluetooth();
                }
            }
            Command::SwitchFocus(AudioFocus::ActiveFocus | AudioFocus::RingingFocus) => {
                self.set_speakerphone_on(true);
                self.transition_to(MachineState::ActiveSpeaker);
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => {
                self.collaborators.call_audio.notify_audio_operations_complete();
            }
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }
}
