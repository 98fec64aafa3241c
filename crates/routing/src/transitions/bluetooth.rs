//! Bluetooth-Familie
//!
//! Ein Wechsel zu Bluetooth ist zweiphasig: erst wird die SCO-Verbindung
//! angefordert, erst `BluetoothAudioConnected` fuehrt in `ActiveBluetooth`.

use callroute_core::{AudioFocus, Route};
use tracing::{info, warn};

use super::Disposition;
use crate::machine::RouteMachine;
use crate::message::{Command, SwitchOrigin};
use crate::states::MachineState;

impl RouteMachine {
    pub(crate) fn handle_bluetooth_family(
        &mut self,
        zustand: MachineState,
        command: &Command,
    ) -> Disposition {
        match command {
            Command::ConnectWiredHeadset => {
                self.send_internal(Command::SwitchHeadset(SwitchOrigin::Derived));
            }
            Command::BluetoothActiveDevicePresent => {
                warn!(zustand = %zustand, "Aktives Bluetooth-Geraet haette im Bluetooth-Zustand nicht fehlen duerfen");
            }
            Command::BluetoothActiveDeviceGone => {
                self.handle_bt_initiated_disconnect(zustand);
                self.ctx.was_on_speaker = false;
            }
            Command::BluetoothDeviceListChanged => {
                if !self.ctx.available_routes.contains(Route::Bluetooth) {
                    info!("Letztes Bluetooth-Geraet getrennt");
                    self.handle_bt_initiated_disconnect(zustand);
                }
            }
            Command::DisconnectWiredHeadset | Command::ConnectDock | Command::DisconnectDock => {}
            Command::StreamingForceEnabled => self.transition_to(MachineState::Streaming),
            Command::StreamingForceDisabled => {
                info!(zustand = %zustand, "Kein Streaming aktiv, nichts zu beenden");
            }
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    /// Bluetooth hat die Verbindung von sich aus beendet
    ///
    /// Aus `ActiveBluetooth` wird direkt in den aktiven Zielzustand
    /// gewechselt, sonst ueber eine interne Baseline-Nachricht.
    fn handle_bt_initiated_disconnect(&mut self, zustand: MachineState) {
        if zustand != MachineState::ActiveBluetooth {
            self.send_internal(Command::SwitchBaselineRoute {
                origin: SwitchOrigin::Derived,
                include_bluetooth: false,
            });
            return;
        }
        match self.calculate_baseline(false, false) {
            Route::Earpiece => self.transition_to(MachineState::ActiveEarpiece),
            Route::WiredHeadset => self.transition_to(MachineState::ActiveHeadset),
            Route::Speaker => {
                self.set_speakerphone_on(true);
                self.transition_to(MachineState::ActiveSpeaker);
            }
            andere => {
                warn!(route = %andere, "Unerwartete Baseline nach Bluetooth-Trennung");
                self.send_internal(Command::SwitchBaselineRoute {
                    origin: SwitchOrigin::Derived,
                    include_bluetooth: false,
                });
            }
        }
    }

    fn bluetooth_verlassen(&mut self, origin: SwitchOrigin) {
        if origin.ist_benutzer() {
            self.ctx.has_user_explicitly_left_bluetooth = true;
        }
    }

    pub(crate) fn handle_active_bluetooth(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(origin) => {
                self.bluetooth_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.set_bluetooth_off();
                self.transition_to(MachineState::ActiveEarpiece);
            }
            Command::BluetoothAudioConnected => {
                self.collaborators.call_audio.on_ringer_mode_change();
                self.update_system_audio_state();
            }
            Command::SwitchBluetooth { address, .. } => self.set_bluetooth_on(address.as_deref()),
            Command::SwitchHeadset(origin) => {
                self.bluetooth_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.set_bluetooth_off();
                self.transition_to(MachineState::ActiveHeadset);
            }
            Command::SwitchSpeaker(origin) => {
                self.bluetooth_verlassen(*origin);
                self.set_speakerphone_on(true);
                self.set_bluetooth_off();
                self.transition_to(MachineState::ActiveSpeaker);
            }
            Command::SpeakerOn => {
                if self.collaborators.audio.is_speakerphone_on() {
                    self.set_bluetooth_off();
                    self.transition_to(MachineState::ActiveSpeaker);
                }
            }
            Command::SpeakerOff => {}
            Command::SwitchFocus(AudioFocus::NoFocus) => {
                self.collaborators.bluetooth.disconnect_audio();
                self.fokus_verloren();
            }
            Command::SwitchFocus(AudioFocus::RingingFocus) => {
                if !self.collaborators.bluetooth.is_inband_ringing_enabled() {
                    self.set_bluetooth_off();
                    self.transition_to(MachineState::RingingBluetooth);
                }
            }
            Command::SwitchFocus(AudioFocus::ActiveFocus) => {}
            Command::BluetoothAudioDisconnected => {
                self.handle_bt_initiated_disconnect(MachineState::ActiveBluetooth)
            }
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_ringing_bluetooth(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(origin) => {
                self.bluetooth_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveEarpiece);
            }
            Command::BluetoothAudioConnected => self.transition_to(MachineState::ActiveBluetooth),
            Command::SwitchBluetooth { .. } => {}
            Command::SwitchHeadset(origin) => {
                self.bluetooth_verlassen(*origin);
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::ActiveHeadset);
            }
            Command::SwitchSpeaker(origin) => {
                self.bluetooth_verlassen(*origin);
                self.set_speakerphone_on(true);
                self.transition_to(MachineState::ActiveSpeaker);
            }
            Command::SpeakerOn => {
                if self.collaborators.audio.is_speakerphone_on() {
                    self.transition_to(MachineState::ActiveSpeaker);
                }
            }
            Command::SpeakerOff | Command::BluetoothAudioDisconnected => {}
            Command::SwitchFocus(AudioFocus::NoFocus) => self.fokus_verloren(),
            // Anruf angenommen: SCO aufbauen, Wechsel erst bei Bestaetigung
            Command::SwitchFocus(AudioFocus::ActiveFocus) => self.set_bluetooth_on(None),
            Command::SwitchFocus(AudioFocus::RingingFocus) => {}
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }

    pub(crate) fn handle_quiescent_bluetooth(&mut self, command: &Command) -> Disposition {
        match command {
            Command::SwitchEarpiece(_) => {
                if !self.ctx.available_routes.contains(Route::Earpiece) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentEarpiece);
            }
            Command::BluetoothAudioConnected => self.transition_to(MachineState::ActiveBluetooth),
            Command::SwitchBluetooth { .. }
            | Command::SpeakerOn
            | Command::SpeakerOff
            | Command::BluetoothAudioDisconnected => {}
            Command::SwitchHeadset(_) => {
                if !self.ctx.available_routes.contains(Route::WiredHeadset) {
                    return self.route_nicht_verfuegbar(command);
                }
                self.transition_to(MachineState::QuiescentHeadset);
            }
            Command::SwitchSpeaker(_) => self.transition_to(MachineState::QuiescentSpeaker),
            Command::SwitchFocus(AudioFocus::ActiveFocus) => {
                self.transition_to(MachineState::ActiveBluetooth)
            }
            Command::SwitchFocus(AudioFocus::RingingFocus) => {
                if self.collaborators.bluetooth.is_inband_ringing_enabled() {
                    self.set_bluetooth_on(None);
                } else {
                    self.transition_to(MachineState::RingingBluetooth);
                }
            }
            Command::SwitchFocus(AudioFocus::NoFocus) => self.fokus_verloren(),
            _ => return Disposition::NotHandled,
        }
        Disposition::Handled
    }
}
