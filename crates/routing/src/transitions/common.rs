//! Erste Stufe: gilt fuer jeden Zustand
//!
//! Pflegt die Routenmasken bei Hardware-Aenderungen, loest Baseline-Wechsel
//! auf und merkt sich den Fokus.

use callroute_core::{AudioFocus, Route, RouteMask};
use tracing::info;

use super::Disposition;
use crate::machine::RouteMachine;
use crate::message::{Command, SwitchOrigin};

impl RouteMachine {
    pub(crate) fn handle_common(&mut self, command: &Command) -> Disposition {
        let mut hinzugefuegt = RouteMask::NONE;
        let mut entfernt = RouteMask::NONE;
        let mut liste_geaendert = false;

        match command {
            Command::ConnectWiredHeadset => {
                info!("Kabel-Headset eingesteckt");
                entfernt.insert(Route::Earpiece);
                hinzugefuegt.insert(Route::WiredHeadset);
            }
            Command::DisconnectWiredHeadset => {
                info!("Kabel-Headset entfernt");
                entfernt.insert(Route::WiredHeadset);
                if self.earpiece_supported {
                    hinzugefuegt.insert(Route::Earpiece);
                }
            }
            Command::BluetoothActiveDevicePresent => {
                info!("Aktives Bluetooth-Geraet vorhanden");
            }
            Command::BluetoothActiveDeviceGone => {
                info!("Aktives Bluetooth-Geraet weg");
            }
            Command::BluetoothDeviceListChanged => {
                let geraete = self.collaborators.bluetooth.connected_devices();
                info!(anzahl = geraete.len(), "Bluetooth-Geraeteliste geaendert");
                if geraete.is_empty() {
                    entfernt.insert(Route::Bluetooth);
                } else {
                    hinzugefuegt.insert(Route::Bluetooth);
                }
                liste_geaendert = true;
            }
            Command::SwitchBaselineRoute {
                origin,
                include_bluetooth,
            } => {
                self.send_baseline(*origin, *include_bluetooth);
                return Disposition::Handled;
            }
            Command::SwitchBluetooth {
                origin: SwitchOrigin::User,
                ..
            } => {
                self.ctx.has_user_explicitly_left_bluetooth = false;
                return Disposition::NotHandled;
            }
            Command::SwitchFocus(fokus) => {
                self.fokus_merken(*fokus);
                return Disposition::NotHandled;
            }
            _ => return Disposition::NotHandled,
        }

        if !hinzugefuegt.is_empty() || !entfernt.is_empty() || liste_geaendert {
            let anruf_erlaubt = self.collaborators.current_call_supported_routes();
            self.ctx.routen_aendern(entfernt, hinzugefuegt, anruf_erlaubt);
            self.update_system_audio_state();
        }
        // Familien reagieren ebenfalls auf Hardware-Fakten
        Disposition::NotHandled
    }

    /// Hoergeraete-Cache beim Fokuswechsel und neuen Fokus merken
    fn fokus_merken(&mut self, neu: AudioFocus) {
        let alt = self.ctx.audio_focus;
        if alt != AudioFocus::NoFocus && neu == AudioFocus::NoFocus {
            self.collaborators.bluetooth.restore_hearing_aid_device();
        } else if alt == AudioFocus::NoFocus && neu != AudioFocus::NoFocus {
            self.collaborators.bluetooth.cache_hearing_aid_device();
        }
        info!(von = %alt, nach = %neu, "Fokus");
        self.ctx.audio_focus = neu;
    }
}
