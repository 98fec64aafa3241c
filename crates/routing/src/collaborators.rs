//! Schnittstellen zu externen Kollaborateuren
//!
//! Der Automat kennt Bluetooth-Stack, Headset-Erkennung, Audio-Dienst,
//! Call-Lifecycle-Manager und Statusleiste nur ueber diese Traits. Alle
//! Methoden werden vom Automaten-Thread aus aufgerufen; blockierende
//! Aufrufe des Audio-Dienstes laufen ueber den Hardware-Executor.

use callroute_core::{BluetoothDevice, CallId, RouteMask, RouteState};
use std::sync::Arc;

use crate::error::CollaboratorError;

/// Geraete die als Kommunikationsgeraet registriert werden koennen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommunicationDevice {
    BuiltinEarpiece,
    WiredHeadset,
    BuiltinSpeaker,
}

/// Bluetooth-Routenverwaltung (Geraeteliste, SCO-Verbindung)
pub trait BluetoothRouteManager: Send + Sync {
    /// Ist mindestens ein HFP-faehiges Geraet verbunden?
    fn is_bluetooth_available(&self) -> bool;

    /// Ist eine SCO-Verbindung aufgebaut oder im Aufbau?
    fn is_audio_connected_or_pending(&self) -> bool;

    fn is_inband_ringing_enabled(&self) -> bool;

    /// Gibt es ein aktives Bluetooth-Geraet?
    fn has_active_device(&self) -> bool;

    /// Geraet mit bestaetigter SCO-Verbindung
    fn audio_connected_device(&self) -> Option<BluetoothDevice>;

    fn connected_devices(&self) -> Vec<BluetoothDevice>;

    fn is_watch(&self, device: &BluetoothDevice) -> bool {
        device.ist_uhr()
    }

    /// Baut die SCO-Verbindung auf (`None` = beliebiges Geraet)
    ///
    /// Das Ergebnis kommt spaeter asynchron als
    /// `BluetoothAudioConnected` bzw. `BluetoothAudioDisconnected`.
    fn connect_audio(&self, address: Option<&str>);

    fn disconnect_audio(&self);

    fn cache_hearing_aid_device(&self);

    fn restore_hearing_aid_device(&self);
}

/// Erkennung des Kabel-Headsets
pub trait WiredHeadsetManager: Send + Sync {
    fn is_plugged_in(&self) -> bool;
}

/// Audio-Dienst des Betriebssystems
pub trait AudioService: Send + Sync {
    fn is_microphone_mute(&self) -> bool;

    /// Setzt die Mikrofon-Stummschaltung (potentiell blockierender RPC)
    fn set_microphone_mute(&self, muted: bool) -> Result<(), CollaboratorError>;

    /// Ist der Lautsprecher als Kommunikationsgeraet gesetzt?
    fn is_speakerphone_on(&self) -> bool;

    /// Hat das Geraet einen eingebauten Hoerer?
    fn has_builtin_earpiece(&self) -> bool;

    /// Registriert ein Kommunikationsgeraet, `Ok(true)` bei Erfolg
    fn set_communication_device(
        &self,
        device: CommunicationDevice,
    ) -> Result<bool, CollaboratorError>;

    /// Entfernt das Kommunikationsgeraet falls es `device` ist
    fn clear_communication_device(&self, device: CommunicationDevice);
}

/// Verbindungsdienst eines einzelnen Anrufs
pub trait ConnectionService: Send + Sync {
    fn on_call_audio_state_changed(&self, call: CallId, state: &RouteState);
}

/// Vom Call-Lifecycle-Manager verfolgter Anruf
#[derive(Clone)]
pub struct TrackedCall {
    pub id: CallId,
    pub connection: Option<Arc<dyn ConnectionService>>,
}

impl std::fmt::Debug for TrackedCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedCall")
            .field("id", &self.id)
            .field("connection", &self.connection.is_some())
            .finish()
    }
}

/// Call-Lifecycle-Manager
pub trait CallsManager: Send + Sync {
    /// Routen die der Vordergrund-Anruf erlaubt (`None` = kein Anruf)
    fn foreground_call_supported_routes(&self) -> Option<RouteMask>;

    fn has_video_call(&self) -> bool;

    fn has_any_calls(&self) -> bool;

    fn is_in_emergency_call(&self) -> bool;

    /// Wird bei jeder Veroeffentlichung mit altem und neuem Zustand aufgerufen
    fn on_call_audio_state_changed(&self, old: Option<&RouteState>, new: &RouteState);

    fn tracked_calls(&self) -> Vec<TrackedCall>;
}

/// Statusleiste
pub trait StatusBarNotifier: Send + Sync {
    fn notify_mute(&self, muted: bool);
    fn notify_speakerphone(&self, on: bool);
}

/// Uebergeordnete Audio-Verwaltung der Anrufe
pub trait CallAudioManager: Send + Sync {
    fn on_ringer_mode_change(&self);
    fn notify_audio_operations_complete(&self);
    fn clear_silenced_calls(&self);
}

/// Alle Kollaborateure des Automaten
#[derive(Clone)]
pub struct Collaborators {
    pub bluetooth: Arc<dyn BluetoothRouteManager>,
    pub wired_headset: Arc<dyn WiredHeadsetManager>,
    pub audio: Arc<dyn AudioService>,
    pub calls: Arc<dyn CallsManager>,
    pub status_bar: Arc<dyn StatusBarNotifier>,
    pub call_audio: Arc<dyn CallAudioManager>,
}

impl Collaborators {
    /// Alle Rollen von einer einzigen Implementierung (z.B. Simulator)
    pub fn aus_plattform<P>(plattform: Arc<P>) -> Self
    where
        P: BluetoothRouteManager
            + WiredHeadsetManager
            + AudioService
            + CallsManager
            + StatusBarNotifier
            + CallAudioManager
            + 'static,
    {
        Self {
            bluetooth: plattform.clone(),
            wired_headset: plattform.clone(),
            audio: plattform.clone(),
            calls: plattform.clone(),
            status_bar: plattform.clone(),
            call_audio: plattform,
        }
    }

    /// Routen die der aktuelle Anruf erlaubt (ohne Anruf: alle)
    pub fn current_call_supported_routes(&self) -> RouteMask {
        match self.calls.foreground_call_supported_routes() {
            Some(mask) => RouteMask::ALL.intersection(mask),
            None => RouteMask::ALL,
        }
    }
}
