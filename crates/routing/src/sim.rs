//! Simulierte Plattform
//!
//! Implementiert alle Kollaborateur-Traits mit einem gemeinsamen Zustand
//! und zeichnet jede Seitenwirkung auf. Wird von Tests und vom Daemon
//! genutzt. Steuermethoden aendern den Hardware-Zustand und geben das
//! passende [`PlatformEvent`] zurueck, das der Aufrufer weiterreicht.

use callroute_core::{BluetoothDevice, CallId, EventSink, PlatformEvent, RouteMask, RouteState};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, warn};

use crate::collaborators::{
    AudioService, BluetoothRouteManager, CallAudioManager, CallsManager, CommunicationDevice,
    ConnectionService, StatusBarNotifier, TrackedCall, WiredHeadsetManager,
};
use crate::error::CollaboratorError;

/// Aufgezeichnete Seitenwirkung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimAction {
    ConnectAudio(Option<String>),
    DisconnectAudio,
    CacheHearingAid,
    RestoreHearingAid,
    SetCommunicationDevice(CommunicationDevice),
    ClearCommunicationDevice(CommunicationDevice),
    SetMicrophoneMute(bool),
    NotifyMute(bool),
    NotifySpeakerphone(bool),
    RingerModeChange,
    AudioOperationsComplete,
    ClearSilencedCalls,
}

#[derive(Debug)]
struct SimZustand {
    hoerer: bool,
    headset_eingesteckt: bool,
    bt_geraete: Vec<BluetoothDevice>,
    bt_aktiv: Option<String>,
    bt_audio: Option<BluetoothDevice>,
    /// Offene SCO-Anforderung (`Some(None)` = beliebiges Geraet)
    bt_anforderung: Option<Option<String>>,
    inband: bool,
    mikrofon_stumm: bool,
    mute_fehler: bool,
    kommunikationsgeraet: Option<CommunicationDevice>,
    vordergrund_routen: Option<RouteMask>,
    videoanruf: bool,
    anrufe: bool,
    notruf: bool,
    verfolgte: Vec<TrackedCall>,
    veroeffentlichungen: Vec<(Option<RouteState>, RouteState)>,
    aktionen: Vec<SimAction>,
}

impl Default for SimZustand {
    fn default() -> Self {
        Self {
            hoerer: true,
            headset_eingesteckt: false,
            bt_geraete: Vec::new(),
            bt_aktiv: None,
            bt_audio: None,
            bt_anforderung: None,
            inband: false,
            mikrofon_stumm: false,
            mute_fehler: false,
            kommunikationsgeraet: None,
            vordergrund_routen: None,
            videoanruf: false,
            anrufe: false,
            notruf: false,
            verfolgte: Vec::new(),
            veroeffentlichungen: Vec::new(),
            aktionen: Vec::new(),
        }
    }
}

/// Simulierte Hardware und Call-Verwaltung
#[derive(Default)]
pub struct SimulatedPlatform {
    zustand: Mutex<SimZustand>,
    /// Ziel fuer automatische SCO-Bestaetigungen
    auto_sink: Mutex<Option<Weak<dyn EventSink>>>,
}

impl SimulatedPlatform {
    /// Telefon mit Hoerer, ohne Headset und Bluetooth
    pub fn neu() -> Self {
        Self::default()
    }

    /// Geraet ohne eingebauten Hoerer (z.B. Tablet)
    pub fn ohne_hoerer() -> Self {
        let sim = Self::default();
        sim.zustand.lock().hoerer = false;
        sim
    }

    fn aufzeichnen(&self, aktion: SimAction) {
        self.zustand.lock().aktionen.push(aktion);
    }

    // -----------------------------------------------------------------------
    // Steuerung
    // -----------------------------------------------------------------------

    /// SCO-Anforderungen automatisch bestaetigen und melden
    pub fn auto_bestaetigung(&self, sink: Weak<dyn EventSink>) {
        *self.auto_sink.lock() = Some(sink);
    }

    pub fn headset_einstecken(&self) -> PlatformEvent {
        self.zustand.lock().headset_eingesteckt = true;
        PlatformEvent::WiredHeadsetPlugged
    }

    pub fn headset_ziehen(&self) -> PlatformEvent {
        self.zustand.lock().headset_eingesteckt = false;
        PlatformEvent::WiredHeadsetUnplugged
    }

    /// Verbindet ein Bluetooth-Geraet (ohne Audio)
    pub fn bluetooth_verbinden(&self, device: BluetoothDevice) -> PlatformEvent {
        let mut zustand = self.zustand.lock();
        zustand.bt_geraete.retain(|d| d.address != device.address);
        zustand.bt_geraete.push(device);
        PlatformEvent::BluetoothDeviceListChanged
    }

    /// Trennt ein Bluetooth-Geraet, mit ihm faellt auch dessen Audio weg
    pub fn bluetooth_trennen(&self, address: &str) -> PlatformEvent {
        let mut zustand = self.zustand.lock();
        zustand.bt_geraete.retain(|d| d.address != address);
        if zustand.bt_audio.as_ref().map(|d| d.address.as_str()) == Some(address) {
            zustand.bt_audio = None;
        }
        if zustand.bt_aktiv.as_deref() == Some(address) {
            zustand.bt_aktiv = None;
        }
        PlatformEvent::BluetoothDeviceListChanged
    }

    /// Setzt oder entfernt das aktive Bluetooth-Geraet
    pub fn bluetooth_aktiv_setzen(&self, address: Option<&str>) -> PlatformEvent {
        self.zustand.lock().bt_aktiv = address.map(str::to_string);
        match address {
            Some(_) => PlatformEvent::BluetoothActiveDevicePresent,
            None => PlatformEvent::BluetoothActiveDeviceGone,
        }
    }

    /// Bestaetigt die offene SCO-Anforderung
    ///
    /// `None` wenn keine Anforderung offen ist oder das Geraet fehlt.
    pub fn bluetooth_audio_bestaetigen(&self) -> Option<PlatformEvent> {
        let mut zustand = self.zustand.lock();
        let anforderung = zustand.bt_anforderung.take()?;
        let geraet = match anforderung {
            Some(address) => zustand.bt_geraete.iter().find(|d| d.address == address),
            None => zustand.bt_geraete.first(),
        }?
        .clone();
        debug!(geraet = %geraet, "Simulierte SCO-Verbindung bestaetigt");
        zustand.bt_audio = Some(geraet);
        Some(PlatformEvent::BluetoothAudioConnected)
    }

    /// Geraet baut SCO von sich aus auf (z.B. Taste am Headset)
    ///
    /// Ohne Adresse wird das aktive, sonst das erste verbundene Geraet genommen.
    pub fn bluetooth_audio_herstellen(&self, address: Option<&str>) -> Option<PlatformEvent> {
        let mut zustand = self.zustand.lock();
        let ziel = address
            .map(str::to_string)
            .or_else(|| zustand.bt_aktiv.clone());
        let geraet = match ziel {
            Some(address) => zustand.bt_geraete.iter().find(|d| d.address == address),
            None => zustand.bt_geraete.first(),
        }?
        .clone();
        zustand.bt_anforderung = None;
        zustand.bt_audio = Some(geraet);
        Some(PlatformEvent::BluetoothAudioConnected)
    }

    /// SCO-Verbindung bricht von Geraeteseite ab
    pub fn bluetooth_audio_verlieren(&self) -> PlatformEvent {
        let mut zustand = self.zustand.lock();
        zustand.bt_audio = None;
        zustand.bt_anforderung = None;
        PlatformEvent::BluetoothAudioDisconnected
    }

    pub fn inband_setzen(&self, an: bool) {
        self.zustand.lock().inband = an;
    }

    /// Mikrofon von aussen umschalten (z.B. Hardware-Taste)
    pub fn mikrofon_extern_setzen(&self, stumm: bool) -> PlatformEvent {
        self.zustand.lock().mikrofon_stumm = stumm;
        PlatformEvent::MicrophoneMuteChanged
    }

    /// Lautsprecher von aussen umschalten
    pub fn lautsprecher_extern_setzen(&self, an: bool) -> PlatformEvent {
        let mut zustand = self.zustand.lock();
        if an {
            zustand.kommunikationsgeraet = Some(CommunicationDevice::BuiltinSpeaker);
        } else if zustand.kommunikationsgeraet == Some(CommunicationDevice::BuiltinSpeaker) {
            zustand.kommunikationsgeraet = None;
        }
        PlatformEvent::SpeakerphoneChanged
    }

    pub fn mute_fehler_setzen(&self, fehler: bool) {
        self.zustand.lock().mute_fehler = fehler;
    }

    pub fn anrufe_setzen(&self, vorhanden: bool) {
        self.zustand.lock().anrufe = vorhanden;
    }

    pub fn videoanruf_setzen(&self, video: bool) {
        self.zustand.lock().videoanruf = video;
    }

    pub fn notruf_setzen(&self, notruf: bool) {
        self.zustand.lock().notruf = notruf;
    }

    /// Routen des Vordergrund-Anrufs (`None` = kein Anruf)
    pub fn vordergrund_routen_setzen(&self, routen: Option<RouteMask>) {
        self.zustand.lock().vordergrund_routen = routen;
    }

    /// Verfolgt einen Anruf mit aufzeichnendem Verbindungsdienst
    pub fn anruf_verfolgen(&self, id: CallId) -> Arc<RecordingConnection> {
        let verbindung = Arc::new(RecordingConnection::default());
        self.zustand.lock().verfolgte.push(TrackedCall {
            id,
            connection: Some(verbindung.clone()),
        });
        verbindung
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn aktionen(&self) -> Vec<SimAction> {
        self.zustand.lock().aktionen.clone()
    }

    pub fn aktionen_leeren(&self) {
        self.zustand.lock().aktionen.clear();
    }

    /// Wie oft wurde `aktion` aufgezeichnet?
    pub fn anzahl(&self, aktion: &SimAction) -> usize {
        self.zustand
            .lock()
            .aktionen
            .iter()
            .filter(|a| *a == aktion)
            .count()
    }

    /// Alle Veroeffentlichungen als (alt, neu)
    pub fn veroeffentlichungen(&self) -> Vec<(Option<RouteState>, RouteState)> {
        self.zustand.lock().veroeffentlichungen.clone()
    }

    pub fn letzte_veroeffentlichung(&self) -> Option<RouteState> {
        self.zustand
            .lock()
            .veroeffentlichungen
            .last()
            .map(|(_, neu)| neu.clone())
    }

    pub fn mikrofon_stumm(&self) -> bool {
        self.zustand.lock().mikrofon_stumm
    }

    pub fn kommunikationsgeraet(&self) -> Option<CommunicationDevice> {
        self.zustand.lock().kommunikationsgeraet
    }

    pub fn bluetooth_geraete(&self) -> Vec<BluetoothDevice> {
        self.zustand.lock().bt_geraete.clone()
    }

    pub fn bluetooth_audio_geraet(&self) -> Option<BluetoothDevice> {
        self.zustand.lock().bt_audio.clone()
    }

    /// Offene SCO-Anforderung
    pub fn bluetooth_anforderung(&self) -> Option<Option<String>> {
        self.zustand.lock().bt_anforderung.clone()
    }

    fn auto_melden(&self, event: PlatformEvent) {
        let sink = self.auto_sink.lock().as_ref().and_then(Weak::upgrade);
        if let Some(sink) = sink {
            if let Err(e) = sink.senden(event) {
                warn!(fehler = %e, "Automatische Bluetooth-Meldung verworfen");
            }
        }
    }

    fn auto_aktiv(&self) -> bool {
        self.auto_sink.lock().is_some()
    }
}

// ---------------------------------------------------------------------------
// Kollaborateur-Traits
// ---------------------------------------------------------------------------

impl BluetoothRouteManager for SimulatedPlatform {
    fn is_bluetooth_available(&self) -> bool {
        !self.zustand.lock().bt_geraete.is_empty()
    }

    fn is_audio_connected_or_pending(&self) -> bool {
        let zustand = self.zustand.lock();
        zustand.bt_audio.is_some() || zustand.bt_anforderung.is_some()
    }

    fn is_inband_ringing_enabled(&self) -> bool {
        self.zustand.lock().inband
    }

    fn has_active_device(&self) -> bool {
        self.zustand.lock().bt_aktiv.is_some()
    }

    fn audio_connected_device(&self) -> Option<BluetoothDevice> {
        self.zustand.lock().bt_audio.clone()
    }

    fn connected_devices(&self) -> Vec<BluetoothDevice> {
        self.zustand.lock().bt_geraete.clone()
    }

    fn connect_audio(&self, address: Option<&str>) {
        {
            let mut zustand = self.zustand.lock();
            zustand
                .aktionen
                .push(SimAction::ConnectAudio(address.map(str::to_string)));
            let bereits = match (&zustand.bt_audio, address) {
                (Some(geraet), Some(adresse)) => geraet.address == adresse,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if bereits {
                return;
            }
            zustand.bt_anforderung = Some(address.map(str::to_string));
        }
        if self.auto_aktiv() {
            if let Some(event) = self.bluetooth_audio_bestaetigen() {
                self.auto_melden(event);
            }
        }
    }

    fn disconnect_audio(&self) {
        let hatte_audio = {
            let mut zustand = self.zustand.lock();
            zustand.aktionen.push(SimAction::DisconnectAudio);
            zustand.bt_anforderung = None;
            zustand.bt_audio.take().is_some()
        };
        if hatte_audio && self.auto_aktiv() {
            self.auto_melden(PlatformEvent::BluetoothAudioDisconnected);
        }
    }

    fn cache_hearing_aid_device(&self) {
        self.aufzeichnen(SimAction::CacheHearingAid);
    }

    fn restore_hearing_aid_device(&self) {
        self.aufzeichnen(SimAction::RestoreHearingAid);
    }
}

impl WiredHeadsetManager for SimulatedPlatform {
    fn is_plugged_in(&self) -> bool {
        self.zustand.lock().headset_eingesteckt
    }
}

impl AudioService for SimulatedPlatform {
    fn is_microphone_mute(&self) -> bool {
        self.zustand.lock().mikrofon_stumm
    }

    fn set_microphone_mute(&self, muted: bool) -> Result<(), CollaboratorError> {
        let mut zustand = self.zustand.lock();
        zustand.aktionen.push(SimAction::SetMicrophoneMute(muted));
        if zustand.mute_fehler {
            return Err(CollaboratorError::NichtErreichbar(
                "simulierter Audio-Dienst".to_string(),
            ));
        }
        zustand.mikrofon_stumm = muted;
        Ok(())
    }

    fn is_speakerphone_on(&self) -> bool {
        self.zustand.lock().kommunikationsgeraet == Some(CommunicationDevice::BuiltinSpeaker)
    }

    fn has_builtin_earpiece(&self) -> bool {
        self.zustand.lock().hoerer
    }

    fn set_communication_device(
        &self,
        device: CommunicationDevice,
    ) -> Result<bool, CollaboratorError> {
        let mut zustand = self.zustand.lock();
        zustand
            .aktionen
            .push(SimAction::SetCommunicationDevice(device));
        let vorhanden = match device {
            CommunicationDevice::BuiltinEarpiece => zustand.hoerer,
            CommunicationDevice::WiredHeadset => zustand.headset_eingesteckt,
            CommunicationDevice::BuiltinSpeaker => true,
        };
        if !vorhanden {
            return Err(CollaboratorError::GeraetFehlt(format!("{device:?}")));
        }
        zustand.kommunikationsgeraet = Some(device);
        Ok(true)
    }

    fn clear_communication_device(&self, device: CommunicationDevice) {
        let mut zustand = self.zustand.lock();
        zustand
            .aktionen
            .push(SimAction::ClearCommunicationDevice(device));
        if zustand.kommunikationsgeraet == Some(device) {
            zustand.kommunikationsgeraet = None;
        }
    }
}

impl CallsManager for SimulatedPlatform {
    fn foreground_call_supported_routes(&self) -> Option<RouteMask> {
        self.zustand.lock().vordergrund_routen
    }

    fn has_video_call(&self) -> bool {
        self.zustand.lock().videoanruf
    }

    fn has_any_calls(&self) -> bool {
        self.zustand.lock().anrufe
    }

    fn is_in_emergency_call(&self) -> bool {
        self.zustand.lock().notruf
    }

    fn on_call_audio_state_changed(&self, old: Option<&RouteState>, new: &RouteState) {
        self.zustand
            .lock()
            .veroeffentlichungen
            .push((old.cloned(), new.clone()));
    }

    fn tracked_calls(&self) -> Vec<TrackedCall> {
        self.zustand.lock().verfolgte.clone()
    }
}

impl StatusBarNotifier for SimulatedPlatform {
    fn notify_mute(&self, muted: bool) {
        self.aufzeichnen(SimAction::NotifyMute(muted));
    }

    fn notify_speakerphone(&self, on: bool) {
        self.aufzeichnen(SimAction::NotifySpeakerphone(on));
    }
}

impl CallAudioManager for SimulatedPlatform {
    fn on_ringer_mode_change(&self) {
        self.aufzeichnen(SimAction::RingerModeChange);
    }

    fn notify_audio_operations_complete(&self) {
        self.aufzeichnen(SimAction::AudioOperationsComplete);
    }

    fn clear_silenced_calls(&self) {
        self.aufzeichnen(SimAction::ClearSilencedCalls);
    }
}

/// Verbindungsdienst der jeden gemeldeten Zustand speichert
#[derive(Debug, Default)]
pub struct RecordingConnection {
    zustaende: Mutex<Vec<(CallId, RouteState)>>,
}

impl RecordingConnection {
    pub fn zustaende(&self) -> Vec<(CallId, RouteState)> {
        self.zustaende.lock().clone()
    }
}

impl ConnectionService for RecordingConnection {
    fn on_call_audio_state_changed(&self, call: CallId, state: &RouteState) {
        self.zustaende.lock().push((call, state.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bluetooth_anforderung_und_bestaetigung() {
        let sim = SimulatedPlatform::neu();
        sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
        assert!(sim.is_bluetooth_available());

        sim.connect_audio(None);
        assert!(sim.is_audio_connected_or_pending());
        assert!(sim.audio_connected_device().is_none());

        assert_eq!(
            sim.bluetooth_audio_bestaetigen(),
            Some(PlatformEvent::BluetoothAudioConnected)
        );
        assert_eq!(sim.audio_connected_device().unwrap().address, "AA:01");
        assert!(sim.bluetooth_audio_bestaetigen().is_none());
    }

    #[test]
    fn geraet_baut_audio_selbst_auf() {
        let sim = SimulatedPlatform::neu();
        assert!(sim.bluetooth_audio_herstellen(None).is_none());

        sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
        sim.bluetooth_verbinden(BluetoothDevice::neu("AA:02"));
        sim.bluetooth_aktiv_setzen(Some("AA:02"));
        assert_eq!(
            sim.bluetooth_audio_herstellen(None),
            Some(PlatformEvent::BluetoothAudioConnected)
        );
        assert_eq!(sim.bluetooth_audio_geraet().unwrap().address, "AA:02");
        assert!(sim.bluetooth_audio_herstellen(Some("BB:00")).is_none());
    }

    #[test]
    fn trennen_entfernt_audio() {
        let sim = SimulatedPlatform::neu();
        sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
        sim.connect_audio(Some("AA:01"));
        sim.bluetooth_audio_bestaetigen();
        sim.bluetooth_trennen("AA:01");
        assert!(sim.audio_connected_device().is_none());
        assert!(!sim.is_bluetooth_available());
    }

    #[test]
    fn kommunikationsgeraet_ohne_headset_fehlt() {
        let sim = SimulatedPlatform::neu();
        assert!(sim
            .set_communication_device(CommunicationDevice::WiredHeadset)
            .is_err());
        assert_eq!(
            sim.set_communication_device(CommunicationDevice::BuiltinSpeaker),
            Ok(true)
        );
        assert!(sim.is_speakerphone_on());
        sim.clear_communication_device(CommunicationDevice::BuiltinEarpiece);
        assert!(sim.is_speakerphone_on());
    }

    #[test]
    fn mute_fehler_meldet_fehler() {
        let sim = SimulatedPlatform::neu();
        sim.mute_fehler_setzen(true);
        assert!(sim.set_microphone_mute(true).is_err());
        assert!(!sim.is_microphone_mute());
    }
}
