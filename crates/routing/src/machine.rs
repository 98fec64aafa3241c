//! Der Routing-Automat
//!
//! Verarbeitet genau eine Nachricht nach der anderen (run-to-completion).
//! Jede Nachricht laeuft durch drei Stufen: gemeinsame Behandlung,
//! Familien-Behandlung, konkreter Zustand. Was keine Stufe behandelt,
//! landet bei den zustandsunabhaengigen Kommandos. Zustandswechsel werden
//! vorgemerkt und erst nach der Behandlung ausgefuehrt (Exit, dann Enter).
//!
//! Der Automat selbst ist nicht thread-sicher. [`crate::CallAudioRouter`]
//! betreibt ihn auf einem eigenen Thread, Tests treiben ihn direkt mit
//! [`RouteMachine::run_until_idle`].

use callroute_core::{Route, RouteState};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn};

use crate::baseline::{self, BaselineInputs};
use crate::collaborators::{Collaborators, CommunicationDevice};
use crate::config::{EarpieceControl, RouterConfig};
use crate::context::RouteContext;
use crate::error::{RoutingError, RoutingResult};
use crate::executor::HardwareExecutor;
use crate::message::{Command, Message, SwitchOrigin};
use crate::publisher::{PublishedStates, Publisher, StatePair};
use crate::queue::MessageQueue;
use crate::states::MachineState;
use crate::stats::MachineStats;

// ---------------------------------------------------------------------------
// MachineView
// ---------------------------------------------------------------------------

/// Von aussen lesbare Sicht auf den Automaten
///
/// Wird nach jeder Nachricht aktualisiert.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MachineView {
    pub state: Option<MachineState>,
    pub context: RouteContext,
    /// Zuletzt verarbeitete Nachrichten, aelteste zuerst
    pub history: Vec<String>,
}

/// Baut den Text fuer `dump()`
pub fn dump_erstellen(view: &MachineView, paar: &StatePair, wartend: &[String]) -> String {
    let mut text = String::new();
    let zustand = view.state.map(|s| s.name()).unwrap_or("-");
    let _ = writeln!(text, "Aktueller Zustand: {zustand}");
    let _ = writeln!(text, "Versteckte Werte: {}", view.context);
    for (label, state) in [("Aktueller Audio-Zustand", &paar.current), ("Zuletzt veroeffentlicht", &paar.last_known)] {
        match state {
            Some(state) => {
                let _ = writeln!(text, "{label}: {state}");
            }
            None => {
                let _ = writeln!(text, "{label}: -");
            }
        }
    }
    let _ = writeln!(text, "Letzte Nachrichten ({}):", view.history.len());
    for eintrag in &view.history {
        let _ = writeln!(text, "  {eintrag}");
    }
    let _ = writeln!(text, "Wartende Nachrichten ({}):", wartend.len());
    for eintrag in wartend {
        let _ = writeln!(text, "  {eintrag}");
    }
    text
}

// ---------------------------------------------------------------------------
// RouteMachine
// ---------------------------------------------------------------------------

/// Zustandsautomat fuer das Anruf-Audio-Routing
pub struct RouteMachine {
    pub(crate) config: RouterConfig,
    pub(crate) collaborators: Collaborators,
    pub(crate) executor: Arc<HardwareExecutor>,
    pub(crate) queue: Arc<MessageQueue>,
    pub(crate) publisher: Publisher,
    pub(crate) stats: Arc<MachineStats>,
    pub(crate) view: Arc<Mutex<MachineView>>,
    pub(crate) ctx: RouteContext,
    pub(crate) state: Option<MachineState>,
    pub(crate) earpiece_supported: bool,
    pending_transition: Option<MachineState>,
    history: VecDeque<String>,
}

impl RouteMachine {
    /// Erstellt einen nicht initialisierten Automaten
    pub fn neu(config: RouterConfig, collaborators: Collaborators) -> RoutingResult<Self> {
        let executor = Arc::new(HardwareExecutor::neu(config.hardware_executor)?);
        let stats = Arc::new(MachineStats::default());
        let publisher = Publisher::neu(
            Arc::new(PublishedStates::neu()),
            collaborators.clone(),
            Arc::clone(&stats),
        );
        let earpiece_supported = match config.earpiece {
            EarpieceControl::ForceDisabled => false,
            EarpieceControl::ForceEnabled => true,
            EarpieceControl::AutoDetect => collaborators.audio.has_builtin_earpiece(),
        };
        info!(
            hoerer = earpiece_supported,
            executor = ?config.hardware_executor,
            "Routing-Automat erstellt"
        );

        Ok(Self {
            config,
            collaborators,
            executor,
            queue: Arc::new(MessageQueue::neu()),
            publisher,
            stats,
            view: Arc::new(Mutex::new(MachineView::default())),
            ctx: RouteContext::default(),
            state: None,
            earpiece_supported,
            pending_transition: None,
            history: VecDeque::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Oeffentliche API (Tests und Router)
    // -----------------------------------------------------------------------

    /// Initialisiert mit `initial` oder einem aus der Hardware abgeleiteten Zustand
    pub fn initialize(&mut self, initial: Option<RouteState>) -> RoutingResult<()> {
        if self.state.is_some() {
            return Err(RoutingError::BereitsInitialisiert);
        }
        let start = match initial {
            Some(state) => state,
            None => self.initial_audio_state(),
        };
        if !start.route_ist_unterstuetzt() {
            warn!(start = %start, "Startroute liegt nicht in der Maske");
        }

        let anruf_erlaubt = self.collaborators.current_call_supported_routes();
        self.ctx.device_supported_routes = start.supported_routes;
        self.ctx.available_routes = start.supported_routes.intersection(anruf_erlaubt);
        self.ctx.muted = start.muted;
        self.ctx.was_on_speaker = false;
        self.publisher.states().beide_setzen(start.clone());
        self.collaborators.status_bar.notify_mute(start.muted);

        let zustand = MachineState::quiescent_for(start.route);
        info!(zustand = %zustand, start = %start, "Routing-Automat initialisiert");
        self.enter(zustand);
        self.stats.aktiv_setzen(zustand.is_active());
        self.apply_pending_transition();
        self.ansicht_aktualisieren();
        Ok(())
    }

    /// Reiht ein Kommando von aussen hinten ein
    pub fn send(&self, command: Command) -> RoutingResult<()> {
        self.queue.push_back(Message::neu(command))
    }

    /// Verarbeitet alle wartenden Nachrichten, gibt deren Anzahl zurueck
    pub fn run_until_idle(&mut self) -> usize {
        let mut anzahl = 0;
        while let Some(message) = self.queue.try_pop() {
            self.process(message);
            self.queue.verarbeitung_beendet();
            anzahl += 1;
        }
        anzahl
    }

    pub fn state(&self) -> Option<MachineState> {
        self.state
    }

    pub fn context(&self) -> &RouteContext {
        &self.ctx
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn current_audio_state(&self) -> Option<RouteState> {
        self.publisher.states().current()
    }

    pub fn last_known_audio_state(&self) -> Option<RouteState> {
        self.publisher.states().last_known()
    }

    pub fn is_in_active_state(&self) -> bool {
        match self.state {
            Some(state) => state.is_active(),
            None => {
                warn!("Kein aktueller Zustand, nehme inaktiv an");
                false
            }
        }
    }

    pub fn dump(&self) -> String {
        let view = self.view.lock().clone();
        dump_erstellen(&view, &self.publisher.states().snapshot(), &self.queue.snapshot())
    }

    pub fn queue(&self) -> &Arc<MessageQueue> {
        &self.queue
    }

    pub fn published(&self) -> &Arc<PublishedStates> {
        self.publisher.states()
    }

    pub fn stats(&self) -> &Arc<MachineStats> {
        &self.stats
    }

    pub fn view(&self) -> &Arc<Mutex<MachineView>> {
        &self.view
    }

    pub fn executor(&self) -> &Arc<HardwareExecutor> {
        &self.executor
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    // -----------------------------------------------------------------------
    // Nachrichtenverarbeitung
    // -----------------------------------------------------------------------

    /// Verarbeitet eine einzelne Nachricht vollstaendig
    ///
    /// Ein panic im Handler verwirft nur diese Nachricht.
    pub fn process(&mut self, message: Message) {
        let span = info_span!(
            "nachricht",
            session = %message.session.kurz(),
            code = %message.command.code()
        );
        let _guard = span.enter();
        self.stats.nachricht();

        let Some(zustand) = self.state else {
            warn!("Nachricht vor Initialisierung verworfen");
            self.stats.verworfen(1);
            return;
        };
        debug!(
            zustand = %zustand,
            arg = message.command.arg(),
            intern = message.intern,
            "Verarbeite Nachricht"
        );
        self.historie_eintragen(zustand, &message);

        let ergebnis = catch_unwind(AssertUnwindSafe(|| {
            self.dispatch(zustand, message.command);
            self.apply_pending_transition();
        }));
        if let Err(panic) = ergebnis {
            self.pending_transition = None;
            self.stats.handler_fehler();
            error!(
                zustand = %zustand,
                grund = %panic_text(panic.as_ref()),
                "Handler abgebrochen, Nachricht verworfen"
            );
        }
        self.ansicht_aktualisieren();
    }

    /// Merkt einen Zustandswechsel fuer das Ende der Behandlung vor
    pub(crate) fn transition_to(&mut self, ziel: MachineState) {
        self.pending_transition = Some(ziel);
    }

    fn apply_pending_transition(&mut self) {
        while let Some(ziel) = self.pending_transition.take() {
            match self.state {
                Some(aktuell) if aktuell == ziel => {
                    debug!(zustand = %ziel, "Wechsel in den aktuellen Zustand ignoriert");
                }
                Some(aktuell) => {
                    self.exit(aktuell);
                    info!(von = %aktuell, nach = %ziel, "Zustandswechsel");
                    self.stats.transition();
                    self.enter(ziel);
                    self.stats.aktiv_setzen(ziel.is_active());
                }
                None => self.enter(ziel),
            }
        }
    }

    /// Interne Nachricht vorne einreihen
    pub(crate) fn send_internal(&self, command: Command) {
        debug!(kommando = %command, "Interne Nachricht");
        if let Err(e) = self.queue.push_front(Message::intern(command)) {
            warn!(fehler = %e, "Interne Nachricht verworfen");
        }
    }

    fn historie_eintragen(&mut self, zustand: MachineState, message: &Message) {
        if self.config.history_size == 0 {
            return;
        }
        while self.history.len() >= self.config.history_size {
            self.history.pop_front();
        }
        self.history
            .push_back(format!("{} <- {}", zustand.name(), message.beschreibung()));
    }

    fn ansicht_aktualisieren(&self) {
        let mut view = self.view.lock();
        view.state = self.state;
        view.context = self.ctx.clone();
        view.history = self.history.iter().cloned().collect();
    }

    // -----------------------------------------------------------------------
    // Enter / Exit
    // -----------------------------------------------------------------------

    fn enter(&mut self, zustand: MachineState) {
        self.state = Some(zustand);
        debug!(zustand = %zustand, "Betrete Zustand");
        match zustand {
            MachineState::ActiveEarpiece => {
                self.set_speakerphone_on(false);
                self.set_communication_device(CommunicationDevice::BuiltinEarpiece);
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
            }
            MachineState::ActiveHeadset => {
                self.set_speakerphone_on(false);
                self.set_communication_device(CommunicationDevice::WiredHeadset);
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
            }
            MachineState::ActiveBluetooth => {
                self.set_speakerphone_on(false);
                self.set_bluetooth_on(None);
                self.ctx.available_routes.insert(Route::Bluetooth);
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
                if self.collaborators.bluetooth.audio_connected_device().is_some() {
                    self.collaborators.call_audio.on_ringer_mode_change();
                }
            }
            MachineState::RingingBluetooth => {
                self.set_speakerphone_on(false);
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
            }
            MachineState::ActiveSpeaker => {
                self.ctx.was_on_speaker = true;
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
            }
            MachineState::Streaming => {
                self.update_system_audio_state();
            }
            MachineState::QuiescentEarpiece
            | MachineState::QuiescentHeadset
            | MachineState::QuiescentBluetooth
            | MachineState::QuiescentSpeaker => {
                self.ctx.has_user_explicitly_left_bluetooth = false;
                self.update_internal_call_audio_state();
            }
        }
    }

    fn exit(&mut self, zustand: MachineState) {
        debug!(zustand = %zustand, "Verlasse Zustand");
        match zustand {
            MachineState::ActiveEarpiece => {
                self.clear_communication_device(CommunicationDevice::BuiltinEarpiece)
            }
            MachineState::ActiveHeadset => {
                self.clear_communication_device(CommunicationDevice::WiredHeadset)
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Zustandsberechnung
    // -----------------------------------------------------------------------

    /// Baut den Zustand fuer `route` aus den versteckten Werten
    fn zustand_bauen(&self, route: Route) -> RouteState {
        let supported = if route == Route::Streaming {
            callroute_core::RouteMask::STREAMING
        } else {
            self.ctx.available_routes
        };
        let aktiv = if route == Route::Bluetooth {
            self.collaborators.bluetooth.audio_connected_device()
        } else {
            None
        };
        RouteState::neu(self.ctx.muted, route, supported)
            .mit_aktivem_geraet(aktiv)
            .mit_verbundenen_geraeten(self.collaborators.bluetooth.connected_devices())
    }

    /// Berechnet den aktuellen Zustand neu ohne zu veroeffentlichen
    pub(crate) fn update_internal_call_audio_state(&mut self) {
        let route = match self.state {
            Some(zustand) => zustand.route(),
            None => {
                let route = self
                    .publisher
                    .states()
                    .current()
                    .map(|s| s.route)
                    .unwrap_or(Route::Speaker);
                error!(route = %route, "Kein aktueller Zustand beim Berechnen, nutze Ersatzroute");
                route
            }
        };
        let neu = self.zustand_bauen(route);
        self.publisher.states().set_current(neu);
    }

    /// Neu berechnen und veroeffentlichen (ruhende Zustaende nur berechnen)
    pub(crate) fn update_system_audio_state(&mut self) {
        self.update_internal_call_audio_state();
        if self.state.map(|s| s.is_quiescent()).unwrap_or(false) {
            return;
        }
        self.publisher.publish_current(false);
    }

    /// Startzustand aus aktueller Hardware
    pub(crate) fn initial_audio_state(&self) -> RouteState {
        let mask = self
            .calculate_supported_routes()
            .intersection(self.collaborators.current_call_supported_routes());
        let route = baseline::initial_route(mask, self.collaborators.bluetooth.has_active_device());
        RouteState::neu(false, route, mask)
            .mit_verbundenen_geraeten(self.collaborators.bluetooth.connected_devices())
    }

    fn calculate_supported_routes(&self) -> callroute_core::RouteMask {
        baseline::calculate_supported_routes(
            self.collaborators.wired_headset.is_plugged_in(),
            self.earpiece_supported,
            self.collaborators.bluetooth.is_bluetooth_available(),
        )
    }

    /// Beste Route fuer die aktuelle Lage
    pub(crate) fn calculate_baseline(&self, is_user: bool, include_bluetooth: bool) -> Route {
        let bluetooth = &self.collaborators.bluetooth;
        let only_inactive_watches = self.config.ignore_watch_devices && {
            let audio = bluetooth.audio_connected_device();
            let ergebnis = baseline::only_inactive_watches(
                &bluetooth.connected_devices(),
                audio.as_ref(),
                |d| bluetooth.is_watch(d),
            );
            if ergebnis {
                info!("Nur inaktive Uhren verbunden, Bluetooth wird nicht automatisch gewaehlt");
            }
            ergebnis
        };
        let inputs = BaselineInputs {
            available_routes: self.ctx.available_routes,
            has_user_explicitly_left_bluetooth: self.ctx.has_user_explicitly_left_bluetooth,
            has_video_call: !is_user && self.collaborators.calls.has_video_call(),
            only_inactive_watches,
        };
        let route = baseline::calculate_baseline(is_user, include_bluetooth, &inputs);
        debug!(route = %route, benutzer = is_user, bluetooth = include_bluetooth, "Baseline berechnet");
        route
    }

    /// Baseline als interne Nachricht einreihen
    pub(crate) fn send_baseline(&self, origin: SwitchOrigin, include_bluetooth: bool) {
        let route = self.calculate_baseline(origin.ist_benutzer(), include_bluetooth);
        self.send_internal(baseline::baseline_command(route, origin));
    }

    /// Setzt alles auf den Startzustand zurueck (Fokus verloren)
    pub(crate) fn reinitialize(&mut self) {
        let start = self.initial_audio_state();
        info!(start = %start, "Reinitialisierung");
        self.ctx.device_supported_routes = start.supported_routes;
        self.ctx.available_routes = start
            .supported_routes
            .intersection(self.collaborators.current_call_supported_routes());
        self.ctx.muted = start.muted;
        self.set_speakerphone_on(start.route == Route::Speaker);
        self.set_mute_on(self.ctx.muted);
        self.ctx.was_on_speaker = false;
        self.ctx.has_user_explicitly_left_bluetooth = false;
        self.publisher.states().set_last_known(start.clone());
        self.transition_to(MachineState::quiescent_for(start.route));
    }

    /// Fokus verloren: zuruecksetzen und Abschluss melden
    pub(crate) fn fokus_verloren(&mut self) {
        self.reinitialize();
        self.collaborators.call_audio.notify_audio_operations_complete();
    }

    // -----------------------------------------------------------------------
    // Hardware
    // -----------------------------------------------------------------------

    /// Lautsprecher ueber den Hardware-Executor schalten
    pub(crate) fn set_speakerphone_on(&self, an: bool) {
        info!(an, "Lautsprecher schalten");
        let has_any_calls = self.collaborators.calls.has_any_calls();
        let audio = Arc::clone(&self.collaborators.audio);
        let status_bar = Arc::clone(&self.collaborators.status_bar);
        self.executor.ausfuehren("lautsprecher", move || {
            let speaker_on = if an {
                match audio.set_communication_device(CommunicationDevice::BuiltinSpeaker) {
                    Ok(gesetzt) => gesetzt,
                    Err(e) => {
                        error!(fehler = %e, "Lautsprecher konnte nicht gesetzt werden");
                        false
                    }
                }
            } else {
                audio.clear_communication_device(CommunicationDevice::BuiltinSpeaker);
                false
            };
            status_bar.notify_speakerphone(has_any_calls && speaker_on);
        });
    }

    pub(crate) fn set_communication_device(&self, device: CommunicationDevice) {
        let audio = Arc::clone(&self.collaborators.audio);
        self.executor.ausfuehren("kommunikationsgeraet", move || {
            match audio.set_communication_device(device) {
                Ok(true) => debug!(geraet = ?device, "Kommunikationsgeraet gesetzt"),
                Ok(false) => warn!(geraet = ?device, "Kommunikationsgeraet nicht gesetzt"),
                Err(e) => error!(geraet = ?device, fehler = %e, "Kommunikationsgeraet fehlgeschlagen"),
            }
        });
    }

    pub(crate) fn clear_communication_device(&self, device: CommunicationDevice) {
        let audio = Arc::clone(&self.collaborators.audio);
        self.executor.ausfuehren("kommunikationsgeraet", move || {
            audio.clear_communication_device(device);
        });
    }

    /// Stummschaltung merken und im aktiven Zustand an das Mikrofon geben
    pub(crate) fn set_mute_on(&mut self, mute: bool) {
        self.ctx.muted = mute;
        if mute == self.collaborators.audio.is_microphone_mute() || !self.is_in_active_state() {
            return;
        }
        info!(mute, "Mikrofon-Stummschaltung aendern");
        let audio = Arc::clone(&self.collaborators.audio);
        self.executor.ausfuehren("mikrofon", move || {
            if let Err(e) = audio.set_microphone_mute(mute) {
                error!(fehler = %e, mute, "Mikrofon-Stummschaltung fehlgeschlagen");
            }
        });
    }

    /// SCO-Verbindung anfordern (`None` = beliebiges Geraet)
    pub(crate) fn set_bluetooth_on(&self, address: Option<&str>) {
        let bluetooth = &self.collaborators.bluetooth;
        if !bluetooth.is_bluetooth_available() {
            return;
        }
        let verbunden = bluetooth.audio_connected_device();
        if address.is_none() {
            if let Some(geraet) = &verbunden {
                info!(geraet = %geraet, "Bluetooth-Audio bereits verbunden");
                self.send_internal(Command::BluetoothAudioConnected);
                bluetooth.connect_audio(Some(&geraet.address));
                return;
            }
        }
        let gleiches_geraet = matches!(
            (&verbunden, address),
            (Some(geraet), Some(adresse)) if geraet.address == adresse
        );
        if !gleiches_geraet {
            info!(adresse = ?address, "Verbinde Bluetooth-Audio");
            bluetooth.connect_audio(address);
        }
    }

    pub(crate) fn set_bluetooth_off(&self) {
        let bluetooth = &self.collaborators.bluetooth;
        if bluetooth.is_bluetooth_available() && bluetooth.is_audio_connected_or_pending() {
            info!("Trenne Bluetooth-Audio");
            bluetooth.disconnect_audio();
        }
    }

    // -----------------------------------------------------------------------
    // Zustandsunabhaengige Kommandos
    // -----------------------------------------------------------------------

    pub(crate) fn unhandled_message(&mut self, zustand: MachineState, command: Command) {
        match command {
            Command::MuteOn | Command::MuteOff => {
                self.set_mute_on(matches!(command, Command::MuteOn));
                self.update_internal_call_audio_state();
                if self.is_in_active_state() {
                    self.publisher.publish_current(true);
                }
            }
            Command::MuteExternallyChanged => {
                self.ctx.muted = self.collaborators.audio.is_microphone_mute();
                if self.is_in_active_state() {
                    self.update_internal_call_audio_state();
                    self.publisher.publish_current(false);
                }
            }
            Command::ToggleMute => {
                if self.ctx.muted {
                    self.send_internal(Command::MuteOff);
                } else {
                    self.send_internal(Command::MuteOn);
                }
            }
            Command::UpdateSystemAudioRoute => {
                self.update_route_for_foreground_call();
                self.update_internal_call_audio_state();
                self.publisher.publish_current(true);
            }
            Command::ResendCurrentState => {
                self.publisher.resend();
            }
            Command::RunDeferred(aktion) => aktion.ausfuehren(),
            andere => {
                error!(zustand = %zustand, kommando = %andere, "Unerwartete Nachricht");
                self.stats.ignoriert();
            }
        }
    }

    fn update_route_for_foreground_call(&mut self) {
        self.ctx.available_routes = self
            .ctx
            .device_supported_routes
            .intersection(self.collaborators.current_call_supported_routes());
        let route = self
            .publisher
            .states()
            .current()
            .map(|s| s.route)
            .or_else(|| self.state.map(|s| s.route()));
        if let Some(route) = route {
            if !self.ctx.available_routes.contains(route) {
                info!(route = %route, "Route vom Anruf nicht mehr erlaubt, wechsle zur Baseline");
                self.send_baseline(SwitchOrigin::Derived, true);
            }
        }
    }
}

fn panic_text(panic: &(dyn Any + Send)) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unbekannt".to_string()
    }
}
