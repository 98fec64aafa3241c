//! CallAudioRouter – Thread-sichere Huelle um den Routing-Automaten
//!
//! Der Automat laeuft auf einem eigenen Thread und verarbeitet die Queue
//! nacheinander. Produzenten reihen von beliebigen Threads aus ein, Leser
//! sehen die veroeffentlichten Zustaende, Zaehler und eine Sicht auf den
//! Automaten ohne ihn anzuhalten.

use callroute_core::{EventSink, PlatformEvent, RouteState};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::adapters;
use crate::collaborators::Collaborators;
use crate::config::RouterConfig;
use crate::error::{RoutingError, RoutingResult};
use crate::executor::HardwareExecutor;
use crate::machine::{dump_erstellen, MachineView, RouteMachine};
use crate::message::{Command, DeferredAction, Message};
use crate::publisher::PublishedStates;
use crate::queue::MessageQueue;
use crate::states::MachineState;
use crate::stats::{MachineStats, StatsSnapshot};

/// Lebenszyklus des Routers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Erstellt,
    Laeuft,
    Beendet,
}

/// Router fuer das Anruf-Audio
pub struct CallAudioRouter {
    config: RouterConfig,
    collaborators: Collaborators,
    queue: Arc<MessageQueue>,
    published: Arc<PublishedStates>,
    stats: Arc<MachineStats>,
    view: Arc<Mutex<MachineView>>,
    executor: Arc<HardwareExecutor>,
    /// Automat bis zum Start des Threads
    machine: Mutex<Option<RouteMachine>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    thread_id: Mutex<Option<ThreadId>>,
    phase: Mutex<Phase>,
}

impl CallAudioRouter {
    /// Erstellt den Router, der Thread startet erst mit [`Self::initialize`]
    pub fn neu(config: RouterConfig, collaborators: Collaborators) -> RoutingResult<Self> {
        let machine = RouteMachine::neu(config.clone(), collaborators.clone())?;
        Ok(Self {
            config,
            collaborators,
            queue: Arc::clone(machine.queue()),
            published: Arc::clone(machine.published()),
            stats: Arc::clone(machine.stats()),
            view: Arc::clone(machine.view()),
            executor: Arc::clone(machine.executor()),
            machine: Mutex::new(Some(machine)),
            thread: Mutex::new(None),
            thread_id: Mutex::new(None),
            phase: Mutex::new(Phase::Erstellt),
        })
    }

    /// Initialisiert den Automaten und startet den Router-Thread
    ///
    /// Die Initialisierung selbst laeuft noch auf dem Aufrufer-Thread, damit
    /// der erste Zustand sofort lesbar ist.
    pub fn initialize(&self, initial: Option<RouteState>) -> RoutingResult<()> {
        let mut phase = self.phase.lock();
        match *phase {
            Phase::Erstellt => {}
            Phase::Laeuft => return Err(RoutingError::BereitsInitialisiert),
            Phase::Beendet => return Err(RoutingError::Beendet),
        }
        let mut machine = self
            .machine
            .lock()
            .take()
            .ok_or(RoutingError::BereitsInitialisiert)?;
        machine.initialize(initial)?;

        let queue = Arc::clone(&self.queue);
        let handle = std::thread::Builder::new()
            .name("callroute-router".to_string())
            .spawn(move || router_thread(machine, queue))?;
        *self.thread_id.lock() = Some(handle.thread().id());
        *self.thread.lock() = Some(handle);
        *phase = Phase::Laeuft;

        info!("CallAudioRouter gestartet");
        Ok(())
    }

    fn pruefen(&self) -> RoutingResult<()> {
        match *self.phase.lock() {
            Phase::Erstellt => Err(RoutingError::NichtInitialisiert),
            Phase::Laeuft => Ok(()),
            Phase::Beendet => Err(RoutingError::Beendet),
        }
    }

    /// Reiht ein Kommando hinten ein
    pub fn send(&self, command: Command) -> RoutingResult<()> {
        self.pruefen()?;
        self.queue.push_back(Message::neu(command))
    }

    /// Reiht ein Kommando vorne ein (Nachricht an sich selbst)
    pub fn send_internal(&self, command: Command) -> RoutingResult<()> {
        self.pruefen()?;
        self.queue.push_front(Message::intern(command))
    }

    /// Kommando per numerischem Code
    pub fn send_command(&self, code: i32, arg: i32) -> RoutingResult<()> {
        self.send_command_with_data(code, arg, None)
    }

    /// Kommando per Code mit optionaler Bluetooth-Adresse
    pub fn send_command_with_data(
        &self,
        code: i32,
        arg: i32,
        data: Option<String>,
    ) -> RoutingResult<()> {
        let command = Command::from_code(code, arg, data).map_err(|e| {
            warn!(code, arg, fehler = %e, "Kommando verworfen");
            e
        })?;
        self.send(command)
    }

    /// Fuehrt `aktion` auf dem Router-Thread aus
    pub fn run_deferred(&self, aktion: impl FnOnce() + Send + 'static) -> RoutingResult<()> {
        self.send(Command::RunDeferred(DeferredAction::neu(aktion)))
    }

    pub fn current_audio_state(&self) -> Option<RouteState> {
        self.published.current()
    }

    pub fn last_known_audio_state(&self) -> Option<RouteState> {
        self.published.last_known()
    }

    /// Zustand nach der zuletzt verarbeiteten Nachricht
    pub fn current_machine_state(&self) -> Option<MachineState> {
        self.view.lock().state
    }

    pub fn is_in_active_state(&self) -> bool {
        match self.current_machine_state() {
            Some(state) => state.is_active(),
            None => {
                warn!("Kein aktueller Zustand, nehme inaktiv an");
                false
            }
        }
    }

    pub fn view(&self) -> MachineView {
        self.view.lock().clone()
    }

    pub fn dump(&self) -> String {
        let view = self.view();
        dump_erstellen(&view, &self.published.snapshot(), &self.queue.snapshot())
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        *self.phase.lock() == Phase::Laeuft
    }

    /// Wartet bis Queue und Hardware-Executor leer sind
    ///
    /// Hardware-Auftraege koennen neue Ereignisse ausloesen, daher wird
    /// wiederholt bis beides ruhig ist. `false` bei Zeitueberschreitung.
    pub fn wait_until_idle(&self, zeitlimit: Duration) -> bool {
        const MAX_RUNDEN: usize = 8;
        for _ in 0..MAX_RUNDEN {
            if !self.queue.warten_bis_leer(zeitlimit) {
                return false;
            }
            self.executor.warten_bis_leer();
            if self.queue.is_empty() {
                return true;
            }
        }
        self.queue.is_empty()
    }

    /// Beendet den Router, wartende Nachrichten werden verworfen
    pub fn shutdown(&self) {
        {
            let mut phase = self.phase.lock();
            if *phase == Phase::Beendet {
                return;
            }
            *phase = Phase::Beendet;
        }
        let verworfen = self.queue.schliessen();
        if verworfen > 0 {
            warn!(anzahl = verworfen, "Wartende Nachrichten beim Beenden verworfen");
            self.stats.verworfen(verworfen as u64);
        }

        let handle = self.thread.lock().take();
        if let Some(handle) = handle {
            let eigener_thread = *self.thread_id.lock() == Some(std::thread::current().id());
            if eigener_thread {
                debug!("Shutdown vom Router-Thread, kein Join");
            } else if handle.join().is_err() {
                error!("Router-Thread mit panic beendet");
            }
        }
        info!("CallAudioRouter beendet");
    }
}

impl Drop for CallAudioRouter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl EventSink for CallAudioRouter {
    fn senden(&self, event: PlatformEvent) -> callroute_core::Result<()> {
        self.pruefen()?;
        adapters::zustellen(&self.queue, &self.collaborators, event)?;
        Ok(())
    }
}

/// Hauptschleife des Router-Threads
fn router_thread(mut machine: RouteMachine, queue: Arc<MessageQueue>) {
    debug!("Router-Thread gestartet");
    while let Some(message) = queue.pop_blocking() {
        machine.process(message);
        queue.verarbeitung_beendet();
    }
    debug!("Router-Thread beendet");
}
