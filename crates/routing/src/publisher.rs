//! Veroeffentlichung des Audio-Zustands
//!
//! Haelt das Paar (aktueller Zustand, zuletzt veroeffentlichter Zustand)
//! hinter einem Mutex. Geschrieben wird nur vom Automaten-Thread, gelesen
//! von ueberall. Kollaborateure werden ausserhalb des Locks benachrichtigt,
//! damit sie den Zustand im Callback selbst abfragen koennen.

use callroute_core::RouteState;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

use crate::collaborators::Collaborators;
use crate::stats::MachineStats;

/// Aktueller und zuletzt veroeffentlichter Zustand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePair {
    /// Intern berechneter Zustand
    pub current: Option<RouteState>,
    /// Zuletzt an Beobachter gemeldeter Zustand
    pub last_known: Option<RouteState>,
}

/// Geteilter Speicher fuer das Zustandspaar
#[derive(Debug, Default)]
pub struct PublishedStates {
    paar: Mutex<StatePair>,
}

impl PublishedStates {
    pub fn neu() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<RouteState> {
        self.paar.lock().current.clone()
    }

    pub fn last_known(&self) -> Option<RouteState> {
        self.paar.lock().last_known.clone()
    }

    pub fn snapshot(&self) -> StatePair {
        self.paar.lock().clone()
    }

    pub(crate) fn set_current(&self, state: RouteState) {
        self.paar.lock().current = Some(state);
    }

    /// Setzt den zuletzt bekannten Zustand ohne Benachrichtigung
    pub(crate) fn set_last_known(&self, state: RouteState) {
        self.paar.lock().last_known = Some(state);
    }

    /// Setzt beide Zustaende (Initialisierung)
    pub(crate) fn beide_setzen(&self, state: RouteState) {
        let mut paar = self.paar.lock();
        paar.current = Some(state.clone());
        paar.last_known = Some(state);
    }

    /// Prueft ob `neu` gemeldet werden muss
    ///
    /// Gibt den bisher bekannten Zustand zurueck, `None` im aeusseren
    /// Option wenn nichts zu tun ist. `last_known` bleibt unveraendert.
    fn vergleichen(&self, neu: &RouteState, erzwungen: bool) -> Option<Option<RouteState>> {
        let paar = self.paar.lock();
        info!(
            von = %AnzeigeOption(paar.last_known.as_ref()),
            nach = %neu,
            erzwungen,
            "Audio-Zustand veroeffentlichen"
        );
        if !erzwungen && paar.last_known.as_ref() == Some(neu) {
            return None;
        }
        Some(paar.last_known.clone())
    }
}

/// Meldet Zustaende an Statusleiste, Call-Manager und Verbindungsdienste
pub(crate) struct Publisher {
    states: Arc<PublishedStates>,
    collaborators: Collaborators,
    stats: Arc<MachineStats>,
}

impl Publisher {
    pub fn neu(
        states: Arc<PublishedStates>,
        collaborators: Collaborators,
        stats: Arc<MachineStats>,
    ) -> Self {
        Self {
            states,
            collaborators,
            stats,
        }
    }

    pub fn states(&self) -> &Arc<PublishedStates> {
        &self.states
    }

    /// Veroeffentlicht `neu` wenn erzwungen oder abweichend
    ///
    /// Erst werden Statusleiste, Call-Manager und Verbindungsdienste
    /// benachrichtigt, danach wird `neu` als zuletzt bekannt gespeichert.
    /// Gibt `true` zurueck wenn Beobachter benachrichtigt wurden.
    pub fn publish(&self, neu: RouteState, erzwungen: bool) -> bool {
        let Some(alt) = self.states.vergleichen(&neu, erzwungen) else {
            debug!("Zustand unveraendert, keine Veroeffentlichung");
            return false;
        };

        self.collaborators.status_bar.notify_mute(neu.muted);
        self.collaborators
            .calls
            .on_call_audio_state_changed(alt.as_ref(), &neu);
        for call in self.collaborators.calls.tracked_calls() {
            if let Some(connection) = &call.connection {
                connection.on_call_audio_state_changed(call.id, &neu);
            }
        }
        self.states.set_last_known(neu);
        self.stats.veroeffentlichung();
        true
    }

    /// Aktuellen Zustand veroeffentlichen
    pub fn publish_current(&self, erzwungen: bool) -> bool {
        match self.states.current() {
            Some(aktuell) => self.publish(aktuell, erzwungen),
            None => false,
        }
    }

    /// Zuletzt bekannten Zustand erneut melden
    pub fn resend(&self) -> bool {
        match self.states.last_known() {
            Some(letzter) => self.publish(letzter, true),
            None => false,
        }
    }
}

struct AnzeigeOption<'a>(Option<&'a RouteState>);

impl std::fmt::Display for AnzeigeOption<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(state) => write!(f, "{state}"),
            None => f.write_str("-"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::StatusBarNotifier;
    use crate::sim::SimulatedPlatform;
    use callroute_core::{Route, RouteMask};

    fn publisher() -> (Publisher, Arc<SimulatedPlatform>, Arc<MachineStats>) {
        let sim = Arc::new(SimulatedPlatform::neu());
        let stats = Arc::new(MachineStats::default());
        let publisher = Publisher::neu(
            Arc::new(PublishedStates::neu()),
            Collaborators::aus_plattform(Arc::clone(&sim)),
            Arc::clone(&stats),
        );
        (publisher, sim, stats)
    }

    #[test]
    fn gleicher_zustand_nur_einmal() {
        let (publisher, sim, stats) = publisher();
        let state = RouteState::neu(false, Route::Earpiece, RouteMask::EARPIECE);

        assert!(publisher.publish(state.clone(), false));
        assert!(!publisher.publish(state.clone(), false));
        assert_eq!(sim.veroeffentlichungen().len(), 1);
        assert_eq!(stats.snapshot().publications, 1);
    }

    #[test]
    fn erzwungen_trotz_gleichheit() {
        let (publisher, sim, _) = publisher();
        let state = RouteState::neu(false, Route::Speaker, RouteMask::SPEAKER);

        publisher.publish(state.clone(), false);
        assert!(publisher.publish(state, true));
        let meldungen = sim.veroeffentlichungen();
        assert_eq!(meldungen.len(), 2);
        assert_eq!(meldungen[1].0.as_ref().map(|s| s.route), Some(Route::Speaker));
    }

    #[test]
    fn resend_ohne_zustand_tut_nichts() {
        let (publisher, sim, _) = publisher();
        assert!(!publisher.resend());
        assert!(sim.veroeffentlichungen().is_empty());
    }

    /// Merkt sich was `last_known` waehrend der Benachrichtigung war
    struct Beobachter {
        states: Arc<PublishedStates>,
        gesehen: Mutex<Vec<Option<RouteState>>>,
    }

    impl StatusBarNotifier for Beobachter {
        fn notify_mute(&self, _muted: bool) {
            self.gesehen.lock().push(self.states.last_known());
        }
        fn notify_speakerphone(&self, _on: bool) {}
    }

    #[test]
    fn last_known_erst_nach_benachrichtigung() {
        let sim = Arc::new(SimulatedPlatform::neu());
        let states = Arc::new(PublishedStates::neu());
        let beobachter = Arc::new(Beobachter {
            states: Arc::clone(&states),
            gesehen: Mutex::new(Vec::new()),
        });
        let mut collaborators = Collaborators::aus_plattform(Arc::clone(&sim));
        collaborators.status_bar = Arc::clone(&beobachter) as Arc<dyn StatusBarNotifier>;
        let publisher = Publisher::neu(
            Arc::clone(&states),
            collaborators,
            Arc::new(MachineStats::default()),
        );

        let erster = RouteState::neu(false, Route::Earpiece, RouteMask::EARPIECE);
        let zweiter = RouteState::neu(false, Route::Speaker, RouteMask::SPEAKER);
        publisher.publish(erster.clone(), false);
        publisher.publish(zweiter.clone(), false);

        assert_eq!(*beobachter.gesehen.lock(), vec![None, Some(erster)]);
        assert_eq!(states.last_known(), Some(zweiter));
        // Call-Manager sieht beide Meldungen
        assert_eq!(sim.veroeffentlichungen().len(), 2);
    }

    #[test]
    fn last_known_wird_gesetzt() {
        let (publisher, _, _) = publisher();
        let state = RouteState::neu(true, Route::Earpiece, RouteMask::EARPIECE);
        publisher.publish(state.clone(), false);
        assert_eq!(publisher.states().last_known(), Some(state));
    }
}
