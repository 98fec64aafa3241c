//! Nachrichten-Queue des Automaten
//!
//! Beliebig viele Produzenten, genau ein Konsument. Interne Nachrichten
//! werden vorne eingereiht, damit zusammengesetzte Routenwechsel fuer
//! Beobachter atomar wirken.

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::error::{RoutingError, RoutingResult};
use crate::message::Message;

struct QueueInner {
    nachrichten: VecDeque<Message>,
    geschlossen: bool,
    /// Der Konsument verarbeitet gerade eine Nachricht
    beschaeftigt: bool,
}

/// Thread-sichere Nachrichten-Queue mit Vorne-Einreihung
pub struct MessageQueue {
    inner: Mutex<QueueInner>,
    /// Signal fuer den Konsumenten (neue Nachricht / geschlossen)
    verfuegbar: Condvar,
    /// Signal fuer Wartende auf Leerlauf
    leerlauf: Condvar,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::neu()
    }
}

impl MessageQueue {
    pub fn neu() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                nachrichten: VecDeque::new(),
                geschlossen: false,
                beschaeftigt: false,
            }),
            verfuegbar: Condvar::new(),
            leerlauf: Condvar::new(),
        }
    }

    /// Reiht eine Nachricht hinten ein
    pub fn push_back(&self, message: Message) -> RoutingResult<()> {
        let mut inner = self.inner.lock();
        if inner.geschlossen {
            return Err(RoutingError::QueueGeschlossen);
        }
        inner.nachrichten.push_back(message);
        self.verfuegbar.notify_one();
        Ok(())
    }

    /// Reiht eine Nachricht vorne ein
    pub fn push_front(&self, message: Message) -> RoutingResult<()> {
        let mut inner = self.inner.lock();
        if inner.geschlossen {
            return Err(RoutingError::QueueGeschlossen);
        }
        inner.nachrichten.push_front(message);
        self.verfuegbar.notify_one();
        Ok(())
    }

    /// Wartet auf die naechste Nachricht, `None` sobald geschlossen
    pub fn pop_blocking(&self) -> Option<Message> {
        let mut inner = self.inner.lock();
        loop {
            if inner.geschlossen {
                return None;
            }
            if let Some(message) = inner.nachrichten.pop_front() {
                inner.beschaeftigt = true;
                return Some(message);
            }
            self.verfuegbar.wait(&mut inner);
        }
    }

    /// Naechste Nachricht ohne zu warten
    pub fn try_pop(&self) -> Option<Message> {
        let mut inner = self.inner.lock();
        if inner.geschlossen {
            return None;
        }
        let message = inner.nachrichten.pop_front();
        inner.beschaeftigt = message.is_some();
        message
    }

    /// Meldet dass die zuletzt entnommene Nachricht verarbeitet ist
    pub fn verarbeitung_beendet(&self) {
        let mut inner = self.inner.lock();
        inner.beschaeftigt = false;
        if inner.nachrichten.is_empty() {
            self.leerlauf.notify_all();
        }
    }

    /// Blockiert bis die Queue leer und der Konsument untaetig ist
    ///
    /// Gibt `false` zurueck wenn das Zeitlimit vorher ablaeuft.
    pub fn warten_bis_leer(&self, zeitlimit: Duration) -> bool {
        let frist = Instant::now() + zeitlimit;
        let mut inner = self.inner.lock();
        while !inner.geschlossen && (inner.beschaeftigt || !inner.nachrichten.is_empty()) {
            if self.leerlauf.wait_until(&mut inner, frist).timed_out() {
                return false;
            }
        }
        true
    }

    /// Schliesst die Queue und gibt die Zahl verworfener Nachrichten zurueck
    pub fn schliessen(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.geschlossen = true;
        let verworfen = inner.nachrichten.len();
        inner.nachrichten.clear();
        self.verfuegbar.notify_all();
        self.leerlauf.notify_all();
        verworfen
    }

    pub fn ist_geschlossen(&self) -> bool {
        self.inner.lock().geschlossen
    }

    pub fn len(&self) -> usize {
        self.inner.lock().nachrichten.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Beschreibungen aller wartenden Nachrichten (fuer Dumps)
    pub fn snapshot(&self) -> Vec<String> {
        self.inner
            .lock()
            .nachrichten
            .iter()
            .map(Message::beschreibung)
            .collect()
    }
}
