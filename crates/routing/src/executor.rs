//! Hardware-Executor fuer blockierende Aufrufe
//!
//! Kommunikationsgeraet und Mikrofon-Stummschaltung sind beim Audio-Dienst
//! potentiell blockierende RPCs. Im Thread-Modus laufen sie in
//! Einreihungsreihenfolge auf einem eigenen Thread, spaetere Auftraege
//! ueberschreiben damit die Absicht frueherer.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error, warn};

use crate::config::ExecutorMode;
use crate::error::RoutingResult;

type HardwareTask = Box<dyn FnOnce() + Send + 'static>;

/// Kommandos an den Hardware-Thread
enum ExecutorCommand {
    Task {
        name: &'static str,
        task: HardwareTask,
    },
    /// Antwortet sobald alle vorherigen Auftraege erledigt sind
    Flush(Sender<()>),
    Shutdown,
}

/// Fuehrt Hardware-Auftraege inline oder auf einem eigenen Thread aus
pub struct HardwareExecutor {
    cmd_tx: Option<Sender<ExecutorCommand>>,
}

impl HardwareExecutor {
    /// Erstellt den Executor im gewuenschten Modus
    pub fn neu(mode: ExecutorMode) -> RoutingResult<Self> {
        match mode {
            ExecutorMode::Inline => Ok(Self::inline()),
            ExecutorMode::Thread => {
                let (cmd_tx, cmd_rx) = unbounded::<ExecutorCommand>();
                std::thread::Builder::new()
                    .name("callroute-hardware".to_string())
                    .spawn(move || hardware_thread(cmd_rx))?;
                debug!("Hardware-Executor Thread gestartet");
                Ok(Self {
                    cmd_tx: Some(cmd_tx),
                })
            }
        }
    }

    /// Executor ohne Thread, Auftraege laufen sofort
    pub fn inline() -> Self {
        Self { cmd_tx: None }
    }

    pub fn ist_inline(&self) -> bool {
        self.cmd_tx.is_none()
    }

    /// Fuehrt einen Auftrag aus (oder reiht ihn ein)
    pub fn ausfuehren(&self, name: &'static str, task: impl FnOnce() + Send + 'static) {
        match &self.cmd_tx {
            None => auftrag_ausfuehren(name, Box::new(task)),
            Some(tx) => {
                if tx
                    .send(ExecutorCommand::Task {
                        name,
                        task: Box::new(task),
                    })
                    .is_err()
                {
                    warn!(auftrag = name, "Hardware-Thread beendet, Auftrag verworfen");
                }
            }
        }
    }

    /// Blockiert bis alle bisher eingereihten Auftraege erledigt sind
    pub fn warten_bis_leer(&self) {
        if let Some(tx) = &self.cmd_tx {
            let (fertig_tx, fertig_rx) = bounded(1);
            if tx.send(ExecutorCommand::Flush(fertig_tx)).is_ok() {
                let _ = fertig_rx.recv();
            }
        }
    }
}

impl Drop for HardwareExecutor {
    fn drop(&mut self) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(ExecutorCommand::Shutdown);
            debug!("Hardware-Executor gestoppt");
        }
    }
}

fn auftrag_ausfuehren(name: &'static str, task: HardwareTask) {
    if catch_unwind(AssertUnwindSafe(task)).is_err() {
        error!(auftrag = name, "Hardware-Auftrag abgebrochen (panic)");
    }
}

/// Hintergrund-Thread des Executors
fn hardware_thread(cmd_rx: Receiver<ExecutorCommand>) {
    loop {
        match cmd_rx.recv() {
            Ok(ExecutorCommand::Task { name, task }) => {
                debug!(auftrag = name, "Hardware-Auftrag");
                auftrag_ausfuehren(name, task);
            }
            Ok(ExecutorCommand::Flush(fertig)) => {
                let _ = fertig.send(());
            }
            Ok(ExecutorCommand::Shutdown) => {
                debug!("Hardware-Thread beendet");
                break;
            }
            Err(e) => {
                debug!("Hardware-Kanal geschlossen: {}", e);
                break;
            }
        }
    }
}
