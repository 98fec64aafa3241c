//! callroute-daemon – Bibliotheks-Root
//!
//! Baut simulierte Hardware und Router aus der Konfiguration, verbindet
//! Metriken und Health-Check und stellt die Konsole bereit.

pub mod config;
pub mod console;
pub mod error;
pub mod parser;

use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::Result;
use callroute_core::EventSink;
use callroute_observability::{
    HealthState, RouteMetrics, Zaehlerstand, observability_server_starten,
};
use callroute_routing::{CallAudioRouter, Collaborators, SimulatedPlatform, StatsSnapshot};
use config::{DaemonConfig, HardwareEinstellungen};
use console::{Konsole, konsole_schleife};

/// Simulierte Plattform im konfigurierten Anfangszustand
pub fn plattform_aufbauen(hardware: &HardwareEinstellungen) -> SimulatedPlatform {
    let sim = if hardware.hoerer {
        SimulatedPlatform::neu()
    } else {
        SimulatedPlatform::ohne_hoerer()
    };
    if hardware.headset_eingesteckt {
        sim.headset_einstecken();
    }
    for geraet in &hardware.bluetooth {
        sim.bluetooth_verbinden(geraet.geraet());
    }
    if let Some(address) = &hardware.aktives_geraet {
        sim.bluetooth_aktiv_setzen(Some(address));
    }
    sim.inband_setzen(hardware.inband);
    sim
}

/// Router-Zaehler in der Form der Metrik-Registry
pub fn zaehlerstand(stats: &StatsSnapshot) -> Zaehlerstand {
    Zaehlerstand {
        messages: stats.messages,
        transitions: stats.transitions,
        publications: stats.publications,
        ignored_commands: stats.ignored_commands,
        dropped_messages: stats.dropped_messages,
        handler_failures: stats.handler_failures,
        active: stats.active,
    }
}

/// Haelt den laufenden Daemon-Zustand zusammen
pub struct Daemon {
    pub config: DaemonConfig,
    pub sim: Arc<SimulatedPlatform>,
    pub router: Arc<CallAudioRouter>,
}

impl Daemon {
    /// Baut Plattform und Router und initialisiert den Router
    pub fn neu(config: DaemonConfig) -> Result<Self> {
        let sim = Arc::new(plattform_aufbauen(&config.hardware));
        let router = Arc::new(CallAudioRouter::neu(
            config.router.clone(),
            Collaborators::aus_plattform(Arc::clone(&sim)),
        )?);
        if config.hardware.sco_automatisch {
            let sink: Weak<dyn EventSink> = Arc::downgrade(&router) as Weak<dyn EventSink>;
            sim.auto_bestaetigung(sink);
        }
        router.initialize(None)?;

        tracing::info!(
            zustand = ?router.current_machine_state(),
            audio = ?router.last_known_audio_state().map(|s| s.to_string()),
            "Router initialisiert"
        );

        Ok(Self {
            config,
            sim,
            router,
        })
    }

    pub fn konsole(&self) -> Konsole {
        Konsole::neu(Arc::clone(&self.router), Arc::clone(&self.sim))
    }

    /// Startet Observability und Konsole und laeuft bis `quit` oder Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let metriken = RouteMetrics::neu()?;
        let health = HealthState::neu();
        health.router_status_setzen(self.router.is_running());

        if self.config.observability.aktiviert {
            let addr: std::net::SocketAddr = self.config.observability_bind_adresse().parse()?;
            let (m, h) = (metriken.clone(), health.clone());
            tokio::spawn(async move {
                if let Err(e) = observability_server_starten(addr, m, h).await {
                    tracing::error!(fehler = %e, "Observability-Server beendet");
                }
            });

            let router = Arc::clone(&self.router);
            let (m, h) = (metriken.clone(), health.clone());
            let abstand = Duration::from_millis(self.config.observability.abgleich_ms.max(10));
            tokio::spawn(async move {
                let mut takt = tokio::time::interval(abstand);
                loop {
                    takt.tick().await;
                    m.uebernehmen(&zaehlerstand(&router.stats()));
                    h.router_status_setzen(router.is_running());
                }
            });
        }

        let konsole = self.konsole();
        let konsole_task = tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            konsole_schleife(&konsole, stdin.lock(), std::io::stdout())
        });

        tracing::info!("Daemon laeuft. Befehle ueber stdin, 'help' fuer Hilfe");
        tokio::select! {
            ergebnis = konsole_task => {
                ergebnis??;
                tracing::info!("Konsole beendet");
            }
            signal = tokio::signal::ctrl_c() => {
                signal?;
                tracing::info!("Shutdown-Signal empfangen");
            }
        }

        self.router.shutdown();
        health.router_status_setzen(false);
        metriken.uebernehmen(&zaehlerstand(&self.router.stats()));
        tracing::info!(stats = ?self.router.stats(), "Daemon beendet");
        Ok(())
    }
}
