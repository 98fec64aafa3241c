//! Zeilen-Konsole des Daemons
//!
//! Hardware-Befehle veraendern die simulierte Plattform und reichen das
//! passende Plattform-Ereignis an den Router weiter. Routing-Befehle gehen
//! direkt als Kommando in die Queue. Nach jedem Befehl wird gewartet bis
//! der Router ruhig ist und der aktuelle Zustand gemeldet.

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use callroute_core::{AudioFocus, BluetoothDevice, DeviceClass, EventSink, PlatformEvent};
use callroute_routing::{CallAudioRouter, Command, SimulatedPlatform, SwitchOrigin};
use tracing::{debug, warn};

use crate::error::{DaemonError, DaemonResult};
use crate::parser::{ParsedCommand, fehler_antwort, ok_antwort, parse_line};

const HILFE: &str = "\
headset plug|unplug
bt add address=.. [name=..] [watch=true]
bt remove address=..
bt audio-on [address=..]
bt audio-off
bt active present [address=..] | bt active gone
focus none|ringing|active
route earpiece|headset|bluetooth|speaker|baseline [user=true] [address=..]
mute on|off|toggle
speaker on|off
dock connect|disconnect
streaming on|off
resend
state
dump
quit
";

/// Ergebnis eines Konsolenbefehls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Antwort {
    Text(String),
    Beenden,
}

pub struct Konsole {
    router: Arc<CallAudioRouter>,
    sim: Arc<SimulatedPlatform>,
    zeitlimit: Duration,
}

impl Konsole {
    pub fn neu(router: Arc<CallAudioRouter>, sim: Arc<SimulatedPlatform>) -> Self {
        Self {
            router,
            sim,
            zeitlimit: Duration::from_secs(2),
        }
    }

    /// Fuehrt eine Befehlszeile aus
    pub fn ausfuehren(&self, zeile: &str) -> DaemonResult<Antwort> {
        let cmd = parse_line(zeile)?;
        debug!(befehl = %cmd.name, args = ?cmd.args, "Konsolenbefehl");

        match cmd.name.as_str() {
            "headset" => {
                let event = match waehlen(&cmd, &["plug", "unplug"])? {
                    "plug" => self.sim.headset_einstecken(),
                    _ => self.sim.headset_ziehen(),
                };
                self.ereignis(event)?;
            }
            "bt" => self.bluetooth(&cmd)?,
            "focus" => {
                let focus = match waehlen(&cmd, &["none", "ringing", "active"])? {
                    "none" => AudioFocus::NoFocus,
                    "ringing" => AudioFocus::RingingFocus,
                    _ => AudioFocus::ActiveFocus,
                };
                self.router.send(Command::SwitchFocus(focus))?;
            }
            "route" => self.route(&cmd)?,
            "mute" => {
                let command = match waehlen(&cmd, &["on", "off", "toggle"])? {
                    "on" => Command::MuteOn,
                    "off" => Command::MuteOff,
                    _ => Command::ToggleMute,
                };
                self.router.send(command)?;
            }
            "speaker" => {
                let an = waehlen(&cmd, &["on", "off"])? == "on";
                self.ereignis(self.sim.lautsprecher_extern_setzen(an))?;
            }
            "dock" => {
                let event = match waehlen(&cmd, &["connect", "disconnect"])? {
                    "connect" => PlatformEvent::DockConnected,
                    _ => PlatformEvent::DockDisconnected,
                };
                self.ereignis(event)?;
            }
            "streaming" => {
                let event = match waehlen(&cmd, &["on", "off"])? {
                    "on" => PlatformEvent::StreamingForceEnabled,
                    _ => PlatformEvent::StreamingForceDisabled,
                };
                self.ereignis(event)?;
            }
            "resend" => self.router.send(Command::ResendCurrentState)?,
            "state" => {}
            "dump" => return Ok(Antwort::Text(format!("{}\n", self.router.dump()))),
            "help" => return Ok(Antwort::Text(HILFE.to_string())),
            "quit" | "exit" => return Ok(Antwort::Beenden),
            andere => {
                return Err(DaemonError::UngueltigeEingabe(format!(
                    "Unbekannter Befehl: {andere}"
                )));
            }
        }

        if !self.router.wait_until_idle(self.zeitlimit) {
            warn!("Router nach Konsolenbefehl nicht rechtzeitig ruhig");
        }
        Ok(Antwort::Text(self.zustand_zeile()))
    }

    fn ereignis(&self, event: PlatformEvent) -> DaemonResult<()> {
        self.router.senden(event)?;
        Ok(())
    }

    fn bluetooth(&self, cmd: &ParsedCommand) -> DaemonResult<()> {
        let event = match waehlen(cmd, &["add", "remove", "audio-on", "audio-off", "active"])? {
            "add" => {
                let mut geraet = BluetoothDevice::neu(cmd.required_param("address")?);
                if let Some(name) = cmd.param("name") {
                    geraet = geraet.mit_name(name);
                }
                if cmd.bool_param("watch")? {
                    geraet = geraet.mit_klasse(DeviceClass::Watch);
                }
                self.sim.bluetooth_verbinden(geraet)
            }
            "remove" => self.sim.bluetooth_trennen(cmd.required_param("address")?),
            "audio-on" => self
                .sim
                .bluetooth_audio_herstellen(cmd.param("address"))
                .ok_or_else(|| {
                    DaemonError::UngueltigeEingabe("Kein passendes Bluetooth-Geraet".into())
                })?,
            "audio-off" => self.sim.bluetooth_audio_verlieren(),
            _ => match cmd.args.get(1).map(|s| s.to_lowercase()).as_deref() {
                Some("present") => {
                    let address = match cmd.param("address") {
                        Some(a) => a.to_string(),
                        None => self
                            .sim
                            .bluetooth_geraete()
                            .first()
                            .map(|d| d.address.clone())
                            .ok_or_else(|| {
                                DaemonError::UngueltigeEingabe(
                                    "Kein Bluetooth-Geraet verbunden".into(),
                                )
                            })?,
                    };
                    self.sim.bluetooth_aktiv_setzen(Some(&address))
                }
                Some("gone") => self.sim.bluetooth_aktiv_setzen(None),
                _ => {
                    return Err(DaemonError::UngueltigeEingabe(
                        "bt active erwartet present|gone".into(),
                    ));
                }
            },
        };
        self.ereignis(event)
    }

    fn route(&self, cmd: &ParsedCommand) -> DaemonResult<()> {
        let origin = if cmd.bool_param("user")? {
            SwitchOrigin::User
        } else {
            SwitchOrigin::Derived
        };
        let command = match waehlen(
            cmd,
            &["earpiece", "headset", "bluetooth", "speaker", "baseline"],
        )? {
            "earpiece" => Command::SwitchEarpiece(origin),
            "headset" => Command::SwitchHeadset(origin),
            "bluetooth" => Command::SwitchBluetooth {
                origin,
                address: cmd.param("address").map(str::to_string),
            },
            "speaker" => Command::SwitchSpeaker(origin),
            _ => Command::SwitchBaselineRoute {
                origin,
                include_bluetooth: true,
            },
        };
        self.router.send(command)?;
        Ok(())
    }

    /// Aktueller Zustand als Antwortzeile
    pub fn zustand_zeile(&self) -> String {
        let zustand = self
            .router
            .current_machine_state()
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| "-".into());
        let audio = self
            .router
            .last_known_audio_state()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        ok_antwort(&[("zustand", &zustand), ("audio", &audio)])
    }
}

/// Liest das erste Argument und prueft es gegen die erlaubten Werte
fn waehlen<'a>(cmd: &ParsedCommand, erlaubt: &[&'a str]) -> DaemonResult<&'a str> {
    let arg = cmd.unterbefehl().unwrap_or_default();
    erlaubt
        .iter()
        .find(|e| **e == arg)
        .copied()
        .ok_or_else(|| {
            DaemonError::UngueltigeEingabe(format!(
                "{} erwartet {}",
                cmd.name,
                erlaubt.join("|")
            ))
        })
}

/// Liest Befehle zeilenweise bis `quit` oder Eingabeende
pub fn konsole_schleife<R: BufRead, W: Write>(
    konsole: &Konsole,
    eingabe: R,
    mut ausgabe: W,
) -> std::io::Result<()> {
    for zeile in eingabe.lines() {
        let zeile = zeile?;
        if zeile.trim().is_empty() || zeile.trim_start().starts_with('#') {
            continue;
        }
        match konsole.ausfuehren(&zeile) {
            Ok(Antwort::Text(text)) => ausgabe.write_all(text.as_bytes())?,
            Ok(Antwort::Beenden) => break,
            Err(e) => ausgabe.write_all(fehler_antwort(e.code(), &e.to_string()).as_bytes())?,
        }
        ausgabe.flush()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use callroute_core::Route;
    use callroute_routing::{Collaborators, MachineState, RouterConfig};
    use std::sync::Weak;

    fn konsole() -> (Konsole, Arc<CallAudioRouter>, Arc<SimulatedPlatform>) {
        let sim = Arc::new(SimulatedPlatform::neu());
        let router = Arc::new(
            CallAudioRouter::neu(
                RouterConfig::default(),
                Collaborators::aus_plattform(Arc::clone(&sim)),
            )
            .unwrap(),
        );
        let sink: Weak<dyn EventSink> = Arc::downgrade(&router) as Weak<dyn EventSink>;
        sim.auto_bestaetigung(sink);
        router.initialize(None).unwrap();
        (
            Konsole::neu(Arc::clone(&router), Arc::clone(&sim)),
            router,
            sim,
        )
    }

    #[test]
    fn fokus_und_lautsprecher() {
        let (konsole, router, _sim) = konsole();
        konsole.ausfuehren("focus active").unwrap();
        let antwort = konsole.ausfuehren("route speaker user=true").unwrap();

        assert_eq!(
            router.current_machine_state(),
            Some(MachineState::ActiveSpeaker)
        );
        let Antwort::Text(text) = antwort else {
            panic!("Textantwort erwartet");
        };
        assert!(text.starts_with("ok zustand=ActiveSpeakerRoute"));
    }

    #[test]
    fn headset_einstecken() {
        let (konsole, router, _sim) = konsole();
        konsole.ausfuehren("focus active").unwrap();
        konsole.ausfuehren("headset plug").unwrap();
        assert_eq!(
            router.last_known_audio_state().unwrap().route,
            Route::WiredHeadset
        );
    }

    #[test]
    fn bluetooth_geraet_wird_aktiv() {
        let (konsole, router, sim) = konsole();
        konsole.ausfuehren("focus active").unwrap();
        konsole.ausfuehren("bt add address=AA:01 name=Auto").unwrap();
        konsole.ausfuehren("bt active present").unwrap();

        assert_eq!(
            router.current_machine_state(),
            Some(MachineState::ActiveBluetooth)
        );
        assert_eq!(sim.bluetooth_audio_geraet().unwrap().address, "AA:01");
    }

    #[test]
    fn mute_umschalten() {
        let (konsole, router, sim) = konsole();
        konsole.ausfuehren("focus active").unwrap();
        konsole.ausfuehren("mute toggle").unwrap();
        assert!(router.last_known_audio_state().unwrap().muted);
        assert!(sim.mikrofon_stumm());
    }

    #[test]
    fn ungueltige_befehle() {
        let (konsole, _router, _sim) = konsole();
        assert!(matches!(
            konsole.ausfuehren("fliegen"),
            Err(DaemonError::UngueltigeEingabe(_))
        ));
        assert!(matches!(
            konsole.ausfuehren("headset"),
            Err(DaemonError::UngueltigeEingabe(_))
        ));
        assert!(matches!(
            konsole.ausfuehren("bt remove"),
            Err(DaemonError::UngueltigeEingabe(_))
        ));
        assert!(matches!(
            konsole.ausfuehren("bt active present"),
            Err(DaemonError::UngueltigeEingabe(_))
        ));
        assert!(matches!(
            konsole.ausfuehren(""),
            Err(DaemonError::Protokoll(_))
        ));
    }

    #[test]
    fn quit_beendet() {
        let (konsole, _router, _sim) = konsole();
        assert_eq!(konsole.ausfuehren("quit").unwrap(), Antwort::Beenden);
    }

    #[test]
    fn schleife_schreibt_antworten() {
        let (konsole, _router, _sim) = konsole();
        let eingabe = "# Kommentar\nfocus active\nunbekannt\nquit\nstate\n";
        let mut ausgabe = Vec::new();
        konsole_schleife(&konsole, eingabe.as_bytes(), &mut ausgabe).unwrap();

        let text = String::from_utf8(ausgabe).unwrap();
        let zeilen: Vec<&str> = text.lines().collect();
        assert_eq!(zeilen.len(), 2);
        assert!(zeilen[0].starts_with("ok zustand=ActiveEarpieceRoute"));
        assert!(zeilen[1].starts_with("error id=2"));
    }
}
