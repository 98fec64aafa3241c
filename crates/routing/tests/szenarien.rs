//! Ablauf-Tests des Routing-Automaten gegen die simulierte Plattform
//!
//! Der Automat wird direkt mit `run_until_idle` getrieben, Hardware-Auftraege
//! laufen inline. Damit sind alle Ablaeufe deterministisch.

use std::sync::Arc;

use callroute_core::{AudioFocus, BluetoothDevice, CallId, DeviceClass, PlatformEvent, Route, RouteMask};
use callroute_routing::{
    Collaborators, Command, CommunicationDevice, MachineState, RouteMachine, RouterConfig,
    SimAction, SimulatedPlatform, SwitchOrigin,
};

// ---------------------------------------------------------------------------
// Hilfsfunktionen
// ---------------------------------------------------------------------------

fn automat(sim: &Arc<SimulatedPlatform>) -> RouteMachine {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("callroute_routing=debug")
        .try_init();
    let mut machine =
        RouteMachine::neu(RouterConfig::inline(), Collaborators::aus_plattform(Arc::clone(sim)))
            .unwrap();
    machine.initialize(None).unwrap();
    machine
}

fn senden(machine: &mut RouteMachine, command: Command) {
    machine.send(command).unwrap();
    machine.run_until_idle();
}

fn ereignis(machine: &mut RouteMachine, event: PlatformEvent) {
    machine.plattform_ereignis(event).unwrap();
    machine.run_until_idle();
}

fn aktiv_auf_hoerer(sim: &Arc<SimulatedPlatform>) -> RouteMachine {
    let mut machine = automat(sim);
    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    machine
}

/// Nach dem Einschwingen liegt die veroeffentlichte Route in der Maske
fn route_gueltig(machine: &RouteMachine) {
    let state = machine.last_known_audio_state().unwrap();
    assert!(
        state.route_ist_unterstuetzt(),
        "Route {} nicht in {}",
        state.route,
        state.supported_routes
    );
}

// ---------------------------------------------------------------------------
// Fokus
// ---------------------------------------------------------------------------

#[test]
fn aktiver_fokus_veroeffentlicht_hoerer() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let machine = aktiv_auf_hoerer(&sim);

    let (alt, neu) = sim.veroeffentlichungen().last().cloned().unwrap();
    assert_eq!(alt.unwrap().route, Route::Earpiece);
    assert_eq!(neu.route, Route::Earpiece);
    assert_eq!(neu.supported_routes, RouteMask::EARPIECE.union(RouteMask::SPEAKER));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinEarpiece)
    );
    assert_eq!(sim.anzahl(&SimAction::CacheHearingAid), 1);
    route_gueltig(&machine);
}

#[test]
fn fokusverlust_fuehrt_zur_ruhenden_baseline() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));
    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinSpeaker)
    );

    senden(&mut machine, Command::SwitchFocus(AudioFocus::NoFocus));

    assert_eq!(machine.state(), Some(MachineState::QuiescentEarpiece));
    assert!(!machine.is_in_active_state());
    assert_eq!(sim.kommunikationsgeraet(), None);
    assert_eq!(sim.anzahl(&SimAction::AudioOperationsComplete), 1);
    assert_eq!(sim.anzahl(&SimAction::RestoreHearingAid), 1);
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Earpiece
    );
    assert!(!machine.context().was_on_speaker);
}

#[test]
fn kein_fokus_im_ruhezustand_meldet_abschluss() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = automat(&sim);
    senden(&mut machine, Command::SwitchFocus(AudioFocus::NoFocus));
    assert_eq!(machine.state(), Some(MachineState::QuiescentEarpiece));
    assert_eq!(sim.anzahl(&SimAction::AudioOperationsComplete), 1);
}

// ---------------------------------------------------------------------------
// Routenwechsel
// ---------------------------------------------------------------------------

#[test]
fn wiederholter_wechsel_ist_idempotent() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));
    let veroeffentlicht = sim.veroeffentlichungen().len();
    let wechsel = machine.stats().snapshot().transitions;

    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(sim.veroeffentlichungen().len(), veroeffentlicht);
    assert_eq!(machine.stats().snapshot().transitions, wechsel);
    route_gueltig(&machine);
}

#[test]
fn nicht_verfuegbare_route_wird_ignoriert() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    senden(&mut machine, Command::SwitchHeadset(SwitchOrigin::User));

    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert_eq!(machine.stats().snapshot().ignored_commands, 1);
}

#[test]
fn wechsel_ueber_numerischen_code() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    let command = Command::from_code(1104, 0, None).unwrap();
    senden(&mut machine, command);

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Speaker
    );
}

// ---------------------------------------------------------------------------
// Kabel-Headset
// ---------------------------------------------------------------------------

#[test]
fn headset_im_ruhezustand() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = automat(&sim);

    let event = sim.headset_einstecken();
    ereignis(&mut machine, event);

    assert_eq!(machine.state(), Some(MachineState::QuiescentHeadset));
    assert!(sim.veroeffentlichungen().is_empty());
    let aktuell = machine.current_audio_state().unwrap();
    assert_eq!(aktuell.route, Route::WiredHeadset);
    assert_eq!(
        aktuell.supported_routes,
        RouteMask::WIRED_HEADSET.union(RouteMask::SPEAKER)
    );
}

#[test]
fn headset_ziehen_fuehrt_zum_hoerer() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    let event = sim.headset_einstecken();
    ereignis(&mut machine, event);
    assert_eq!(machine.state(), Some(MachineState::ActiveHeadset));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::WiredHeadset)
    );

    let event = sim.headset_ziehen();
    ereignis(&mut machine, event);

    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    let state = machine.last_known_audio_state().unwrap();
    assert_eq!(state.route, Route::Earpiece);
    assert_eq!(state.supported_routes, RouteMask::EARPIECE.union(RouteMask::SPEAKER));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinEarpiece)
    );
}

#[test]
fn headset_ziehen_kehrt_zum_lautsprecher_zurueck() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));

    let event = sim.headset_einstecken();
    ereignis(&mut machine, event);
    assert_eq!(machine.state(), Some(MachineState::ActiveHeadset));

    let event = sim.headset_ziehen();
    ereignis(&mut machine, event);

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinSpeaker)
    );
    route_gueltig(&machine);
}

// ---------------------------------------------------------------------------
// Bluetooth
// ---------------------------------------------------------------------------

#[test]
fn bluetooth_wechsel_ist_zweiphasig() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    let event = sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01").mit_name("Auto"));
    ereignis(&mut machine, event);
    assert!(machine
        .last_known_audio_state()
        .unwrap()
        .supported_routes
        .contains(Route::Bluetooth));

    let event = sim.bluetooth_aktiv_setzen(Some("AA:01"));
    ereignis(&mut machine, event);

    // SCO angefordert, aber noch nicht bestaetigt
    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert_eq!(sim.anzahl(&SimAction::ConnectAudio(None)), 1);
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Earpiece
    );

    let event = sim.bluetooth_audio_bestaetigen().unwrap();
    ereignis(&mut machine, event);

    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
    let state = machine.last_known_audio_state().unwrap();
    assert_eq!(state.route, Route::Bluetooth);
    assert_eq!(state.active_bluetooth_device.unwrap().address, "AA:01");
    assert_eq!(state.connected_bluetooth_devices.len(), 1);
    assert!(sim.anzahl(&SimAction::RingerModeChange) >= 1);
    route_gueltig(&machine);
}

#[test]
fn benutzer_verlaesst_bluetooth() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    ereignis(&mut machine, sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01")));
    ereignis(&mut machine, sim.bluetooth_aktiv_setzen(Some("AA:01")));
    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));

    senden(&mut machine, Command::SwitchEarpiece(SwitchOrigin::User));
    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert!(machine.context().has_user_explicitly_left_bluetooth);
    assert_eq!(sim.anzahl(&SimAction::DisconnectAudio), 1);
    assert!(sim.bluetooth_audio_geraet().is_none());

    // Aktives Geraet meldet sich erneut: kein automatischer Wechsel
    sim.aktionen_leeren();
    ereignis(&mut machine, sim.bluetooth_aktiv_setzen(Some("AA:01")));
    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert!(!sim
        .aktionen()
        .iter()
        .any(|a| matches!(a, SimAction::ConnectAudio(_))));

    // Ausdruecklicher Wunsch setzt das Flag zurueck
    senden(
        &mut machine,
        Command::SwitchBluetooth {
            origin: SwitchOrigin::User,
            address: Some("AA:01".into()),
        },
    );
    assert!(!machine.context().has_user_explicitly_left_bluetooth);
    assert_eq!(
        sim.anzahl(&SimAction::ConnectAudio(Some("AA:01".into()))),
        1
    );
}

#[test]
fn klingeln_ohne_inband_verbindet_erst_bei_annahme() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);
    assert_eq!(machine.state(), Some(MachineState::QuiescentBluetooth));

    senden(&mut machine, Command::SwitchFocus(AudioFocus::RingingFocus));
    assert_eq!(machine.state(), Some(MachineState::RingingBluetooth));
    assert!(!machine.is_in_active_state());
    assert_eq!(sim.bluetooth_anforderung(), None);
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Bluetooth
    );

    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    assert_eq!(machine.state(), Some(MachineState::RingingBluetooth));
    assert_eq!(sim.bluetooth_anforderung(), Some(None));

    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
    assert!(machine.is_in_active_state());
}

#[test]
fn klingeln_mit_inband_verbindet_sofort() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    sim.inband_setzen(true);
    let mut machine = automat(&sim);

    senden(&mut machine, Command::SwitchFocus(AudioFocus::RingingFocus));
    assert_eq!(machine.state(), Some(MachineState::QuiescentBluetooth));
    assert_eq!(sim.bluetooth_anforderung(), Some(None));

    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
}

#[test]
fn bluetooth_verlust_ohne_hoerer_faellt_auf_lautsprecher() {
    let sim = Arc::new(SimulatedPlatform::ohne_hoerer());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);

    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());

    ereignis(&mut machine, sim.bluetooth_trennen("AA:01"));

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    let state = machine.last_known_audio_state().unwrap();
    assert_eq!(state.route, Route::Speaker);
    assert_eq!(state.supported_routes, RouteMask::SPEAKER);
    assert!(state.active_bluetooth_device.is_none());
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinSpeaker)
    );
}

#[test]
fn sco_abbruch_fuehrt_zum_hoerer() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);
    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());

    ereignis(&mut machine, sim.bluetooth_audio_verlieren());

    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    route_gueltig(&machine);
}

#[test]
fn nur_uhren_werden_nicht_automatisch_gewaehlt() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("W:01").mit_klasse(DeviceClass::Watch));
    let mut machine = aktiv_auf_hoerer(&sim);

    let baseline = || Command::SwitchBaselineRoute {
        origin: SwitchOrigin::Derived,
        include_bluetooth: true,
    };
    senden(&mut machine, baseline());
    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert_eq!(sim.anzahl(&SimAction::ConnectAudio(None)), 0);

    ereignis(&mut machine, sim.bluetooth_verbinden(BluetoothDevice::neu("H:01")));
    senden(&mut machine, baseline());
    assert_eq!(sim.anzahl(&SimAction::ConnectAudio(None)), 1);
}

// ---------------------------------------------------------------------------
// Stummschaltung
// ---------------------------------------------------------------------------

#[test]
fn mute_im_ruhezustand_veroeffentlicht_nicht() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = automat(&sim);

    senden(&mut machine, Command::MuteOn);

    assert!(sim.veroeffentlichungen().is_empty());
    assert!(!sim.mikrofon_stumm());
    assert!(machine.current_audio_state().unwrap().muted);

    // Der gemerkte Wert wird beim Aktivieren veroeffentlicht
    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    assert!(sim.letzte_veroeffentlichung().unwrap().muted);
}

#[test]
fn mute_im_aktiven_zustand() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    senden(&mut machine, Command::MuteOn);
    assert!(sim.mikrofon_stumm());
    assert!(sim.letzte_veroeffentlichung().unwrap().muted);
    assert_eq!(sim.anzahl(&SimAction::NotifyMute(true)), 1);

    senden(&mut machine, Command::MuteOff);
    assert!(!sim.mikrofon_stumm());
    assert!(!sim.letzte_veroeffentlichung().unwrap().muted);
}

#[test]
fn mute_von_aussen_wird_uebernommen() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    ereignis(&mut machine, sim.mikrofon_extern_setzen(true));

    assert!(machine.context().muted);
    assert!(machine.last_known_audio_state().unwrap().muted);
}

#[test]
fn notruf_erzwingt_mikrofon_an() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    sim.notruf_setzen(true);

    ereignis(&mut machine, sim.mikrofon_extern_setzen(true));

    assert!(!sim.mikrofon_stumm());
    assert!(!machine.context().muted);
}

#[test]
fn mute_fehler_bricht_nicht_ab() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    sim.mute_fehler_setzen(true);

    senden(&mut machine, Command::MuteOn);

    assert!(!sim.mikrofon_stumm());
    assert!(machine.context().muted);
    assert_eq!(machine.stats().snapshot().handler_failures, 0);
}

// ---------------------------------------------------------------------------
// Lautsprecher von aussen
// ---------------------------------------------------------------------------

#[test]
fn lautsprecher_von_aussen_eingeschaltet() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    ereignis(&mut machine, sim.lautsprecher_extern_setzen(true));

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Speaker
    );
}

#[test]
fn lautsprecher_von_aussen_ausgeschaltet() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));

    ereignis(&mut machine, sim.lautsprecher_extern_setzen(false));

    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    route_gueltig(&machine);
}

// ---------------------------------------------------------------------------
// Streaming, Anruf-Routen, Wiederholung
// ---------------------------------------------------------------------------

#[test]
fn streaming_ignoriert_wechsel() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    ereignis(&mut machine, PlatformEvent::StreamingForceEnabled);
    assert_eq!(machine.state(), Some(MachineState::Streaming));
    let state = machine.last_known_audio_state().unwrap();
    assert_eq!(state.route, Route::Streaming);
    assert_eq!(state.supported_routes, RouteMask::STREAMING);

    let ignoriert = machine.stats().snapshot().ignored_commands;
    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));
    assert_eq!(machine.state(), Some(MachineState::Streaming));
    assert_eq!(machine.stats().snapshot().ignored_commands, ignoriert + 1);

    ereignis(&mut machine, PlatformEvent::StreamingForceDisabled);
    assert_eq!(machine.state(), Some(MachineState::QuiescentEarpiece));
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Earpiece
    );
}

#[test]
fn anruf_schraenkt_routen_ein() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    sim.vordergrund_routen_setzen(Some(RouteMask::SPEAKER));
    senden(&mut machine, Command::UpdateSystemAudioRoute);

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    let state = machine.last_known_audio_state().unwrap();
    assert_eq!(state.route, Route::Speaker);
    assert_eq!(state.supported_routes, RouteMask::SPEAKER);
    assert_eq!(machine.context().device_supported_routes, RouteMask::EARPIECE.union(RouteMask::SPEAKER));
}

#[test]
fn verfolgte_anrufe_erhalten_zustand() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let id = CallId::new();
    let verbindung = sim.anruf_verfolgen(id);
    let mut machine = aktiv_auf_hoerer(&sim);
    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));

    let zustaende = verbindung.zustaende();
    assert_eq!(zustaende.len(), sim.veroeffentlichungen().len());
    let (call, state) = zustaende.last().cloned().unwrap();
    assert_eq!(call, id);
    assert_eq!(state.route, Route::Speaker);
}

#[test]
fn zustand_erneut_senden() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    let vorher = sim.veroeffentlichungen().len();

    senden(&mut machine, Command::ResendCurrentState);

    let alle = sim.veroeffentlichungen();
    assert_eq!(alle.len(), vorher + 1);
    let (alt, neu) = alle.last().cloned().unwrap();
    assert_eq!(alt.as_ref(), Some(&neu));
}

#[test]
fn ruhendes_headset_wechselt_ins_streaming() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = automat(&sim);
    ereignis(&mut machine, sim.headset_einstecken());
    assert_eq!(machine.state(), Some(MachineState::QuiescentHeadset));
    let ignoriert = machine.stats().snapshot().ignored_commands;

    ereignis(&mut machine, PlatformEvent::StreamingForceEnabled);

    assert_eq!(machine.state(), Some(MachineState::Streaming));
    assert_eq!(machine.stats().snapshot().ignored_commands, ignoriert);
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Streaming
    );

    ereignis(&mut machine, PlatformEvent::StreamingForceDisabled);
    assert_eq!(machine.state(), Some(MachineState::QuiescentHeadset));
}

#[test]
fn streaming_ende_ohne_streaming_aendert_nichts() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);
    assert_eq!(machine.state(), Some(MachineState::QuiescentBluetooth));

    let pruefen = |machine: &mut RouteMachine, erwartet: MachineState| {
        let vorher = machine.stats().snapshot();
        let veroeffentlicht = sim.veroeffentlichungen().len();
        ereignis(machine, PlatformEvent::StreamingForceDisabled);
        let nachher = machine.stats().snapshot();
        assert_eq!(machine.state(), Some(erwartet));
        assert_eq!(nachher.ignored_commands, vorher.ignored_commands);
        assert_eq!(nachher.transitions, vorher.transitions);
        assert_eq!(nachher.handler_failures, vorher.handler_failures);
        assert_eq!(sim.veroeffentlichungen().len(), veroeffentlicht);
    };

    pruefen(&mut machine, MachineState::QuiescentBluetooth);

    senden(&mut machine, Command::SwitchEarpiece(SwitchOrigin::User));
    pruefen(&mut machine, MachineState::QuiescentEarpiece);

    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));
    pruefen(&mut machine, MachineState::QuiescentSpeaker);

    ereignis(&mut machine, sim.headset_einstecken());
    pruefen(&mut machine, MachineState::QuiescentHeadset);
}

// ---------------------------------------------------------------------------
// Dock
// ---------------------------------------------------------------------------

#[test]
fn dock_im_gespraech_schaltet_lautsprecher() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);

    ereignis(&mut machine, PlatformEvent::DockConnected);

    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinSpeaker)
    );
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Speaker
    );
    route_gueltig(&machine);
}

#[test]
fn dock_im_ruhezustand_waehlt_lautsprecher() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = automat(&sim);
    assert_eq!(machine.state(), Some(MachineState::QuiescentEarpiece));

    ereignis(&mut machine, PlatformEvent::DockConnected);

    assert_eq!(machine.state(), Some(MachineState::QuiescentSpeaker));
    assert_eq!(
        machine.current_audio_state().unwrap().route,
        Route::Speaker
    );
}

#[test]
fn dock_trennen_kehrt_zur_baseline_zurueck() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    ereignis(&mut machine, PlatformEvent::DockConnected);
    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));

    ereignis(&mut machine, PlatformEvent::DockDisconnected);

    assert_eq!(machine.state(), Some(MachineState::ActiveEarpiece));
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Earpiece
    );
    assert_eq!(
        sim.kommunikationsgeraet(),
        Some(CommunicationDevice::BuiltinEarpiece)
    );
    route_gueltig(&machine);
}

// ---------------------------------------------------------------------------
// Bluetooth, weitere Faelle
// ---------------------------------------------------------------------------

#[test]
fn klingeln_im_bluetooth_gespraech_ohne_inband() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);
    senden(&mut machine, Command::SwitchFocus(AudioFocus::ActiveFocus));
    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));

    senden(&mut machine, Command::SwitchFocus(AudioFocus::RingingFocus));

    assert_eq!(machine.state(), Some(MachineState::RingingBluetooth));
    assert!(!machine.is_in_active_state());
    assert_eq!(sim.anzahl(&SimAction::DisconnectAudio), 1);
    assert!(sim.bluetooth_audio_geraet().is_none());
    assert_eq!(
        machine.last_known_audio_state().unwrap().route,
        Route::Bluetooth
    );
    route_gueltig(&machine);
}

#[test]
fn ruhendes_bluetooth_faellt_nach_trennung_auf_hoerer() {
    let sim = Arc::new(SimulatedPlatform::neu());
    sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01"));
    sim.bluetooth_aktiv_setzen(Some("AA:01"));
    let mut machine = automat(&sim);
    assert_eq!(machine.state(), Some(MachineState::QuiescentBluetooth));

    ereignis(&mut machine, sim.bluetooth_trennen("AA:01"));

    assert_eq!(machine.state(), Some(MachineState::QuiescentEarpiece));
    assert!(!machine.is_in_active_state());
    let aktuell = machine.current_audio_state().unwrap();
    assert_eq!(aktuell.route, Route::Earpiece);
    assert!(!aktuell.supported_routes.contains(Route::Bluetooth));
    assert!(!machine.context().available_routes.contains(Route::Bluetooth));
}

// ---------------------------------------------------------------------------
// Gemischte Ablaeufe
// ---------------------------------------------------------------------------

#[test]
fn gemischter_ablauf_bleibt_gueltig() {
    let sim = Arc::new(SimulatedPlatform::neu());
    let mut machine = aktiv_auf_hoerer(&sim);
    route_gueltig(&machine);

    ereignis(&mut machine, PlatformEvent::DockConnected);
    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    route_gueltig(&machine);

    ereignis(&mut machine, sim.headset_einstecken());
    assert_eq!(machine.state(), Some(MachineState::ActiveHeadset));
    route_gueltig(&machine);

    ereignis(&mut machine, sim.bluetooth_verbinden(BluetoothDevice::neu("AA:01")));
    route_gueltig(&machine);

    ereignis(&mut machine, sim.bluetooth_aktiv_setzen(Some("AA:01")));
    assert_eq!(sim.anzahl(&SimAction::ConnectAudio(None)), 1);
    route_gueltig(&machine);

    ereignis(&mut machine, sim.bluetooth_audio_bestaetigen().unwrap());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
    route_gueltig(&machine);

    ereignis(&mut machine, sim.headset_ziehen());
    assert_eq!(machine.state(), Some(MachineState::ActiveBluetooth));
    route_gueltig(&machine);

    senden(&mut machine, Command::SwitchSpeaker(SwitchOrigin::User));
    assert_eq!(machine.state(), Some(MachineState::ActiveSpeaker));
    route_gueltig(&machine);

    ereignis(&mut machine, PlatformEvent::DockDisconnected);
    assert!(machine.is_in_active_state());
    route_gueltig(&machine);

    ereignis(&mut machine, sim.bluetooth_trennen("AA:01"));
    route_gueltig(&machine);

    senden(&mut machine, Command::MuteOn);
    route_gueltig(&machine);

    senden(&mut machine, Command::SwitchFocus(AudioFocus::NoFocus));
    assert!(!machine.is_in_active_state());
    route_gueltig(&machine);
    assert_eq!(machine.stats().snapshot().handler_failures, 0);
}
