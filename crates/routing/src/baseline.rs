//! Baseline-Policy und Routenmasken
//!
//! Reine Funktionen ohne Zugriff auf Kollaborateure. Der Automat sammelt
//! die Eingaben und uebersetzt das Ergebnis in interne Kommandos.

use callroute_core::{BluetoothDevice, Route, RouteMask};

use crate::message::{Command, SwitchOrigin};

/// Eingaben fuer die Baseline-Berechnung
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineInputs {
    pub available_routes: RouteMask,
    pub has_user_explicitly_left_bluetooth: bool,
    /// Nur relevant bei abgeleiteten Wechseln
    pub has_video_call: bool,
    /// Nur Uhren verbunden und keine davon aktiv
    pub only_inactive_watches: bool,
}

/// Beste Route fuer die aktuelle Lage
///
/// Reihenfolge: Bluetooth, Hoerer, Kabel-Headset, Lautsprecher. Bei
/// abgeleiteten Wechseln mit Videoanruf wird der Hoerer uebersprungen.
pub fn calculate_baseline(is_user: bool, include_bluetooth: bool, inputs: &BaselineInputs) -> Route {
    let skip_earpiece = !is_user && inputs.has_video_call;
    let available = inputs.available_routes;

    if available.contains(Route::Bluetooth)
        && !inputs.has_user_explicitly_left_bluetooth
        && include_bluetooth
        && !inputs.only_inactive_watches
    {
        Route::Bluetooth
    } else if available.contains(Route::Earpiece) && !skip_earpiece {
        Route::Earpiece
    } else if available.contains(Route::WiredHeadset) {
        Route::WiredHeadset
    } else {
        Route::Speaker
    }
}

/// Wechsel-Kommando fuer eine Baseline-Route
///
/// `Streaming` ist nie Ergebnis der Baseline und faellt auf den
/// Lautsprecher zurueck.
pub fn baseline_command(route: Route, origin: SwitchOrigin) -> Command {
    match route {
        Route::Bluetooth => Command::SwitchBluetooth {
            origin,
            address: None,
        },
        Route::Earpiece => Command::SwitchEarpiece(origin),
        Route::WiredHeadset => Command::SwitchHeadset(origin),
        Route::Speaker | Route::Streaming => Command::SwitchSpeaker(origin),
    }
}

/// Vom Geraet unterstuetzte Routen
///
/// Lautsprecher immer. Ein eingestecktes Headset verdraengt den Hoerer.
pub fn calculate_supported_routes(
    headset_plugged_in: bool,
    earpiece_supported: bool,
    bluetooth_available: bool,
) -> RouteMask {
    let mut mask = RouteMask::SPEAKER;
    if headset_plugged_in {
        mask.insert(Route::WiredHeadset);
    } else if earpiece_supported {
        mask.insert(Route::Earpiece);
    }
    if bluetooth_available {
        mask.insert(Route::Bluetooth);
    }
    mask
}

/// Startroute fuer `initialize()` und Reinitialisierung
pub fn initial_route(supported: RouteMask, has_active_bluetooth_device: bool) -> Route {
    if supported.contains(Route::Bluetooth) && has_active_bluetooth_device {
        Route::Bluetooth
    } else if supported.contains(Route::WiredHeadset) {
        Route::WiredHeadset
    } else if supported.contains(Route::Earpiece) {
        Route::Earpiece
    } else {
        Route::Speaker
    }
}

/// Sind nur Uhren verbunden, von denen keine gerade Audio traegt?
pub fn only_inactive_watches<F>(
    connected: &[BluetoothDevice],
    audio_device: Option<&BluetoothDevice>,
    is_watch: F,
) -> bool
where
    F: Fn(&BluetoothDevice) -> bool,
{
    let uhr = connected.iter().any(&is_watch);
    let andere = connected.iter().any(|d| !is_watch(d));
    let aktive_uhr = audio_device.map(&is_watch).unwrap_or(false);
    uhr && !andere && !aktive_uhr
}

#[cfg(test)]
mod tests {
    use super::*;
    use callroute_core::DeviceClass;

    fn eingaben(mask: RouteMask) -> BaselineInputs {
        BaselineInputs {
            available_routes: mask,
            ..Default::default()
        }
    }

    #[test]
    fn bluetooth_hat_vorrang() {
        let mask = RouteMask::ALL;
        assert_eq!(calculate_baseline(false, true, &eingaben(mask)), Route::Bluetooth);
        assert_eq!(calculate_baseline(false, false, &eingaben(mask)), Route::Earpiece);
    }

    #[test]
    fn benutzer_hat_bluetooth_verlassen() {
        let inputs = BaselineInputs {
            available_routes: RouteMask::BLUETOOTH.union(RouteMask::WIRED_HEADSET),
            has_user_explicitly_left_bluetooth: true,
            ..Default::default()
        };
        assert_eq!(calculate_baseline(true, true, &inputs), Route::WiredHeadset);
    }

    #[test]
    fn videoanruf_ueberspringt_hoerer_nur_abgeleitet() {
        let inputs = BaselineInputs {
            available_routes: RouteMask::EARPIECE.union(RouteMask::SPEAKER),
            has_video_call: true,
            ..Default::default()
        };
        assert_eq!(calculate_baseline(false, true, &inputs), Route::Speaker);
        assert_eq!(calculate_baseline(true, true, &inputs), Route::Earpiece);
    }

    #[test]
    fn nur_uhren_blockieren_bluetooth() {
        let inputs = BaselineInputs {
            available_routes: RouteMask::BLUETOOTH.union(RouteMask::EARPIECE),
            only_inactive_watches: true,
            ..Default::default()
        };
        assert_eq!(calculate_baseline(false, true, &inputs), Route::Earpiece);
    }

    #[test]
    fn leere_maske_ergibt_lautsprecher() {
        assert_eq!(
            calculate_baseline(false, true, &eingaben(RouteMask::NONE)),
            Route::Speaker
        );
    }

    #[test]
    fn headset_verdraengt_hoerer() {
        let mask = calculate_supported_routes(true, true, false);
        assert_eq!(mask, RouteMask::WIRED_HEADSET.union(RouteMask::SPEAKER));
        let ohne = calculate_supported_routes(false, true, true);
        assert_eq!(
            ohne,
            RouteMask::EARPIECE
                .union(RouteMask::SPEAKER)
                .union(RouteMask::BLUETOOTH)
        );
        assert_eq!(calculate_supported_routes(false, false, false), RouteMask::SPEAKER);
    }

    #[test]
    fn startroute() {
        assert_eq!(initial_route(RouteMask::ALL, true), Route::Bluetooth);
        assert_eq!(
            initial_route(RouteMask::BLUETOOTH.union(RouteMask::EARPIECE), false),
            Route::Earpiece
        );
        assert_eq!(initial_route(RouteMask::SPEAKER, false), Route::Speaker);
    }

    #[test]
    fn uhren_erkennung() {
        let uhr = BluetoothDevice::neu("11:11").mit_klasse(DeviceClass::Watch);
        let headset = BluetoothDevice::neu("22:22");
        let ist_uhr = |d: &BluetoothDevice| d.ist_uhr();

        assert!(only_inactive_watches(&[uhr.clone()], None, ist_uhr));
        assert!(!only_inactive_watches(&[uhr.clone()], Some(&uhr), ist_uhr));
        assert!(!only_inactive_watches(&[uhr, headset], None, ist_uhr));
        assert!(!only_inactive_watches(&[], None, ist_uhr));
    }

    #[test]
    fn kommando_traegt_herkunft() {
        let cmd = baseline_command(Route::WiredHeadset, SwitchOrigin::User);
        assert!(matches!(cmd, Command::SwitchHeadset(SwitchOrigin::User)));
        let bt = baseline_command(Route::Bluetooth, SwitchOrigin::Derived);
        assert!(matches!(
            bt,
            Command::SwitchBluetooth {
                origin: SwitchOrigin::Derived,
                address: None
            }
        ));
    }
}
