//! Routen-Datenmodell
//!
//! - [`Route`] – eine einzelne Audio-Route (Hoerer, Headset, Bluetooth, ...)
//! - [`RouteMask`] – Bitmaske mehrerer Routen
//! - [`AudioFocus`] – Fokus-Modus des aktuellen Anrufs
//! - [`BluetoothDevice`] – verbundenes Bluetooth-Geraet
//! - [`RouteState`] – unveraenderlicher, veroeffentlichter Audio-Zustand

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Physischer oder logischer Audio-Pfad fuer Anruf-Audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Eingebauter Hoerer
    Earpiece,
    /// Kabelgebundenes Headset
    WiredHeadset,
    /// Bluetooth (SCO/HFP)
    Bluetooth,
    /// Eingebauter Lautsprecher
    Speaker,
    /// Audio wird an ein entferntes Geraet gestreamt
    Streaming,
}

impl Route {
    /// Alle Routen in Bit-Reihenfolge
    pub const ALLE: [Route; 5] = [
        Route::Earpiece,
        Route::Bluetooth,
        Route::WiredHeadset,
        Route::Speaker,
        Route::Streaming,
    ];

    /// Bit dieser Route innerhalb einer [`RouteMask`]
    pub const fn bit(self) -> u8 {
        match self {
            Route::Earpiece => 0x01,
            Route::Bluetooth => 0x02,
            Route::WiredHeadset => 0x04,
            Route::Speaker => 0x08,
            Route::Streaming => 0x10,
        }
    }

    /// Gibt die Route zu einem einzelnen Bit zurueck
    pub fn from_bit(bit: u8) -> Option<Route> {
        Route::ALLE.into_iter().find(|r| r.bit() == bit)
    }

    /// Grossgeschriebener Name wie in Logs und Dumps
    pub fn name(self) -> &'static str {
        match self {
            Route::Earpiece => "EARPIECE",
            Route::WiredHeadset => "WIRED_HEADSET",
            Route::Bluetooth => "BLUETOOTH",
            Route::Speaker => "SPEAKER",
            Route::Streaming => "STREAMING",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// RouteMask
// ---------------------------------------------------------------------------

/// Bitmaske verfuegbarer bzw. unterstuetzter Routen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteMask(u8);

impl RouteMask {
    pub const NONE: RouteMask = RouteMask(0);
    pub const EARPIECE: RouteMask = RouteMask(Route::Earpiece.bit());
    pub const BLUETOOTH: RouteMask = RouteMask(Route::Bluetooth.bit());
    pub const WIRED_HEADSET: RouteMask = RouteMask(Route::WiredHeadset.bit());
    pub const SPEAKER: RouteMask = RouteMask(Route::Speaker.bit());
    pub const STREAMING: RouteMask = RouteMask(Route::Streaming.bit());
    /// Alle Routen – Standard fuer Anrufe ohne Einschraenkung
    pub const ALL: RouteMask = RouteMask(0x1F);

    /// Erstellt eine Maske aus rohen Bits (unbekannte Bits werden verworfen)
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Gibt die rohen Bits zurueck
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Prueft ob eine Route in der Maske enthalten ist
    pub const fn contains(self, route: Route) -> bool {
        self.0 & route.bit() != 0
    }

    /// Gibt eine Kopie mit zusaetzlicher Route zurueck
    pub const fn with(self, route: Route) -> Self {
        Self(self.0 | route.bit())
    }

    /// Gibt eine Kopie ohne die Route zurueck
    pub const fn without(self, route: Route) -> Self {
        Self(self.0 & !route.bit())
    }

    pub const fn union(self, other: RouteMask) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: RouteMask) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: RouteMask) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn insert(&mut self, route: Route) {
        self.0 |= route.bit();
    }

    pub fn remove(&mut self, route: Route) {
        self.0 &= !route.bit();
    }

    /// Iteriert ueber alle enthaltenen Routen
    pub fn routes(self) -> impl Iterator<Item = Route> {
        Route::ALLE.into_iter().filter(move |r| self.contains(*r))
    }
}

impl From<Route> for RouteMask {
    fn from(route: Route) -> Self {
        RouteMask(route.bit())
    }
}

impl FromIterator<Route> for RouteMask {
    fn from_iter<I: IntoIterator<Item = Route>>(iter: I) -> Self {
        iter.into_iter()
            .fold(RouteMask::NONE, |mask, route| mask.with(route))
    }
}

impl fmt::Display for RouteMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("NONE");
        }
        let namen: Vec<&str> = self.routes().map(Route::name).collect();
        f.write_str(&namen.join("|"))
    }
}

// ---------------------------------------------------------------------------
// AudioFocus
// ---------------------------------------------------------------------------

/// Fokus-Modus des Anrufs (vom Call-Lifecycle-Manager gemeldet)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFocus {
    /// Kein Anruf beansprucht den Audio-Pfad
    #[default]
    NoFocus,
    /// Ein Anruf klingelt
    RingingFocus,
    /// Ein Anruf ist aktiv
    ActiveFocus,
}

impl AudioFocus {
    /// Numerischer Code im Kommando-Argument
    pub const fn code(self) -> i32 {
        match self {
            AudioFocus::NoFocus => 1,
            AudioFocus::ActiveFocus => 2,
            AudioFocus::RingingFocus => 3,
        }
    }

    /// Dekodiert einen numerischen Fokus-Code
    pub fn from_code(code: i32) -> Option<AudioFocus> {
        match code {
            1 => Some(AudioFocus::NoFocus),
            2 => Some(AudioFocus::ActiveFocus),
            3 => Some(AudioFocus::RingingFocus),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AudioFocus::NoFocus => "NO_FOCUS",
            AudioFocus::RingingFocus => "RINGING_FOCUS",
            AudioFocus::ActiveFocus => "ACTIVE_FOCUS",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// BluetoothDevice
// ---------------------------------------------------------------------------

/// Geraeteklasse eines Bluetooth-Geraets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    #[default]
    Headset,
    HearingAid,
    Watch,
    Car,
}

/// Ein (gekoppeltes und verbundenes) Bluetooth-Geraet
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BluetoothDevice {
    /// Hardware-Adresse, z.B. "00:11:22:33:44:55"
    pub address: String,
    /// Anzeigename (optional)
    pub name: Option<String>,
    /// Geraeteklasse
    #[serde(default)]
    pub class: DeviceClass,
}

impl BluetoothDevice {
    /// Erstellt ein Headset-Geraet ohne Namen
    pub fn neu(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: None,
            class: DeviceClass::Headset,
        }
    }

    /// Setzt den Anzeigenamen
    pub fn mit_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Setzt die Geraeteklasse
    pub fn mit_klasse(mut self, class: DeviceClass) -> Self {
        self.class = class;
        self
    }

    pub fn ist_uhr(&self) -> bool {
        self.class == DeviceClass::Watch
    }
}

impl fmt::Display for BluetoothDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", self.address, name),
            None => f.write_str(&self.address),
        }
    }
}

// ---------------------------------------------------------------------------
// RouteState
// ---------------------------------------------------------------------------

/// Veroeffentlichter Audio-Zustand eines Anrufs
///
/// Wird bei jeder beobachtbaren Aenderung neu berechnet und per Wert mit dem
/// zuletzt veroeffentlichten Zustand verglichen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteState {
    /// Mikrofon stummgeschaltet?
    pub muted: bool,
    /// Aktuelle Route
    pub route: Route,
    /// Aktuell waehlbare Routen
    pub supported_routes: RouteMask,
    /// Bluetooth-Geraet mit bestaetigter Audio-Verbindung (nur bei Route Bluetooth)
    pub active_bluetooth_device: Option<BluetoothDevice>,
    /// Alle verbundenen Bluetooth-Geraete
    pub connected_bluetooth_devices: BTreeSet<BluetoothDevice>,
}

impl RouteState {
    /// Erstellt einen Zustand ohne Bluetooth-Geraete
    pub fn neu(muted: bool, route: Route, supported_routes: RouteMask) -> Self {
        Self {
            muted,
            route,
            supported_routes,
            active_bluetooth_device: None,
            connected_bluetooth_devices: BTreeSet::new(),
        }
    }

    /// Setzt das aktive Bluetooth-Geraet
    pub fn mit_aktivem_geraet(mut self, device: Option<BluetoothDevice>) -> Self {
        self.active_bluetooth_device = device;
        self
    }

    /// Setzt die verbundenen Bluetooth-Geraete
    pub fn mit_verbundenen_geraeten<I>(mut self, devices: I) -> Self
    where
        I: IntoIterator<Item = BluetoothDevice>,
    {
        self.connected_bluetooth_devices = devices.into_iter().collect();
        self
    }

    /// Prueft ob die Route in der Maske der waehlbaren Routen liegt
    pub fn route_ist_unterstuetzt(&self) -> bool {
        self.supported_routes.contains(self.route)
    }
}

impl fmt::Display for RouteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aktiv = self
            .active_bluetooth_device
            .as_ref()
            .map(|d| d.address.as_str())
            .unwrap_or("-");
        let verbunden: Vec<&str> = self
            .connected_bluetooth_devices
            .iter()
            .map(|d| d.address.as_str())
            .collect();
        write!(
            f,
            "[RouteState muted={} route={} supported={} active_bt={} connected=[{}]]",
            self.muted,
            self.route,
            self.supported_routes,
            aktiv,
            verbunden.join(", ")
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
