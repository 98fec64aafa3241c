//! Daemon-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Daemon ohne Konfigurationsdatei
//! lauffaehig ist.

use callroute_core::{BluetoothDevice, DeviceClass};
use callroute_routing::RouterConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Daemon-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Router-Einstellungen
    pub router: RouterConfig,
    /// Simulierte Hardware beim Start
    pub hardware: HardwareEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
    /// Observability-Einstellungen (Metriken, Health)
    pub observability: ObservabilityEinstellungen,
}

/// Anfangszustand der simulierten Hardware
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareEinstellungen {
    /// Eingebauter Hoerer vorhanden (false = Tablet)
    pub hoerer: bool,
    pub headset_eingesteckt: bool,
    /// Gekoppelte und verbundene Bluetooth-Geraete
    pub bluetooth: Vec<BluetoothEinstellung>,
    /// Adresse des aktiven Bluetooth-Geraets
    pub aktives_geraet: Option<String>,
    /// In-Band-Klingeln ueber Bluetooth
    pub inband: bool,
    /// SCO-Anforderungen sofort bestaetigen
    pub sco_automatisch: bool,
}

impl Default for HardwareEinstellungen {
    fn default() -> Self {
        Self {
            hoerer: true,
            headset_eingesteckt: false,
            bluetooth: vec![],
            aktives_geraet: None,
            inband: false,
            sco_automatisch: true,
        }
    }
}

/// Ein vorkonfiguriertes Bluetooth-Geraet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BluetoothEinstellung {
    pub adresse: String,
    pub name: Option<String>,
    /// Smartwatch (wird bei der Routenwahl uebergangen)
    pub uhr: bool,
}

impl BluetoothEinstellung {
    pub fn geraet(&self) -> BluetoothDevice {
        let mut geraet = BluetoothDevice::neu(self.adresse.clone());
        if let Some(name) = &self.name {
            geraet = geraet.mit_name(name.clone());
        }
        if self.uhr {
            geraet = geraet.mit_klasse(DeviceClass::Watch);
        }
        geraet
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

/// Observability-Einstellungen (Metriken + Health-Check)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityEinstellungen {
    /// Aktiviert den Observability-Server
    pub aktiviert: bool,
    pub bind_adresse: String,
    /// Port fuer Metriken und Health (Standard: 9300)
    pub port: u16,
    /// Abstand in Millisekunden zwischen zwei Metrik-Abgleichen
    pub abgleich_ms: u64,
}

impl Default for ObservabilityEinstellungen {
    fn default() -> Self {
        Self {
            aktiviert: false,
            bind_adresse: "127.0.0.1".into(),
            port: 9300,
            abgleich_ms: 1000,
        }
    }
}

impl DaemonConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Gibt die Bind-Adresse fuer den Observability-Server zurueck
    pub fn observability_bind_adresse(&self) -> String {
        format!(
            "{}:{}",
            self.observability.bind_adresse, self.observability.port
        )
    }
}
