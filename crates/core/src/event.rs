//! Plattform-Ereignisse
//!
//! Signale von Betriebssystem und Hardware, bevor sie in Nachrichten der
//! Routing-Engine uebersetzt werden. Die Uebersetzung erfolgt im
//! Routing-Crate (`adapters`), das [`EventSink`] implementiert.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Audio-Stream des OS-Mixers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStream {
    Ring,
    VoiceCall,
    Music,
    Alarm,
    Notification,
}

/// Alle Hardware- und OS-Signale die das Routing beeinflussen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlatformEvent {
    // --- Kabel-Headset ---
    WiredHeadsetPlugged,
    WiredHeadsetUnplugged,

    // --- Bluetooth ---
    /// Menge der verbundenen Geraete hat sich geaendert
    BluetoothDeviceListChanged,
    BluetoothActiveDevicePresent,
    BluetoothActiveDeviceGone,
    /// SCO-Verbindung bestaetigt
    BluetoothAudioConnected,
    BluetoothAudioDisconnected,

    // --- Dock ---
    DockConnected,
    DockDisconnected,

    // --- Streaming ---
    StreamingForceEnabled,
    StreamingForceDisabled,

    // --- OS-Broadcasts ---
    /// Mikrofon-Stummschaltung wurde ausserhalb des Routers geaendert
    MicrophoneMuteChanged,
    /// Stummschaltung eines Mixer-Streams hat sich geaendert
    StreamMuteChanged { stream: AudioStream, muted: bool },
    /// Lautsprecher-Modus wurde vom OS gemeldet
    SpeakerphoneChanged,
}

impl fmt::Display for PlatformEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StreamMuteChanged { stream, muted } => {
                write!(f, "StreamMuteChanged({stream:?}, muted={muted})")
            }
            andere => write!(f, "{andere:?}"),
        }
    }
}

/// Empfaenger fuer Plattform-Ereignisse
///
/// Produzenten (Geraete-Listener, Simulator, Konsole) kennen nur dieses
/// Trait. Senden blockiert nie und darf von jedem Thread aus erfolgen.
pub trait EventSink: Send + Sync + 'static {
    /// Leitet ein Ereignis weiter
    fn senden(&self, event: PlatformEvent) -> crate::Result<()>;
}
