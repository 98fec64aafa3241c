//! Nachrichten des Routing-Automaten
//!
//! Jede Eingabe des Automaten ist ein [`Command`]. Von aussen kommen
//! Kommandos entweder typisiert oder als numerischer [`MessageCode`] mit
//! Argument (`send_command(code, arg)`). In der Queue liegen sie als
//! [`Message`] mit eigener Log-Session.

use callroute_core::{AudioFocus, SessionId};
use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::{RoutingError, RoutingResult};

/// Argument fuer Baseline-Wechsel: Bluetooth nicht beruecksichtigen
pub const NO_INCLUDE_BLUETOOTH_IN_BASELINE: i32 = 0;
/// Argument fuer Baseline-Wechsel: Bluetooth beruecksichtigen
pub const INCLUDE_BLUETOOTH_IN_BASELINE: i32 = 1;

// ---------------------------------------------------------------------------
// MessageCode
// ---------------------------------------------------------------------------

/// Numerische Nachrichten-Codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum MessageCode {
    ConnectWiredHeadset = 1,
    DisconnectWiredHeadset = 2,
    ConnectDock = 5,
    DisconnectDock = 6,
    BluetoothDeviceListChanged = 7,
    BtActiveDevicePresent = 8,
    BtActiveDeviceGone = 9,

    SwitchEarpiece = 1001,
    SwitchBluetooth = 1002,
    SwitchHeadset = 1003,
    SwitchSpeaker = 1004,
    SwitchBaselineRoute = 1005,
    SpeakerOn = 1006,
    SpeakerOff = 1007,
    StreamingForceEnabled = 1008,
    StreamingForceDisabled = 1009,

    UserSwitchEarpiece = 1101,
    UserSwitchBluetooth = 1102,
    UserSwitchHeadset = 1103,
    UserSwitchSpeaker = 1104,
    UserSwitchBaselineRoute = 1105,

    UpdateSystemAudioRoute = 1201,
    ResendCurrentState = 1202,

    BtAudioDisconnected = 1301,
    BtAudioConnected = 1302,

    MuteOn = 3001,
    MuteOff = 3002,
    ToggleMute = 3003,
    MuteExternallyChanged = 3004,

    SwitchFocus = 4001,

    RunDeferred = 9001,
}

impl MessageCode {
    const ALLE: [MessageCode; 31] = [
        MessageCode::ConnectWiredHeadset,
        MessageCode::DisconnectWiredHeadset,
        MessageCode::ConnectDock,
        MessageCode::DisconnectDock,
        MessageCode::BluetoothDeviceListChanged,
        MessageCode::BtActiveDevicePresent,
        MessageCode::BtActiveDeviceGone,
        MessageCode::SwitchEarpiece,
        MessageCode::SwitchBluetooth,
        MessageCode::SwitchHeadset,
        MessageCode::SwitchSpeaker,
        MessageCode::SwitchBaselineRoute,
        MessageCode::SpeakerOn,
        MessageCode::SpeakerOff,
        MessageCode::StreamingForceEnabled,
        MessageCode::StreamingForceDisabled,
        MessageCode::UserSwitchEarpiece,
        MessageCode::UserSwitchBluetooth,
        MessageCode::UserSwitchHeadset,
        MessageCode::UserSwitchSpeaker,
        MessageCode::UserSwitchBaselineRoute,
        MessageCode::UpdateSystemAudioRoute,
        MessageCode::ResendCurrentState,
        MessageCode::BtAudioDisconnected,
        MessageCode::BtAudioConnected,
        MessageCode::MuteOn,
        MessageCode::MuteOff,
        MessageCode::ToggleMute,
        MessageCode::MuteExternallyChanged,
        MessageCode::SwitchFocus,
        MessageCode::RunDeferred,
    ];

    /// Dekodiert einen numerischen Code
    pub fn from_i32(code: i32) -> Option<MessageCode> {
        Self::ALLE.into_iter().find(|c| *c as i32 == code)
    }

    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Name wie in Logs und Dumps
    pub fn name(self) -> &'static str {
        match self {
            MessageCode::ConnectWiredHeadset => "CONNECT_WIRED_HEADSET",
            MessageCode::DisconnectWiredHeadset => "DISCONNECT_WIRED_HEADSET",
            MessageCode::ConnectDock => "CONNECT_DOCK",
            MessageCode::DisconnectDock => "DISCONNECT_DOCK",
            MessageCode::BluetoothDeviceListChanged => "BLUETOOTH_DEVICE_LIST_CHANGED",
            MessageCode::BtActiveDevicePresent => "BT_ACTIVE_DEVICE_PRESENT",
            MessageCode::BtActiveDeviceGone => "BT_ACTIVE_DEVICE_GONE",
            MessageCode::SwitchEarpiece => "SWITCH_EARPIECE",
            MessageCode::SwitchBluetooth => "SWITCH_BLUETOOTH",
            MessageCode::SwitchHeadset => "SWITCH_HEADSET",
            MessageCode::SwitchSpeaker => "SWITCH_SPEAKER",
            MessageCode::SwitchBaselineRoute => "SWITCH_BASELINE_ROUTE",
            MessageCode::SpeakerOn => "SPEAKER_ON",
            MessageCode::SpeakerOff => "SPEAKER_OFF",
            MessageCode::StreamingForceEnabled => "STREAMING_FORCE_ENABLED",
            MessageCode::StreamingForceDisabled => "STREAMING_FORCE_DISABLED",
            MessageCode::UserSwitchEarpiece => "USER_SWITCH_EARPIECE",
            MessageCode::UserSwitchBluetooth => "USER_SWITCH_BLUETOOTH",
            MessageCode::UserSwitchHeadset => "USER_SWITCH_HEADSET",
            MessageCode::UserSwitchSpeaker => "USER_SWITCH_SPEAKER",
            MessageCode::UserSwitchBaselineRoute => "USER_SWITCH_BASELINE_ROUTE",
            MessageCode::UpdateSystemAudioRoute => "UPDATE_SYSTEM_AUDIO_ROUTE",
            MessageCode::ResendCurrentState => "RESEND_CURRENT_STATE",
            MessageCode::BtAudioDisconnected => "BT_AUDIO_DISCONNECTED",
            MessageCode::BtAudioConnected => "BT_AUDIO_CONNECTED",
            MessageCode::MuteOn => "MUTE_ON",
            MessageCode::MuteOff => "MUTE_OFF",
            MessageCode::ToggleMute => "TOGGLE_MUTE",
            MessageCode::MuteExternallyChanged => "MUTE_EXTERNALLY_CHANGED",
            MessageCode::SwitchFocus => "SWITCH_FOCUS",
            MessageCode::RunDeferred => "RUN_RUNNABLE",
        }
    }
}

impl fmt::Display for MessageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Herkunft eines Routenwechsels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchOrigin {
    /// Vom Automaten selbst oder vom System abgeleitet
    Derived,
    /// Ausdruecklicher Wunsch des Benutzers
    User,
}

impl SwitchOrigin {
    pub fn ist_benutzer(self) -> bool {
        self == SwitchOrigin::User
    }
}

/// Aktion die auf dem Automaten-Thread ausgefuehrt wird
pub struct DeferredAction(Box<dyn FnOnce() + Send + 'static>);

impl DeferredAction {
    pub fn neu(aktion: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(aktion))
    }

    pub fn ausfuehren(self) {
        (self.0)()
    }
}

impl fmt::Debug for DeferredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DeferredAction(..)")
    }
}

/// Alle Eingaben des Routing-Automaten
#[derive(Debug)]
pub enum Command {
    // --- Hardware-Fakten ---
    ConnectWiredHeadset,
    DisconnectWiredHeadset,
    ConnectDock,
    DisconnectDock,
    BluetoothDeviceListChanged,
    BluetoothActiveDevicePresent,
    BluetoothActiveDeviceGone,
    BluetoothAudioConnected,
    BluetoothAudioDisconnected,
    StreamingForceEnabled,
    StreamingForceDisabled,
    SpeakerOn,
    SpeakerOff,

    // --- Routenwechsel ---
    SwitchEarpiece(SwitchOrigin),
    SwitchHeadset(SwitchOrigin),
    SwitchSpeaker(SwitchOrigin),
    SwitchBluetooth {
        origin: SwitchOrigin,
        address: Option<String>,
    },
    SwitchBaselineRoute {
        origin: SwitchOrigin,
        include_bluetooth: bool,
    },

    // --- Fokus ---
    SwitchFocus(AudioFocus),

    // --- Zustandsunabhaengig ---
    MuteOn,
    MuteOff,
    ToggleMute,
    MuteExternallyChanged,
    UpdateSystemAudioRoute,
    ResendCurrentState,
    RunDeferred(DeferredAction),
}

impl Command {
    /// Numerischer Code dieses Kommandos
    pub fn code(&self) -> MessageCode {
        use SwitchOrigin::{Derived, User};
        match self {
            Command::ConnectWiredHeadset => MessageCode::ConnectWiredHeadset,
            Command::DisconnectWiredHeadset => MessageCode::DisconnectWiredHeadset,
            Command::ConnectDock => MessageCode::ConnectDock,
            Command::DisconnectDock => MessageCode::DisconnectDock,
            Command::BluetoothDeviceListChanged => MessageCode::BluetoothDeviceListChanged,
            Command::BluetoothActiveDevicePresent => MessageCode::BtActiveDevicePresent,
            Command::BluetoothActiveDeviceGone => MessageCode::BtActiveDeviceGone,
            Command::BluetoothAudioConnected => MessageCode::BtAudioConnected,
            Command::BluetoothAudioDisconnected => MessageCode::BtAudioDisconnected,
            Command::StreamingForceEnabled => MessageCode::StreamingForceEnabled,
            Command::StreamingForceDisabled => MessageCode::StreamingForceDisabled,
            Command::SpeakerOn => MessageCode::SpeakerOn,
            Command::SpeakerOff => MessageCode::SpeakerOff,
            Command::SwitchEarpiece(Derived) => MessageCode::SwitchEarpiece,
            Command::SwitchEarpiece(User) => MessageCode::UserSwitchEarpiece,
            Command::SwitchHeadset(Derived) => MessageCode::SwitchHeadset,
            Command::SwitchHeadset(User) => MessageCode::UserSwitchHeadset,
            Command::SwitchSpeaker(Derived) => MessageCode::SwitchSpeaker,
            Command::SwitchSpeaker(User) => MessageCode::UserSwitchSpeaker,
            Command::SwitchBluetooth { origin: Derived, .. } => MessageCode::SwitchBluetooth,
            Command::SwitchBluetooth { origin: User, .. } => MessageCode::UserSwitchBluetooth,
            Command::SwitchBaselineRoute { origin: Derived, .. } => {
                MessageCode::SwitchBaselineRoute
            }
            Command::SwitchBaselineRoute { origin: User, .. } => {
                MessageCode::UserSwitchBaselineRoute
            }
            Command::SwitchFocus(_) => MessageCode::SwitchFocus,
            Command::MuteOn => MessageCode::MuteOn,
            Command::MuteOff => MessageCode::MuteOff,
            Command::ToggleMute => MessageCode::ToggleMute,
            Command::MuteExternallyChanged => MessageCode::MuteExternallyChanged,
            Command::UpdateSystemAudioRoute => MessageCode::UpdateSystemAudioRoute,
            Command::ResendCurrentState => MessageCode::ResendCurrentState,
            Command::RunDeferred(_) => MessageCode::RunDeferred,
        }
    }

    /// Baut ein Kommando aus Code, Argument und optionalen Daten
    ///
    /// `arg` ist der Fokus-Code bei `SWITCH_FOCUS` und das
    /// Bluetooth-Flag bei Baseline-Wechseln. `data` ist die optionale
    /// Bluetooth-Adresse bei Bluetooth-Wechseln.
    pub fn from_code(code: i32, arg: i32, data: Option<String>) -> RoutingResult<Command> {
        use SwitchOrigin::{Derived, User};
        let message_code = MessageCode::from_i32(code).ok_or(RoutingError::UnbekannterCode(code))?;

        let command = match message_code {
            MessageCode::ConnectWiredHeadset => Command::ConnectWiredHeadset,
            MessageCode::DisconnectWiredHeadset => Command::DisconnectWiredHeadset,
            MessageCode::ConnectDock => Command::ConnectDock,
            MessageCode::DisconnectDock => Command::DisconnectDock,
            MessageCode::BluetoothDeviceListChanged => Command::BluetoothDeviceListChanged,
            MessageCode::BtActiveDevicePresent => Command::BluetoothActiveDevicePresent,
            MessageCode::BtActiveDeviceGone => Command::BluetoothActiveDeviceGone,
            MessageCode::BtAudioConnected => Command::BluetoothAudioConnected,
            MessageCode::BtAudioDisconnected => Command::BluetoothAudioDisconnected,
            MessageCode::StreamingForceEnabled => Command::StreamingForceEnabled,
            MessageCode::StreamingForceDisabled => Command::StreamingForceDisabled,
            MessageCode::SpeakerOn => Command::SpeakerOn,
            MessageCode::SpeakerOff => Command::SpeakerOff,
            MessageCode::SwitchEarpiece => Command::SwitchEarpiece(Derived),
            MessageCode::UserSwitchEarpiece => Command::SwitchEarpiece(User),
            MessageCode::SwitchHeadset => Command::SwitchHeadset(Derived),
            MessageCode::UserSwitchHeadset => Command::SwitchHeadset(User),
            MessageCode::SwitchSpeaker => Command::SwitchSpeaker(Derived),
            MessageCode::UserSwitchSpeaker => Command::SwitchSpeaker(User),
            MessageCode::SwitchBluetooth => Command::SwitchBluetooth {
                origin: Derived,
                address: data,
            },
            MessageCode::UserSwitchBluetooth => Command::SwitchBluetooth {
                origin: User,
                address: data,
            },
            MessageCode::SwitchBaselineRoute => Command::SwitchBaselineRoute {
                origin: Derived,
                include_bluetooth: arg == INCLUDE_BLUETOOTH_IN_BASELINE,
            },
            MessageCode::UserSwitchBaselineRoute => Command::SwitchBaselineRoute {
                origin: User,
                include_bluetooth: arg == INCLUDE_BLUETOOTH_IN_BASELINE,
            },
            MessageCode::SwitchFocus => {
                let focus = AudioFocus::from_code(arg).ok_or_else(|| {
                    RoutingError::UngueltigesArgument {
                        code: message_code.name().to_string(),
                        grund: format!("Fokus-Code {arg} unbekannt"),
                    }
                })?;
                Command::SwitchFocus(focus)
            }
            MessageCode::MuteOn => Command::MuteOn,
            MessageCode::MuteOff => Command::MuteOff,
            MessageCode::ToggleMute => Command::ToggleMute,
            MessageCode::MuteExternallyChanged => Command::MuteExternallyChanged,
            MessageCode::UpdateSystemAudioRoute => Command::UpdateSystemAudioRoute,
            MessageCode::ResendCurrentState => Command::ResendCurrentState,
            MessageCode::RunDeferred => {
                return Err(RoutingError::UngueltigesArgument {
                    code: message_code.name().to_string(),
                    grund: "Aktion kann nicht per Code uebergeben werden".to_string(),
                })
            }
        };
        Ok(command)
    }

    /// Numerisches Argument wie bei `send_command(code, arg)`
    pub fn arg(&self) -> i32 {
        match self {
            Command::SwitchFocus(focus) => focus.code(),
            Command::SwitchBaselineRoute {
                include_bluetooth: true,
                ..
            } => INCLUDE_BLUETOOTH_IN_BASELINE,
            _ => 0,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SwitchFocus(focus) => write!(f, "{}({})", self.code(), focus),
            Command::SwitchBaselineRoute {
                include_bluetooth, ..
            } => write!(f, "{}(bt={})", self.code(), include_bluetooth),
            Command::SwitchBluetooth {
                address: Some(address),
                ..
            } => write!(f, "{}({})", self.code(), address),
            _ => write!(f, "{}", self.code()),
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Eintrag in der Nachrichten-Queue
#[derive(Debug)]
pub struct Message {
    pub command: Command,
    /// Log-Session fuer alle Eintraege dieser Nachricht
    pub session: SessionId,
    /// Zeitpunkt des Einreihens
    pub eingereiht: DateTime<Utc>,
    /// Vom Automaten selbst erzeugt (vorne eingereiht)
    pub intern: bool,
}

impl Message {
    /// Nachricht von aussen
    pub fn neu(command: Command) -> Self {
        Self {
            command,
            session: SessionId::new(),
            eingereiht: Utc::now(),
            intern: false,
        }
    }

    /// Nachricht des Automaten an sich selbst
    pub fn intern(command: Command) -> Self {
        Self {
            command,
            session: SessionId::new(),
            eingereiht: Utc::now(),
            intern: true,
        }
    }

    /// Einzeilige Beschreibung fuer Dumps
    pub fn beschreibung(&self) -> String {
        format!(
            "{} {} arg={} [{}]{}",
            self.eingereiht.format("%H:%M:%S%.3f"),
            self.command,
            self.command.arg(),
            self.session.kurz(),
            if self.intern { " intern" } else { "" }
        )
    }
}
