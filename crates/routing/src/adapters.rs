//! Uebersetzung von Plattform-Ereignissen in Nachrichten
//!
//! Geraete-Listener melden [`PlatformEvent`]s. Hier wird entschieden welches
//! Kommando daraus wird und ob es hinten oder vorne eingereiht wird.
//! Mikrofon- und Lautsprecher-Broadcasts des OS ueberholen wartende
//! Nachrichten.

use callroute_core::{AudioStream, PlatformEvent};
use tracing::{debug, info, warn};

use crate::collaborators::Collaborators;
use crate::error::RoutingResult;
use crate::machine::RouteMachine;
use crate::message::{Command, Message};
use crate::queue::MessageQueue;

/// Was mit einem Ereignis geschieht
#[derive(Debug)]
pub enum EventAction {
    /// Hinten einreihen
    Einreihen(Command),
    /// Vorne einreihen
    Vorne(Command),
    /// Klingel-Stream wieder hoerbar: direkt an die Audio-Verwaltung
    RingStreamUnmuted,
    Ignorieren,
}

/// Bestimmt die Aktion fuer ein Ereignis
pub fn translate(event: &PlatformEvent, collaborators: &Collaborators) -> EventAction {
    match event {
        PlatformEvent::WiredHeadsetPlugged => EventAction::Einreihen(Command::ConnectWiredHeadset),
        PlatformEvent::WiredHeadsetUnplugged => {
            EventAction::Einreihen(Command::DisconnectWiredHeadset)
        }
        PlatformEvent::BluetoothDeviceListChanged => {
            EventAction::Einreihen(Command::BluetoothDeviceListChanged)
        }
        PlatformEvent::BluetoothActiveDevicePresent => {
            EventAction::Einreihen(Command::BluetoothActiveDevicePresent)
        }
        PlatformEvent::BluetoothActiveDeviceGone => {
            EventAction::Einreihen(Command::BluetoothActiveDeviceGone)
        }
        PlatformEvent::BluetoothAudioConnected => {
            EventAction::Einreihen(Command::BluetoothAudioConnected)
        }
        PlatformEvent::BluetoothAudioDisconnected => {
            EventAction::Einreihen(Command::BluetoothAudioDisconnected)
        }
        PlatformEvent::DockConnected => EventAction::Einreihen(Command::ConnectDock),
        PlatformEvent::DockDisconnected => EventAction::Einreihen(Command::DisconnectDock),
        PlatformEvent::StreamingForceEnabled => {
            EventAction::Einreihen(Command::StreamingForceEnabled)
        }
        PlatformEvent::StreamingForceDisabled => {
            EventAction::Einreihen(Command::StreamingForceDisabled)
        }
        PlatformEvent::MicrophoneMuteChanged => {
            if collaborators.calls.is_in_emergency_call() {
                info!("Stummschaltung waehrend Notruf von aussen geaendert, erzwinge Mikrofon an");
                EventAction::Vorne(Command::MuteOff)
            } else {
                EventAction::Vorne(Command::MuteExternallyChanged)
            }
        }
        PlatformEvent::StreamMuteChanged {
            stream: AudioStream::Ring,
            muted: false,
        } => EventAction::RingStreamUnmuted,
        PlatformEvent::StreamMuteChanged { .. } => EventAction::Ignorieren,
        PlatformEvent::SpeakerphoneChanged => {
            if collaborators.audio.is_speakerphone_on() {
                EventAction::Vorne(Command::SpeakerOn)
            } else {
                EventAction::Vorne(Command::SpeakerOff)
            }
        }
    }
}

/// Uebersetzt ein Ereignis und stellt es zu
pub fn zustellen(
    queue: &MessageQueue,
    collaborators: &Collaborators,
    event: PlatformEvent,
) -> RoutingResult<()> {
    debug!(ereignis = %event, "Plattform-Ereignis");
    match translate(&event, collaborators) {
        EventAction::Einreihen(command) => queue.push_back(Message::neu(command)),
        EventAction::Vorne(command) => queue.push_front(Message::neu(command)),
        EventAction::RingStreamUnmuted => {
            info!("Klingel-Stream wieder hoerbar");
            collaborators.call_audio.clear_silenced_calls();
            collaborators.call_audio.on_ringer_mode_change();
            Ok(())
        }
        EventAction::Ignorieren => {
            if !matches!(event, PlatformEvent::StreamMuteChanged { .. }) {
                warn!(ereignis = %event, "Ereignis ohne Wirkung");
            }
            Ok(())
        }
    }
}

impl RouteMachine {
    /// Stellt ein Plattform-Ereignis in die eigene Queue zu
    pub fn plattform_ereignis(&self, event: PlatformEvent) -> RoutingResult<()> {
        zustellen(&self.queue, &self.collaborators, event)
    }
}
