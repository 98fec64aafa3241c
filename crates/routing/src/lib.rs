//! callroute-routing – Routing-Engine fuer Anruf-Audio
//!
//! Entscheidet ueber welches Geraet (Hoerer, Kabel-Headset, Bluetooth,
//! Lautsprecher, Streaming) das Audio eines Anrufs laeuft und meldet jede
//! beobachtbare Aenderung an die Kollaborateure.
//!
//! # Module
//!
//! - [`machine`] – Zustandsautomat mit Enter/Exit-Hooks
//! - `transitions` – Uebergangstabellen je Routen-Familie
//! - [`baseline`] – Auswahl der besten Route
//! - [`publisher`] – Veroeffentlichung an Beobachter
//! - [`engine`] – Thread-sicherer Router
//! - [`adapters`] – Plattform-Ereignisse in Nachrichten uebersetzen
//! - [`sim`] – Simulierte Plattform fuer Tests und Daemon

pub mod adapters;
pub mod baseline;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod machine;
pub mod message;
pub mod publisher;
pub mod queue;
pub mod sim;
pub mod states;
pub mod stats;
mod transitions;

// Re-Exporte
pub use adapters::{translate, EventAction};
pub use collaborators::{
    AudioService, BluetoothRouteManager, CallAudioManager, CallsManager, Collaborators,
    CommunicationDevice, ConnectionService, StatusBarNotifier, TrackedCall, WiredHeadsetManager,
};
pub use config::{EarpieceControl, ExecutorMode, RouterConfig};
pub use context::RouteContext;
pub use engine::CallAudioRouter;
pub use error::{CollaboratorError, RoutingError, RoutingResult};
pub use machine::{MachineView, RouteMachine};
pub use message::{
    Command, DeferredAction, Message, MessageCode, SwitchOrigin, INCLUDE_BLUETOOTH_IN_BASELINE,
    NO_INCLUDE_BLUETOOTH_IN_BASELINE,
};
pub use publisher::{PublishedStates, StatePair};
pub use sim::{RecordingConnection, SimAction, SimulatedPlatform};
pub use states::{MachineState, RouteFamily};
pub use stats::{MachineStats, StatsSnapshot};
