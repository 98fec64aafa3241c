//! callroute-core – Gemeinsame Typen und Fehlertypen
//!
//! Dieses Crate stellt das Routen-Datenmodell und die Plattform-Ereignisse
//! bereit, die von Routing-Engine, Observability und Daemon gemeinsam
//! genutzt werden.

pub mod error;
pub mod event;
pub mod route;
pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use error::{CallrouteError, Result};
pub use event::{AudioStream, EventSink, PlatformEvent};
pub use route::{AudioFocus, BluetoothDevice, DeviceClass, Route, RouteMask, RouteState};
pub use types::{CallId, SessionId};
