//! Prometheus-kompatible Metriken fuer callroute
//!
//! Registrierte Metriken:
//! - `callroute_messages_total` – Counter: Verarbeitete Nachrichten
//! - `callroute_transitions_total` – Counter: Zustandswechsel
//! - `callroute_publications_total` – Counter: Veroeffentlichte Audio-Zustaende
//! - `callroute_ignored_commands_total` – Counter: Wirkungslose Kommandos
//! - `callroute_dropped_messages_total` – Counter: Verworfene Nachrichten
//! - `callroute_handler_failures_total` – Counter: Abgebrochene Handler
//! - `callroute_active_state` – Gauge: 1 wenn ein Anruf Audio traegt
//! - `callroute_http_requests_total` – Counter: HTTP-Anfragen (method, path, status)
//! - `callroute_http_request_duration_seconds` – Histogram: HTTP-Antwortzeit
//!
//! Die Routing-Engine zaehlt selbst mit Atomics. [`RouteMetrics::uebernehmen`]
//! spiegelt einen [`Zaehlerstand`] in die Registry.

use anyhow::Result;
use axum::{extract::State, response::IntoResponse, routing::get, Router};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Stand der Router-Zaehler zu einem Zeitpunkt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zaehlerstand {
    pub messages: u64,
    pub transitions: u64,
    pub publications: u64,
    pub ignored_commands: u64,
    pub dropped_messages: u64,
    pub handler_failures: u64,
    pub active: bool,
}

/// Alle callroute-Prometheus-Metriken
#[derive(Clone)]
pub struct RouteMetrics {
    pub registry: Arc<Registry>,

    // Router
    pub messages_total: IntCounter,
    pub transitions_total: IntCounter,
    pub publications_total: IntCounter,
    pub ignored_commands_total: IntCounter,
    pub dropped_messages_total: IntCounter,
    pub handler_failures_total: IntCounter,
    pub active_state: IntGauge,

    // HTTP
    pub http_requests_total: IntCounterVec,
    pub http_request_duration_seconds: HistogramVec,
}

fn zaehler(registry: &Registry, name: &str, hilfe: &str) -> Result<IntCounter> {
    let counter = IntCounter::with_opts(Opts::new(name, hilfe))?;
    registry.register(Box::new(counter.clone()))?;
    Ok(counter)
}

impl RouteMetrics {
    /// Erstellt und registriert alle Metriken in einer neuen Registry
    pub fn neu() -> Result<Self> {
        let registry = Registry::new();

        // --- Router-Metriken ---
        let messages_total = zaehler(
            &registry,
            "callroute_messages_total",
            "Anzahl verarbeiteter Nachrichten",
        )?;
        let transitions_total = zaehler(
            &registry,
            "callroute_transitions_total",
            "Anzahl Zustandswechsel",
        )?;
        let publications_total = zaehler(
            &registry,
            "callroute_publications_total",
            "Anzahl veroeffentlichter Audio-Zustaende",
        )?;
        let ignored_commands_total = zaehler(
            &registry,
            "callroute_ignored_commands_total",
            "Anzahl bestaetigter aber wirkungsloser Kommandos",
        )?;
        let dropped_messages_total = zaehler(
            &registry,
            "callroute_dropped_messages_total",
            "Anzahl verworfener Nachrichten",
        )?;
        let handler_failures_total = zaehler(
            &registry,
            "callroute_handler_failures_total",
            "Anzahl abgebrochener Nachrichten-Handler",
        )?;

        let active_state = IntGauge::with_opts(Opts::new(
            "callroute_active_state",
            "1 wenn der Router in einem aktiven Zustand ist",
        ))?;
        registry.register(Box::new(active_state.clone()))?;

        // --- HTTP-Metriken ---
        let http_requests_total = IntCounterVec::new(
            Opts::new("callroute_http_requests_total", "Gesamtanzahl HTTP-Anfragen"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "callroute_http_request_duration_seconds",
                "HTTP-Antwortzeit in Sekunden",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            messages_total,
            transitions_total,
            publications_total,
            ignored_commands_total,
            dropped_messages_total,
            handler_failures_total,
            active_state,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// Uebernimmt einen Zaehlerstand
    ///
    /// Counter koennen nur wachsen, es wird nur die Differenz addiert.
    pub fn uebernehmen(&self, stand: &Zaehlerstand) {
        nachziehen(&self.messages_total, stand.messages);
        nachziehen(&self.transitions_total, stand.transitions);
        nachziehen(&self.publications_total, stand.publications);
        nachziehen(&self.ignored_commands_total, stand.ignored_commands);
        nachziehen(&self.dropped_messages_total, stand.dropped_messages);
        nachziehen(&self.handler_failures_total, stand.handler_failures);
        self.active_state.set(i64::from(stand.active));
    }

    /// Exportiert alle Metriken im Prometheus-Textformat
    pub fn exportieren(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

fn nachziehen(counter: &IntCounter, ziel: u64) {
    let aktuell = counter.get();
    if ziel > aktuell {
        counter.inc_by(ziel - aktuell);
    }
}

/// Axum-Router fuer den `/metrics`-Endpunkt
pub fn metrics_router(metriken: RouteMetrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metriken)
}

async fn metrics_handler(State(metriken): State<RouteMetrics>) -> impl IntoResponse {
    match metriken.exportieren() {
        Ok(text) => (
            axum::http::StatusCode::OK,
            [(
                axum::http::header::CONTENT_TYPE,
                "text/plain; version=0.0.4",
            )],
            text,
        )
            .into_response(),
        Err(err) => {
            tracing::error!("Metriken-Export fehlgeschlagen: {err}");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
