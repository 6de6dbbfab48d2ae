//! Tracing and OpenTelemetry initialisation.
//!
//! Call [`init_tracing`] once at process startup, before the Tokio runtime
//! exists, and hold the returned guard for the process lifetime.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL; enables the OTLP/HTTP span exporter when set. |
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `HEXOS_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Set up the global `tracing` subscriber, with span export to an OTLP
/// collector when `OTEL_EXPORTER_OTLP_ENDPOINT` is set and plain console
/// output otherwise.
///
/// The returned guard flushes pending span batches on drop; keep it alive in
/// `main` for the whole process.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json_logs = std::env::var("HEXOS_LOG_FORMAT").as_deref() == Ok("json");

    let fmt_layer = if json_logs {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().compact().boxed()
    };

    let provider = build_provider(service_name);
    let otel_layer = provider.as_ref().map(|p| {
        tracing_opentelemetry::layer().with_tracer(p.tracer("hexos"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(otel_layer)
        .with(fmt_layer)
        .init();

    TracerProviderGuard(provider)
}

/// Shuts down the tracer provider (flushing spans) on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("[hexos] tracer provider shutdown error: {err}");
            }
        }
    }
}

/// `None` when no OTLP endpoint is configured or the exporter fails to
/// build; the caller then runs with console output only.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|err| eprintln!("[hexos] OTLP exporter init failed: {err}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // Simple exporter on purpose: init runs before the Tokio runtime is up,
    // and the batch exporter spawns tasks.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}
