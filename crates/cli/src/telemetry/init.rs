//! Tracing subscriber and OTLP pipeline initialisation.

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace, Resource};
use opentelemetry_semantic_conventions::resource::{
    PROCESS_EXECUTABLE_NAME, SERVICE_NAME, SERVICE_VERSION,
};
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{
    layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt, EnvFilter,
};

/// Flushes exported spans when dropped. Hold it for the life of `main`.
#[must_use]
pub struct TelemetryGuard {
    otlp: bool,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.otlp {
            opentelemetry::global::shutdown_tracer_provider();
        }
    }
}

/// Initialise the global tracing subscriber for the `binary` being run.
///
/// `RUST_LOG` takes precedence over `log_level`. When `otlp_endpoint` is set,
/// spans are also exported there, tagged with `binary` as the executable name
/// under the shared `kms-encrypt-obj` service.
///
/// # Errors
///
/// Returns an error if the OTLP pipeline cannot be installed or a global
/// subscriber is already set.
pub fn init_telemetry(
    binary: &'static str,
    log_level: &str,
    otlp_endpoint: Option<&str>,
) -> Result<TelemetryGuard> {
    let export = otlp_endpoint
        .map(|endpoint| span_export(endpoint, binary))
        .transpose()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .with(export)
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(TelemetryGuard {
        otlp: otlp_endpoint.is_some(),
    })
}

/// Batch span export over OTLP/gRPC to `endpoint`.
fn span_export<S>(
    endpoint: &str,
    binary: &'static str,
) -> Result<OpenTelemetryLayer<S, trace::Tracer>>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let resource = Resource::new([
        KeyValue::new(SERVICE_NAME, "kms-encrypt-obj"),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new(PROCESS_EXECUTABLE_NAME, binary),
    ]);
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(trace::Config::default().with_resource(resource))
        .install_batch(runtime::Tokio)
        .with_context(|| format!("failed to start span export to {endpoint}"))?;

    Ok(tracing_opentelemetry::layer().with_tracer(tracer))
}
